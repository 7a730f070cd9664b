//! Free-for-all colour proposals.

use crate::{Colour, Location};
use serde::{Deserialize, Serialize};

/// A free-for-all colour proposal for one cell.
///
/// Carries no price. One identity may submit unlimited votes; all are
/// retained and tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Proposed colour
    pub colour: Colour,
    /// Cell the proposal targets
    pub location: Location,
}

impl Vote {
    /// Create a vote for a colour at a location.
    pub const fn new(location: Location, colour: Colour) -> Self {
        Self { colour, location }
    }
}
