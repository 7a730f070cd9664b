//! Priced colour bids.

use crate::{Colour, Location};
use serde::{Deserialize, Serialize};

/// A priced bid to set one cell's colour.
///
/// `price` drives the auction resolution rule; `tax` is settlement
/// metadata carried alongside the bid and never consulted by resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Proposed colour
    pub colour: Colour,
    /// Cell the bid targets
    pub location: Location,
    /// Offered price
    pub price: u32,
    /// Settlement tax, informational only
    pub tax: u32,
}

impl Purchase {
    /// Create a bid for a colour at a location.
    pub const fn new(location: Location, colour: Colour, price: u32, tax: u32) -> Self {
        Self { colour, location, price, tax }
    }
}
