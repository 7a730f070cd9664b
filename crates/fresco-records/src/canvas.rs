//! Canvases and their governance modes.

use crate::Location;
use serde::{Deserialize, Serialize};

/// How competing colour proposals for one cell resolve into a winner.
///
/// The set is closed: every mode the system will ever name is represented
/// here, whether or not a governance model exists for it yet. Opening a
/// model for an unimplemented mode fails fast with an error naming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Unrecognized or unset mode. Never constructible into a model.
    Unknown,
    /// Plurality vote: the colour with the strictly highest vote count wins.
    FreeForAll,
    /// One vote per identity per cell. Not yet implemented.
    Democracy,
    /// Vote weight scales with stake. Not yet implemented.
    RadicalDemocracy,
    /// Highest bid owns the cell. Not yet implemented.
    Market,
    /// Bid weight scales quadratically. Not yet implemented.
    RadicalMarket,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::FreeForAll => "free-for-all",
            Self::Democracy => "democracy",
            Self::RadicalDemocracy => "radical-democracy",
            Self::Market => "market",
            Self::RadicalMarket => "radical-market",
        };
        write!(f, "{name}")
    }
}

/// A shared canvas for one governance period.
///
/// Immutable once created: a new canvas record starts a new governance
/// period rather than mutating a prior one. The `mode` selects which
/// resolution rule and write behavior govern the canvas for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// Human-readable canvas name
    pub name: String,
    /// Extent of the `x` axis
    pub width: u32,
    /// Extent of the `y` axis
    pub height: u32,
    /// Extent of the `z` axis
    pub depth: u32,
    /// Governance mode for this canvas's period
    pub mode: Mode,
}

impl Canvas {
    /// Create a canvas description.
    pub fn new(name: impl Into<String>, width: u32, height: u32, depth: u32, mode: Mode) -> Self {
        Self { name: name.into(), width, height, depth, mode }
    }

    /// Whether a location falls inside this canvas's spatial extent.
    ///
    /// `x`/`y`/`z` are bounded by width/height/depth; the fourth axis `w`
    /// carries no declared extent and is accepted unconditionally.
    pub fn contains(&self, location: &Location) -> bool {
        location.x < self.width && location.y < self.height && location.z < self.depth
    }
}
