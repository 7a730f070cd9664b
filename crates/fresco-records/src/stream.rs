//! Ledger stream naming and governance periods.
//!
//! Each canvas's proposals live on their own ledger streams, named after
//! the canvas record's content hash. Canvas records themselves live on a
//! per-period stream so a community can roll to a fresh canvas each year
//! without touching prior history.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Stream prefix for canvas records; the governance period is appended.
pub const CANVAS_STREAM_PREFIX: &str = "Fresco-Canvas-";

/// Stream prefix for vote records; the canvas id is appended.
pub const VOTE_STREAM_PREFIX: &str = "Fresco-Vote-";

/// Stream prefix for purchase records; the canvas id is appended.
pub const PURCHASE_STREAM_PREFIX: &str = "Fresco-Purchase-";

/// A governance period: the lifetime of one canvas, one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period(pub i32);

impl Period {
    /// The period containing the current UTC instant.
    pub fn current() -> Self {
        Self(Utc::now().year())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one canvas: the hex form of its ledger record's content hash.
///
/// Stable across peers (content addressing) and usable directly in stream
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasId(String);

impl CanvasId {
    /// Wrap an already-hex-encoded record hash.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanvasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the canvas stream for a governance period.
pub fn canvas_stream(period: Period) -> String {
    format!("{CANVAS_STREAM_PREFIX}{period}")
}

/// Name of the vote stream for a canvas.
pub fn vote_stream(id: &CanvasId) -> String {
    format!("{VOTE_STREAM_PREFIX}{id}")
}

/// Name of the purchase stream for a canvas.
pub fn purchase_stream(id: &CanvasId) -> String {
    format!("{PURCHASE_STREAM_PREFIX}{id}")
}
