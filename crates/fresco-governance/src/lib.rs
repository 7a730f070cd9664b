//! Fresco Canvas Governance
//!
//! The concurrent, locally-cached projection of a canvas's ledger streams,
//! and the state machine that keeps it converging.
//!
//! # The Loop
//!
//! ```text
//! ledger head moves ──► trigger ──► refresh (single-flight)
//!                                     │  pull from peers
//!                                     │  absorb new entries (dedup, early stop)
//!                                     │  reorder by timestamp
//!                                     ├──► observer callback
//!                                     └──► mine pending writes, push to peers
//! ```
//!
//! A local `write` only appends a signed proposal to the ledger's pending
//! set; the next refresh/mine cycle surfaces it. Resolution is pure: at any
//! moment a cell's winning colour is re-derived from the projection under
//! the instance's lock, never from separate tally state.
//!
//! # Governance Modes
//!
//! The mode set is closed. Free-for-all (plurality vote) is implemented;
//! opening any other mode fails fast with an error naming it, so callers
//! learn about unimplemented governance at construction, not mid-period.

mod error;
mod model;
mod projection;
mod registry;
mod resolve;

pub use error::{GovernanceError, Result};
pub use model::{FreeForAllModel, Model, UpdateObserver, VoteModel};
pub use projection::Projection;
pub use registry::{find_canvas, publish_canvas, ModelRegistry};
pub use resolve::{purchases_by, EscalatingBidPolicy, PluralityPolicy};
