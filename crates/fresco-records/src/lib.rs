//! Fresco Domain Records
//!
//! Immutable value types shared by every layer of the Fresco canvas:
//! colours, cell locations, canvases and their governance modes, and the
//! two proposal records (votes and purchases) that communities append to
//! the ledger.
//!
//! # Value Semantics
//!
//! Equality on every record is structural. Two colours with identical
//! channel values are the *same* colour for tallying purposes, and two
//! locations naming the same cell are the same cell. Resolution rules rely
//! on this: tallies are keyed by value, never by identity.
//!
//! # Wire Format
//!
//! Records cross the ledger boundary as bincode payloads (the [`Payload`]
//! trait). Entries keep their original payload bytes end to end, so data a
//! newer producer appends after the known fields survives replication
//! untouched - nothing in Fresco re-encodes a decoded record.

mod canvas;
mod codec;
mod colour;
mod location;
mod purchase;
mod stream;
mod vote;

pub use canvas::{Canvas, Mode};
pub use codec::{CodecError, Payload};
pub use colour::Colour;
pub use location::Location;
pub use purchase::Purchase;
pub use stream::{
    canvas_stream, purchase_stream, vote_stream, CanvasId, Period, CANVAS_STREAM_PREFIX,
    PURCHASE_STREAM_PREFIX, VOTE_STREAM_PREFIX,
};
pub use vote::Vote;
