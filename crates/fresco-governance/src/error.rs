//! Error types for fresco-governance.

use fresco_ledger::LedgerError;
use fresco_records::{CodecError, Mode};
use thiserror::Error;

/// Result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Errors that can occur in governance operations.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// No governance model exists for the canvas's mode.
    ///
    /// Fatal at construction: no projection store is created.
    #[error("unsupported canvas mode: {mode}")]
    UnsupportedMode {
        /// The unrecognized or unimplemented mode
        mode: Mode,
    },

    /// A record failed to encode or decode.
    #[error("record codec failure: {0}")]
    Codec(#[from] CodecError),

    /// The ledger adapter reported a failure.
    #[error("ledger failure: {0}")]
    Ledger(#[from] LedgerError),
}
