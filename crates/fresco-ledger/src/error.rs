//! Error types for fresco-ledger.

use thiserror::Error;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record's signature did not verify against its embedded key.
    #[error("bad record signature from '{creator}'")]
    BadSignature {
        /// Alias the record claims as its author
        creator: String,
    },

    /// A record payload could not be decoded as the expected type.
    #[error("malformed record payload: {0}")]
    Payload(#[from] fresco_records::CodecError),

    /// An adopted chain failed validation.
    #[error("invalid chain for stream '{stream}': {reason}")]
    InvalidChain {
        /// Stream whose chain was rejected
        stream: String,
        /// Why validation failed
        reason: String,
    },

    /// Proof-of-work could not be completed.
    #[error("mining failed: {0}")]
    Mining(String),
}
