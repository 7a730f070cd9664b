//! Binary codec for ledger payloads.
//!
//! Every record that crosses the ledger boundary implements [`Payload`].
//! The wire format is bincode. Decoding never trusts its input: a malformed
//! payload surfaces as [`CodecError::Decode`] and the caller decides how
//! far the failure propagates (absorption treats it as a partial-progress
//! stop, not corruption).

use crate::{Canvas, Purchase, Vote};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from encoding or decoding a record payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A record failed to serialize.
    #[error("encode failed: {0}")]
    Encode(#[source] bincode::Error),

    /// A payload could not be decoded as the expected record type.
    #[error("decode failed: {0}")]
    Decode(#[source] bincode::Error),
}

/// A domain record with a stable binary form.
pub trait Payload: Sized {
    /// Serialize to payload bytes.
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    /// Deserialize from payload bytes.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;
}

fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(CodecError::Encode)
}

fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}

impl Payload for Vote {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_payload(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_payload(bytes)
    }
}

impl Payload for Purchase {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_payload(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_payload(bytes)
    }
}

impl Payload for Canvas {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_payload(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_payload(bytes)
    }
}
