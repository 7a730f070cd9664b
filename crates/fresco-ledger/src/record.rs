//! Signed records and the identities that author them.

use crate::error::{LedgerError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch - the ledger's logical timestamp.
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A signed envelope around one record payload.
///
/// Payloads are public; encryption is none by design for canvas records.
/// The signature is Ed25519 over the blake3 hash of the payload, and the
/// author's verifying key travels with the record so any peer can check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRecord {
    /// Nanoseconds since the Unix epoch; the sole ordering key
    pub timestamp: u64,
    /// Author's alias
    pub creator: String,
    /// Author's Ed25519 verifying key
    pub public_key: [u8; 32],
    /// The serialized domain record
    pub payload: Vec<u8>,
    /// Ed25519 signature over blake3(payload)
    pub signature: Vec<u8>,
}

impl SignedRecord {
    /// Verify the signature against the embedded verifying key.
    pub fn verify(&self) -> Result<()> {
        let bad = || LedgerError::BadSignature { creator: self.creator.clone() };
        let key = VerifyingKey::from_bytes(&self.public_key).map_err(|_| bad())?;
        let signature = Signature::from_slice(&self.signature).map_err(|_| bad())?;
        key.verify(blake3::hash(&self.payload).as_bytes(), &signature)
            .map_err(|_| bad())
    }
}

/// An alias plus the Ed25519 signing key that backs it.
///
/// Key distribution and storage are outside this crate; callers hand the
/// ledger an identity and it produces signed records.
pub struct Identity {
    alias: String,
    key: SigningKey,
}

impl Identity {
    /// Generate a fresh identity with a random signing key.
    pub fn generate(alias: impl Into<String>) -> Self {
        let key = SigningKey::generate(&mut rand::thread_rng());
        Self { alias: alias.into(), key }
    }

    /// Wrap an existing signing key.
    pub fn from_signing_key(alias: impl Into<String>, key: SigningKey) -> Self {
        Self { alias: alias.into(), key }
    }

    /// The alias this identity signs as.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Sign a payload, stamping it with the current time.
    pub fn sign(&self, payload: Vec<u8>) -> SignedRecord {
        self.sign_at(timestamp_now(), payload)
    }

    /// Sign a payload with an explicit timestamp.
    pub fn sign_at(&self, timestamp: u64, payload: Vec<u8>) -> SignedRecord {
        let signature = self.key.sign(blake3::hash(&payload).as_bytes());
        SignedRecord {
            timestamp,
            creator: self.alias.clone(),
            public_key: self.key.verifying_key().to_bytes(),
            payload,
            signature: signature.to_bytes().to_vec(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").field("alias", &self.alias).finish_non_exhaustive()
    }
}
