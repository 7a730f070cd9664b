//! Ledger entries and their content-hash identity.

use crate::record::SignedRecord;

/// A 32-byte blake3 content hash identifying one record.
///
/// The hash covers every field of the signed record through a
/// length-prefixed canonical form, so two records differ in identity
/// whenever they differ in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHash(pub [u8; 32]);

impl RecordHash {
    /// Content hash of a signed record.
    pub fn of(record: &SignedRecord) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&record.timestamp.to_be_bytes());
        hasher.update(&(record.creator.len() as u64).to_be_bytes());
        hasher.update(record.creator.as_bytes());
        hasher.update(&record.public_key);
        hasher.update(&(record.payload.len() as u64).to_be_bytes());
        hasher.update(&record.payload);
        hasher.update(&record.signature);
        Self(*hasher.finalize().as_bytes())
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex form, e.g. for use in stream names.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for RecordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 hex chars
        write!(f, "{}...", &self.to_hex()[..8])
    }
}

/// One signed record plus its content hash, as delivered by a ledger.
///
/// The content hash is the entry's unique identity key; the record's
/// timestamp is its sole ordering key. The original payload bytes ride
/// along untouched so unknown fields survive replication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    hash: RecordHash,
    record: SignedRecord,
}

impl Entry {
    /// Wrap a record, computing its content hash.
    pub fn new(record: SignedRecord) -> Self {
        let hash = RecordHash::of(&record);
        Self { hash, record }
    }

    /// The entry's identity key.
    pub const fn hash(&self) -> RecordHash {
        self.hash
    }

    /// The entry's ordering key.
    pub const fn timestamp(&self) -> u64 {
        self.record.timestamp
    }

    /// Alias of the record's author.
    pub fn creator(&self) -> &str {
        &self.record.creator
    }

    /// The serialized domain record.
    pub fn payload(&self) -> &[u8] {
        &self.record.payload
    }

    /// The full signed record.
    pub const fn record(&self) -> &SignedRecord {
        &self.record
    }
}
