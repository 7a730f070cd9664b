//! The projection store: absorbed ledger entries, deduplicated and ordered.

use fresco_ledger::{Entry, RecordHash, Visit};
use fresco_records::{CodecError, Payload};
use std::collections::HashMap;
use tracing::trace;

struct Absorbed<P> {
    entry: Entry,
    payload: P,
}

/// Per-governance-instance projection of one ledger stream.
///
/// Owns the map from content hash to absorbed entry plus a deterministic
/// traversal order: ascending by entry timestamp, ties broken by insertion
/// order. Absorption is idempotent and stops early once it reaches an
/// entry it has already seen - the adapter walks the chain newest-first,
/// and the chain is append-only with immutable entries, so a known entry
/// implies everything older is known too.
pub struct Projection<P> {
    entries: HashMap<RecordHash, Absorbed<P>>,
    order: Vec<RecordHash>,
}

impl<P> Default for Projection<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Projection<P> {
    /// Create an empty projection.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Number of absorbed entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been absorbed yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether an entry has been absorbed.
    pub fn contains(&self, hash: RecordHash) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Re-sort the visible ordering: ascending timestamp, stable on ties.
    ///
    /// Call once after an absorption pass; membership is unchanged.
    pub fn reorder(&mut self) {
        let entries = &self.entries;
        self.order.sort_by_key(|hash| entries[hash].entry.timestamp());
    }

    /// Visit `(timestamp, entry, payload)` in visible order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Entry, &P)> {
        self.order.iter().map(move |hash| {
            let absorbed = &self.entries[hash];
            (absorbed.entry.timestamp(), &absorbed.entry, &absorbed.payload)
        })
    }

    /// Payloads in visible order.
    pub fn payloads(&self) -> impl Iterator<Item = &P> {
        self.iter().map(|(_, _, payload)| payload)
    }
}

impl<P: Payload> Projection<P> {
    /// Absorb one entry delivered by the adapter's newest-first walk.
    ///
    /// Returns [`Visit::Stop`] when the entry is already present - the
    /// signal to end the pass. A payload that fails to decode aborts the
    /// pass with an error; entries absorbed earlier in the pass stay
    /// absorbed (partial progress, the store remains consistent).
    pub fn absorb(&mut self, entry: &Entry) -> Result<Visit, CodecError> {
        let hash = entry.hash();
        if self.entries.contains_key(&hash) {
            trace!(entry = %hash, "already absorbed, stopping pass");
            return Ok(Visit::Stop);
        }
        let payload = P::decode(entry.payload())?;
        trace!(entry = %hash, timestamp = entry.timestamp(), "absorbed entry");
        self.entries.insert(hash, Absorbed { entry: entry.clone(), payload });
        self.order.push(hash);
        Ok(Visit::Continue)
    }
}
