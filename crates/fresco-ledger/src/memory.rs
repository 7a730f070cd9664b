//! In-memory reference ledger.

use crate::block::{Block, BlockHash, MiningListener};
use crate::entry::{Entry, RecordHash};
use crate::error::{LedgerError, Result};
use crate::hub::MemoryHub;
use crate::ledger::{Ledger, TriggerId, UpdateTrigger, Visit};
use crate::record::{timestamp_now, SignedRecord};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct StreamState {
    head: Option<BlockHash>,
    length: u64,
    blocks: HashMap<BlockHash, Block>,
    pending: Vec<Entry>,
}

/// A [`Ledger`] kept entirely in process memory.
///
/// Each stream holds a chain of mined blocks, a pending set of unmined
/// entries, and a trigger table. Update triggers fire outside the internal
/// lock whenever a stream's head changes (mining or chain adoption).
/// Replication goes through an optional [`MemoryHub`]; without one,
/// pull/push are no-ops (offline mode).
pub struct MemoryLedger {
    miner: String,
    min_difficulty: u32,
    hub: Option<Arc<MemoryHub>>,
    streams: RwLock<HashMap<String, StreamState>>,
    triggers: RwLock<HashMap<String, Vec<(TriggerId, UpdateTrigger)>>>,
    next_trigger: AtomicU64,
}

impl MemoryLedger {
    /// Create an offline ledger mining under the given alias.
    pub fn new(miner: impl Into<String>) -> Self {
        Self {
            miner: miner.into(),
            min_difficulty: 0,
            hub: None,
            streams: RwLock::new(HashMap::new()),
            triggers: RwLock::new(HashMap::new()),
            next_trigger: AtomicU64::new(0),
        }
    }

    /// Attach a replication hub.
    #[must_use]
    pub fn with_hub(mut self, hub: Arc<MemoryHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Require adopted chains to meet a proof-of-work threshold.
    #[must_use]
    pub fn with_min_difficulty(mut self, difficulty: u32) -> Self {
        self.min_difficulty = difficulty;
        self
    }

    /// Number of pending (unmined) entries on a stream.
    pub fn pending_len(&self, stream: &str) -> usize {
        self.streams.read().get(stream).map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Chain length of a stream.
    pub fn chain_length(&self, stream: &str) -> u64 {
        self.streams.read().get(stream).map(|s| s.length).unwrap_or(0)
    }

    fn fire_triggers(&self, stream: &str) {
        let callbacks: Vec<UpdateTrigger> = self
            .triggers
            .read()
            .get(stream)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }

    /// Walk a candidate chain from its head, checking linkage, length, and
    /// proof-of-work. Returns the set of entry hashes the chain contains.
    fn validate_chain(
        &self,
        stream: &str,
        head: BlockHash,
        length: u64,
        blocks: &HashMap<BlockHash, Block>,
    ) -> Result<HashSet<RecordHash>> {
        let invalid = |reason: String| LedgerError::InvalidChain {
            stream: stream.to_string(),
            reason,
        };
        let mut mined = HashSet::new();
        let mut counted = 0u64;
        let mut cursor = Some(head);
        while let Some(hash) = cursor {
            let block = blocks
                .get(&hash)
                .ok_or_else(|| invalid(format!("missing block {hash}")))?;
            if block.hash() != hash {
                return Err(invalid(format!("block {hash} fails its own hash")));
            }
            if !block.meets(self.min_difficulty) {
                return Err(invalid(format!(
                    "block {hash} below difficulty {}",
                    self.min_difficulty
                )));
            }
            for entry in &block.entries {
                mined.insert(entry.hash());
            }
            counted += 1;
            cursor = block.previous;
        }
        if counted != length {
            return Err(invalid(format!("claimed length {length}, found {counted}")));
        }
        Ok(mined)
    }
}

impl Ledger for MemoryLedger {
    fn append(&self, stream: &str, record: SignedRecord) -> Result<RecordHash> {
        record.verify()?;
        let entry = Entry::new(record);
        let hash = entry.hash();
        let mut streams = self.streams.write();
        let state = streams.entry(stream.to_string()).or_default();
        state.pending.push(entry);
        debug!(stream, entry = %hash, pending = state.pending.len(), "appended record");
        Ok(hash)
    }

    fn iterate_from_head(
        &self,
        stream: &str,
        visitor: &mut dyn FnMut(&Entry) -> Result<Visit>,
    ) -> Result<()> {
        let streams = self.streams.read();
        let Some(state) = streams.get(stream) else {
            return Ok(());
        };
        let mut cursor = state.head;
        while let Some(hash) = cursor {
            let Some(block) = state.blocks.get(&hash) else {
                return Err(LedgerError::InvalidChain {
                    stream: stream.to_string(),
                    reason: format!("missing block {hash}"),
                });
            };
            // Entries are stored oldest-first within a block; walk them
            // backward so the overall visit order is strictly newest-first.
            for entry in block.entries.iter().rev() {
                if visitor(entry)? == Visit::Stop {
                    return Ok(());
                }
            }
            cursor = block.previous;
        }
        Ok(())
    }

    fn head(&self, stream: &str) -> Option<BlockHash> {
        self.streams.read().get(stream).and_then(|s| s.head)
    }

    fn register_trigger(&self, stream: &str, trigger: UpdateTrigger) -> TriggerId {
        let id = TriggerId(self.next_trigger.fetch_add(1, Ordering::Relaxed));
        self.triggers
            .write()
            .entry(stream.to_string())
            .or_default()
            .push((id, trigger));
        id
    }

    fn unregister_trigger(&self, stream: &str, id: TriggerId) {
        if let Some(list) = self.triggers.write().get_mut(stream) {
            list.retain(|(existing, _)| *existing != id);
        }
    }

    fn pull(&self, stream: &str) -> Result<bool> {
        let Some(hub) = &self.hub else {
            return Ok(false);
        };
        let Some(remote) = hub.chain(stream) else {
            return Ok(false);
        };
        {
            let streams = self.streams.read();
            let local_length = streams.get(stream).map(|s| s.length).unwrap_or(0);
            if remote.length <= local_length {
                return Ok(false);
            }
        }
        let mined = self.validate_chain(stream, remote.head, remote.length, &remote.blocks)?;
        {
            let mut streams = self.streams.write();
            let state = streams.entry(stream.to_string()).or_default();
            // Re-check under the write lock; another pull may have won.
            if remote.length <= state.length {
                return Ok(false);
            }
            debug!(stream, length = remote.length, head = %remote.head, "adopted remote chain");
            state.head = Some(remote.head);
            state.length = remote.length;
            state.blocks = remote.blocks;
            // Drop pending entries the adopted chain already carries, so a
            // later mine cannot duplicate them on the chain.
            state.pending.retain(|entry| !mined.contains(&entry.hash()));
        }
        self.fire_triggers(stream);
        Ok(true)
    }

    fn push(&self, stream: &str) -> Result<()> {
        let Some(hub) = &self.hub else {
            return Ok(());
        };
        let snapshot = {
            let streams = self.streams.read();
            streams.get(stream).and_then(|state| {
                state.head.map(|head| (head, state.length, state.blocks.clone()))
            })
        };
        if let Some((head, length, blocks)) = snapshot {
            hub.offer(stream, head, length, blocks);
        }
        Ok(())
    }

    fn mine(
        &self,
        stream: &str,
        difficulty: u32,
        listener: Option<&dyn MiningListener>,
    ) -> Result<Option<BlockHash>> {
        let (previous, entries) = {
            let mut streams = self.streams.write();
            let state = streams.entry(stream.to_string()).or_default();
            if state.pending.is_empty() {
                return Ok(None);
            }
            (state.head, std::mem::take(&mut state.pending))
        };

        let mut block = Block {
            previous,
            timestamp: timestamp_now(),
            miner: self.miner.clone(),
            nonce: 0,
            entries,
        };
        let hash = solve(&mut block, difficulty, listener)?;

        {
            let mut streams = self.streams.write();
            let state = streams.entry(stream.to_string()).or_default();
            if state.head != block.previous {
                // Head moved while we mined (a pull adopted a longer
                // chain). Requeue and let the next cycle rebuild on top.
                warn!(stream, "head moved during mining, requeueing entries");
                let mut requeued = block.entries;
                requeued.extend(state.pending.drain(..));
                state.pending = requeued;
                return Ok(None);
            }
            debug!(
                stream,
                head = %hash,
                entries = block.entries.len(),
                zero_bits = hash.leading_zero_bits(),
                "mined block"
            );
            state.blocks.insert(hash, block);
            state.head = Some(hash);
            state.length += 1;
        }
        self.fire_triggers(stream);
        Ok(Some(hash))
    }
}

/// Solve proof-of-work by nonce search.
fn solve(
    block: &mut Block,
    difficulty: u32,
    listener: Option<&dyn MiningListener>,
) -> Result<BlockHash> {
    let mut best = 0;
    for nonce in 0..u64::MAX {
        block.nonce = nonce;
        let hash = block.hash();
        let zero_bits = hash.leading_zero_bits();
        if zero_bits > best {
            best = zero_bits;
            if let Some(listener) = listener {
                listener.on_progress(nonce, best);
            }
        }
        if zero_bits >= difficulty {
            return Ok(hash);
        }
    }
    Err(LedgerError::Mining("nonce space exhausted".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Identity;
    use std::sync::atomic::AtomicUsize;

    const DIFFICULTY: u32 = 8;

    fn record(identity: &Identity, timestamp: u64, payload: &[u8]) -> SignedRecord {
        identity.sign_at(timestamp, payload.to_vec())
    }

    #[test]
    fn append_rejects_bad_signatures() {
        let ledger = MemoryLedger::new("node");
        let identity = Identity::generate("alice");
        let mut forged = record(&identity, 1, b"vote");
        forged.payload = b"other".to_vec();
        assert!(matches!(
            ledger.append("s", forged),
            Err(LedgerError::BadSignature { .. })
        ));
        assert_eq!(ledger.pending_len("s"), 0);
    }

    #[test]
    fn mine_with_nothing_pending_is_none() {
        let ledger = MemoryLedger::new("node");
        assert!(ledger.mine("s", DIFFICULTY, None).unwrap().is_none());
        assert!(ledger.head("s").is_none());
    }

    #[test]
    fn mined_entries_are_visible_newest_first() {
        let ledger = MemoryLedger::new("node");
        let identity = Identity::generate("alice");
        ledger.append("s", record(&identity, 1, b"first")).unwrap();
        ledger.append("s", record(&identity, 2, b"second")).unwrap();

        let head = ledger.mine("s", DIFFICULTY, None).unwrap().unwrap();
        assert_eq!(ledger.head("s"), Some(head));
        assert!(head.leading_zero_bits() >= DIFFICULTY);
        assert_eq!(ledger.pending_len("s"), 0);

        let mut timestamps = Vec::new();
        ledger
            .iterate_from_head("s", &mut |entry| {
                timestamps.push(entry.timestamp());
                Ok(Visit::Continue)
            })
            .unwrap();
        assert_eq!(timestamps, vec![2, 1]);
    }

    #[test]
    fn iteration_spans_blocks_and_honors_stop() {
        let ledger = MemoryLedger::new("node");
        let identity = Identity::generate("alice");
        ledger.append("s", record(&identity, 1, b"a")).unwrap();
        ledger.mine("s", DIFFICULTY, None).unwrap();
        ledger.append("s", record(&identity, 2, b"b")).unwrap();
        ledger.mine("s", DIFFICULTY, None).unwrap();

        let mut visited = 0;
        ledger
            .iterate_from_head("s", &mut |_| {
                visited += 1;
                Ok(Visit::Stop)
            })
            .unwrap();
        assert_eq!(visited, 1);

        let mut all = Vec::new();
        ledger
            .iterate_from_head("s", &mut |entry| {
                all.push(entry.timestamp());
                Ok(Visit::Continue)
            })
            .unwrap();
        assert_eq!(all, vec![2, 1]);
    }

    #[test]
    fn triggers_fire_on_mine_and_unregister() {
        let ledger = MemoryLedger::new("node");
        let identity = Identity::generate("alice");
        let fired = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&fired);
        let id = ledger.register_trigger(
            "s",
            Arc::new(move || {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );

        ledger.append("s", record(&identity, 1, b"a")).unwrap();
        ledger.mine("s", DIFFICULTY, None).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        ledger.unregister_trigger("s", id);
        ledger.append("s", record(&identity, 2, b"b")).unwrap();
        ledger.mine("s", DIFFICULTY, None).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mining_listener_sees_progress() {
        struct Progress(AtomicUsize);
        impl MiningListener for Progress {
            fn on_progress(&self, _nonce: u64, _zero_bits: u32) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let ledger = MemoryLedger::new("node");
        let identity = Identity::generate("alice");
        ledger.append("s", record(&identity, 1, b"a")).unwrap();
        let progress = Progress(AtomicUsize::new(0));
        ledger.mine("s", DIFFICULTY, Some(&progress)).unwrap();
        assert!(progress.0.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn push_then_pull_converges_through_a_hub() {
        let hub = Arc::new(MemoryHub::new());
        let alice = MemoryLedger::new("alice").with_hub(Arc::clone(&hub));
        let bob = MemoryLedger::new("bob").with_hub(Arc::clone(&hub));
        let identity = Identity::generate("alice");

        alice.append("s", record(&identity, 1, b"vote")).unwrap();
        alice.mine("s", DIFFICULTY, None).unwrap();
        alice.push("s").unwrap();

        assert!(bob.pull("s").unwrap());
        assert_eq!(bob.head("s"), alice.head("s"));
        assert_eq!(bob.chain_length("s"), 1);
        // A second pull with nothing new is a quiet no-op.
        assert!(!bob.pull("s").unwrap());
    }

    #[test]
    fn pull_fires_triggers_and_dedups_pending() {
        let hub = Arc::new(MemoryHub::new());
        let alice = MemoryLedger::new("alice").with_hub(Arc::clone(&hub));
        let bob = MemoryLedger::new("bob").with_hub(Arc::clone(&hub));
        let identity = Identity::generate("alice");
        let shared = record(&identity, 1, b"vote");

        alice.append("s", shared.clone()).unwrap();
        alice.mine("s", DIFFICULTY, None).unwrap();
        alice.push("s").unwrap();

        // Bob holds the same record unmined; adoption must drop it.
        bob.append("s", shared).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&fired);
        bob.register_trigger(
            "s",
            Arc::new(move || {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(bob.pull("s").unwrap());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(bob.pending_len("s"), 0);
    }

    #[test]
    fn pull_rejects_an_invalid_remote_chain() {
        let hub = Arc::new(MemoryHub::new());
        let bob = MemoryLedger::new("bob").with_hub(Arc::clone(&hub));

        let block = Block {
            previous: None,
            timestamp: 1,
            miner: "mallory".into(),
            nonce: 0,
            entries: Vec::new(),
        };
        let head = block.hash();
        // Claimed length does not match the chain.
        hub.offer("s", head, 5, HashMap::from([(head, block)]));

        assert!(matches!(
            bob.pull("s"),
            Err(LedgerError::InvalidChain { .. })
        ));
        assert!(bob.head("s").is_none());
    }

    #[test]
    fn offline_pull_and_push_are_noops() {
        let ledger = MemoryLedger::new("node");
        assert!(!ledger.pull("s").unwrap());
        ledger.push("s").unwrap();
    }
}
