//! The ledger adapter contract.

use crate::block::{BlockHash, MiningListener};
use crate::entry::{Entry, RecordHash};
use crate::error::Result;
use crate::record::SignedRecord;
use std::sync::Arc;

/// Flow control for [`Ledger::iterate_from_head`] visitors.
///
/// `Stop` is the early-stop signal, not an error: absorption uses it to
/// end a pass once it reaches an entry it has already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep visiting older entries.
    Continue,
    /// End the iteration without error.
    Stop,
}

/// Callback fired when a stream's head changes.
pub type UpdateTrigger = Arc<dyn Fn() + Send + Sync>;

/// Handle for unregistering an update trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(pub u64);

/// The narrow contract the governance core requires from a ledger.
///
/// Streams are named, append-only, proof-of-work ordered sequences of
/// signed records. Implementations must tolerate concurrent use from many
/// governance instances; update triggers must be invoked outside any
/// internal lock.
pub trait Ledger: Send + Sync {
    /// Store a record on a stream as an unmined, locally-cached entry.
    ///
    /// Returns the entry's content hash. The entry only becomes visible to
    /// [`iterate_from_head`](Self::iterate_from_head) once mined.
    fn append(&self, stream: &str, record: SignedRecord) -> Result<RecordHash>;

    /// Visit mined entries newest-first, walking the chain backward from
    /// its head through previous-block links.
    ///
    /// The visitor returns [`Visit::Stop`] to end iteration early without
    /// error; a visitor error aborts iteration and propagates.
    fn iterate_from_head(
        &self,
        stream: &str,
        visitor: &mut dyn FnMut(&Entry) -> Result<Visit>,
    ) -> Result<()>;

    /// Current head of a stream, if any block has been mined.
    fn head(&self, stream: &str) -> Option<BlockHash>;

    /// Register a callback fired whenever the stream's head changes.
    fn register_trigger(&self, stream: &str, trigger: UpdateTrigger) -> TriggerId;

    /// Remove a previously registered trigger.
    fn unregister_trigger(&self, stream: &str, id: TriggerId);

    /// Fetch the stream from configured peers, adopting a longer chain.
    ///
    /// Returns whether the head advanced. A no-op returning `false` when
    /// no replication collaborator is configured.
    fn pull(&self, stream: &str) -> Result<bool>;

    /// Publish the stream to configured peers. A no-op when no replication
    /// collaborator is configured.
    fn push(&self, stream: &str) -> Result<()>;

    /// Mine pending entries into a new block at the given difficulty.
    ///
    /// Returns the new head, or `Ok(None)` when nothing is pending. The
    /// optional listener observes proof-of-work progress.
    fn mine(
        &self,
        stream: &str,
        difficulty: u32,
        listener: Option<&dyn MiningListener>,
    ) -> Result<Option<BlockHash>>;
}
