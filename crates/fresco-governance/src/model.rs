//! Governance models: the state machine that keeps a canvas converging.
//!
//! A model instance moves through `Constructed -> Bound -> Refreshing <->
//! Idle`, terminally `Discarded`. Binding registers an update trigger with
//! the ledger and fires one immediate refresh for initial synchronization.
//! Each refresh is single-flight: a trigger arriving while one runs is
//! coalesced into it, never queued. Mining and publishing happen in a
//! background task after the projection lock is released, and their
//! failures never revert absorbed state.

use crate::error::{GovernanceError, Result};
use crate::projection::Projection;
use crate::resolve::PluralityPolicy;
use fresco_ledger::{Identity, Ledger, LedgerError, RecordHash, TriggerId};
use fresco_records::{vote_stream, Canvas, CanvasId, Colour, Location, Mode, Payload, Vote};
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Callback invoked after every completed refresh, outside all locks.
pub type UpdateObserver = Arc<dyn Fn() + Send + Sync>;

struct VoteInner {
    ledger: Arc<dyn Ledger>,
    identity: Arc<Identity>,
    id: CanvasId,
    canvas: Canvas,
    stream: String,
    difficulty: u32,
    projection: Mutex<Projection<Vote>>,
    refreshing: AtomicBool,
    observer: Option<UpdateObserver>,
    trigger: SyncMutex<Option<TriggerId>>,
}

/// Vote-accumulating governance model.
///
/// Owns one projection of the canvas's vote stream and writes [`Vote`]
/// records. Concrete modes compose this with a resolution rule; see
/// [`FreeForAllModel`].
pub struct VoteModel {
    inner: Arc<VoteInner>,
}

impl VoteModel {
    /// Construct an unbound model for a canvas's vote stream.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        identity: Arc<Identity>,
        id: CanvasId,
        canvas: Canvas,
        difficulty: u32,
        observer: Option<UpdateObserver>,
    ) -> Self {
        let stream = vote_stream(&id);
        Self {
            inner: Arc::new(VoteInner {
                ledger,
                identity,
                id,
                canvas,
                stream,
                difficulty,
                projection: Mutex::new(Projection::new()),
                refreshing: AtomicBool::new(false),
                observer,
                trigger: SyncMutex::new(None),
            }),
        }
    }

    /// The canvas this model governs.
    pub fn canvas(&self) -> &Canvas {
        &self.inner.canvas
    }

    /// The canvas id this model governs.
    pub fn id(&self) -> &CanvasId {
        &self.inner.id
    }

    /// The ledger stream this model projects.
    pub fn stream(&self) -> &str {
        &self.inner.stream
    }

    /// Register for ledger updates and start the initial synchronization.
    ///
    /// Must be called from within a tokio runtime; the captured handle is
    /// what lets the ledger's trigger thread schedule refreshes. Triggers
    /// hold a weak reference, so a dropped model cannot be revived by a
    /// late callback. Binding twice is a no-op.
    pub fn bind(&self) {
        let mut trigger = self.inner.trigger.lock();
        if trigger.is_some() {
            return;
        }
        let handle = Handle::current();
        let weak = Arc::downgrade(&self.inner);
        let spawn_handle = handle.clone();
        let id = self.inner.ledger.register_trigger(
            &self.inner.stream,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    spawn_handle.spawn(refresh(inner));
                }
            }),
        );
        *trigger = Some(id);
        drop(trigger);

        debug!(stream = %self.inner.stream, "bound, starting initial synchronization");
        handle.spawn(refresh(Arc::clone(&self.inner)));
    }

    /// Run one refresh pass now (or coalesce into one already running).
    pub async fn refresh(&self) {
        refresh(Arc::clone(&self.inner)).await;
    }

    /// Author a vote for a colour at a location.
    ///
    /// Signs and appends the record as an unmined, locally-cached entry;
    /// the next refresh/mine cycle surfaces it. Never touches the
    /// projection, so a stalled refresh cannot block writers.
    pub fn write(&self, location: &Location, colour: &Colour) -> Result<RecordHash> {
        let vote = Vote::new(*location, *colour);
        let record = self.inner.identity.sign(vote.encode()?);
        let hash = self.inner.ledger.append(&self.inner.stream, record)?;
        debug!(stream = %self.inner.stream, entry = %hash, location = %location, "wrote vote");
        Ok(hash)
    }

    /// Winning colour at a location under the plurality rule.
    pub async fn resolve(&self, location: &Location) -> Option<Colour> {
        let projection = self.inner.projection.lock().await;
        PluralityPolicy::resolve(projection.payloads(), location)
    }

    /// Visit every absorbed proposal in visible order.
    ///
    /// Feeds a renderer: later calls for the same location supersede
    /// earlier ones when painted in order.
    pub async fn draw(&self, visitor: &mut dyn FnMut(&Location, &Colour)) {
        let projection = self.inner.projection.lock().await;
        for vote in projection.payloads() {
            visitor(&vote.location, &vote.colour);
        }
    }

    /// Number of absorbed proposals.
    pub async fn proposal_count(&self) -> usize {
        self.inner.projection.lock().await.len()
    }

    /// Unregister from ledger updates. No further callbacks fire.
    pub fn discard(&self) {
        if let Some(id) = self.inner.trigger.lock().take() {
            self.inner.ledger.unregister_trigger(&self.inner.stream, id);
            debug!(stream = %self.inner.stream, "discarded");
        }
    }
}

impl Drop for VoteModel {
    fn drop(&mut self) {
        self.discard();
    }
}

/// One refresh pass: pull, absorb under the lock, reorder, then notify and
/// mine outside it. Single-flight per instance.
async fn refresh(inner: Arc<VoteInner>) {
    if inner.refreshing.swap(true, Ordering::AcqRel) {
        debug!(stream = %inner.stream, "refresh already in flight, coalescing");
        return;
    }

    match inner.ledger.pull(&inner.stream) {
        Ok(true) => debug!(stream = %inner.stream, "pulled new blocks from peers"),
        Ok(false) => {}
        Err(e) => warn!(stream = %inner.stream, error = %e, "pull failed"),
    }

    let absorbed = {
        let mut projection = inner.projection.lock().await;
        let result = inner.ledger.iterate_from_head(&inner.stream, &mut |entry| {
            projection.absorb(entry).map_err(LedgerError::from)
        });
        projection.reorder();
        result
    };
    if let Err(e) = absorbed {
        // Partial progress: whatever absorbed before the failure stays;
        // the next trigger retries the remainder.
        warn!(stream = %inner.stream, error = %e, "absorption stopped early");
    }

    inner.refreshing.store(false, Ordering::Release);

    if let Some(observer) = &inner.observer {
        observer();
    }

    let miner = Arc::clone(&inner);
    tokio::task::spawn_blocking(move || {
        match miner.ledger.mine(&miner.stream, miner.difficulty, None) {
            Ok(Some(head)) => debug!(stream = %miner.stream, head = %head, "mined pending proposals"),
            Ok(None) => {}
            Err(e) => warn!(stream = %miner.stream, error = %e, "mining failed"),
        }
        if let Err(e) = miner.ledger.push(&miner.stream) {
            warn!(stream = %miner.stream, error = %e, "push failed");
        }
    });
}

/// Free-for-all governance: plurality-vote resolution over unlimited votes.
pub struct FreeForAllModel {
    votes: VoteModel,
}

impl FreeForAllModel {
    /// Construct an unbound free-for-all model.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        identity: Arc<Identity>,
        id: CanvasId,
        canvas: Canvas,
        difficulty: u32,
        observer: Option<UpdateObserver>,
    ) -> Self {
        Self {
            votes: VoteModel::new(ledger, identity, id, canvas, difficulty, observer),
        }
    }

    /// See [`VoteModel::bind`].
    pub fn bind(&self) {
        self.votes.bind();
    }

    /// See [`VoteModel::refresh`].
    pub async fn refresh(&self) {
        self.votes.refresh().await;
    }

    /// See [`VoteModel::write`].
    pub fn write(&self, location: &Location, colour: &Colour) -> Result<RecordHash> {
        self.votes.write(location, colour)
    }

    /// See [`VoteModel::resolve`].
    pub async fn resolve(&self, location: &Location) -> Option<Colour> {
        self.votes.resolve(location).await
    }

    /// See [`VoteModel::draw`].
    pub async fn draw(&self, visitor: &mut dyn FnMut(&Location, &Colour)) {
        self.votes.draw(visitor).await;
    }

    /// See [`VoteModel::discard`].
    pub fn discard(&self) {
        self.votes.discard();
    }

    /// The underlying vote model.
    pub fn votes(&self) -> &VoteModel {
        &self.votes
    }
}

/// A governance model for one canvas and period.
///
/// The closed dispatch over [`Mode`]: every mode the system names is
/// representable, and the unimplemented ones fail at construction with an
/// error naming them rather than being silently absent.
pub enum Model {
    /// Plurality vote over unlimited proposals.
    FreeForAll(FreeForAllModel),
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreeForAll(_) => f.debug_tuple("FreeForAll").finish(),
        }
    }
}

impl Model {
    /// Open the governance model for a canvas.
    ///
    /// Fails with [`GovernanceError::UnsupportedMode`] for any mode
    /// without an implementation; no projection store is created in that
    /// case.
    pub fn open(
        ledger: Arc<dyn Ledger>,
        identity: Arc<Identity>,
        id: CanvasId,
        canvas: Canvas,
        difficulty: u32,
        observer: Option<UpdateObserver>,
    ) -> Result<Self> {
        match canvas.mode {
            Mode::FreeForAll => Ok(Self::FreeForAll(FreeForAllModel::new(
                ledger, identity, id, canvas, difficulty, observer,
            ))),
            mode => Err(GovernanceError::UnsupportedMode { mode }),
        }
    }

    /// The canvas this model governs.
    pub fn canvas(&self) -> &Canvas {
        match self {
            Self::FreeForAll(model) => model.votes().canvas(),
        }
    }

    /// Register for ledger updates and start initial synchronization.
    pub fn bind(&self) {
        match self {
            Self::FreeForAll(model) => model.bind(),
        }
    }

    /// Run one refresh pass now.
    pub async fn refresh(&self) {
        match self {
            Self::FreeForAll(model) => model.refresh().await,
        }
    }

    /// Author a proposal for a colour at a location.
    pub fn write(&self, location: &Location, colour: &Colour) -> Result<RecordHash> {
        match self {
            Self::FreeForAll(model) => model.write(location, colour),
        }
    }

    /// Winning colour at a location under this model's rule.
    pub async fn resolve(&self, location: &Location) -> Option<Colour> {
        match self {
            Self::FreeForAll(model) => model.resolve(location).await,
        }
    }

    /// Visit every absorbed proposal in visible order.
    pub async fn draw(&self, visitor: &mut dyn FnMut(&Location, &Colour)) {
        match self {
            Self::FreeForAll(model) => model.draw(visitor).await,
        }
    }

    /// Unregister from ledger updates.
    pub fn discard(&self) {
        match self {
            Self::FreeForAll(model) => model.discard(),
        }
    }
}
