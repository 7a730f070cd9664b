//! The model registry and canvas-period helpers.
//!
//! One registry lives at the process's composition root and is passed by
//! reference to whatever needs to look up or open the governance instance
//! for a canvas. It replaces any notion of process-global model state.

use crate::error::Result;
use crate::model::{Model, UpdateObserver};
use fresco_ledger::{Identity, Ledger, LedgerError, Visit};
use fresco_records::{canvas_stream, Canvas, CanvasId, Payload, Period};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Open governance instances, keyed by canvas id.
///
/// `open` is get-or-create and binds a new model before returning it;
/// `discard` unbinds and drops. All instances share one ledger handle and
/// one authoring identity.
pub struct ModelRegistry {
    ledger: Arc<dyn Ledger>,
    identity: Arc<Identity>,
    difficulty: u32,
    models: Mutex<HashMap<CanvasId, Arc<Model>>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new(ledger: Arc<dyn Ledger>, identity: Arc<Identity>, difficulty: u32) -> Self {
        Self {
            ledger,
            identity,
            difficulty,
            models: Mutex::new(HashMap::new()),
        }
    }

    /// The governance model for a canvas, opening and binding it if absent.
    ///
    /// Must be called from within a tokio runtime (binding registers
    /// runtime-spawning triggers). The observer only takes effect when
    /// this call creates the instance.
    pub fn open(
        &self,
        id: CanvasId,
        canvas: Canvas,
        observer: Option<UpdateObserver>,
    ) -> Result<Arc<Model>> {
        let mut models = self.models.lock();
        if let Some(model) = models.get(&id) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(Model::open(
            Arc::clone(&self.ledger),
            Arc::clone(&self.identity),
            id.clone(),
            canvas,
            self.difficulty,
            observer,
        )?);
        model.bind();
        debug!(canvas = %id, "opened governance model");
        models.insert(id, Arc::clone(&model));
        Ok(model)
    }

    /// The already-open model for a canvas, if any.
    pub fn get(&self, id: &CanvasId) -> Option<Arc<Model>> {
        self.models.lock().get(id).map(Arc::clone)
    }

    /// Unbind and drop a canvas's model. Returns whether one was open.
    pub fn discard(&self, id: &CanvasId) -> bool {
        match self.models.lock().remove(id) {
            Some(model) => {
                model.discard();
                debug!(canvas = %id, "discarded governance model");
                true
            }
            None => false,
        }
    }

    /// Number of open instances.
    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    /// Whether no instance is open.
    pub fn is_empty(&self) -> bool {
        self.models.lock().is_empty()
    }
}

/// Append a canvas record to a period's canvas stream and mine it in.
///
/// Returns the new canvas's id: the hex of its record's content hash.
pub fn publish_canvas(
    ledger: &dyn Ledger,
    identity: &Identity,
    period: Period,
    canvas: &Canvas,
    difficulty: u32,
) -> Result<CanvasId> {
    let stream = canvas_stream(period);
    let record = identity.sign(canvas.encode()?);
    let hash = ledger.append(&stream, record)?;
    ledger.mine(&stream, difficulty, None)?;
    debug!(%stream, canvas = %canvas.name, id = %hash, "published canvas");
    Ok(CanvasId::from_hex(hash.to_hex()))
}

/// Locate and decode a canvas record by id in a period's stream.
pub fn find_canvas(ledger: &dyn Ledger, period: Period, id: &CanvasId) -> Result<Option<Canvas>> {
    let stream = canvas_stream(period);
    let mut found = None;
    ledger.iterate_from_head(&stream, &mut |entry| {
        if entry.hash().to_hex() == id.as_str() {
            found = Some(Canvas::decode(entry.payload()).map_err(LedgerError::from)?);
            return Ok(Visit::Stop);
        }
        Ok(Visit::Continue)
    })?;
    Ok(found)
}
