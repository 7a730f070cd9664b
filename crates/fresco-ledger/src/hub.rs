//! In-process replication hub.

use crate::block::{Block, BlockHash};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// The best chain the hub has seen for one stream.
#[derive(Debug, Clone)]
pub(crate) struct HubChain {
    pub head: BlockHash,
    pub length: u64,
    pub blocks: HashMap<BlockHash, Block>,
}

/// An in-process stand-in for the peer network.
///
/// Ledgers configured with the same hub converge per stream on the longest
/// chain: `push` offers a ledger's chain to the hub, `pull` adopts the
/// hub's chain when strictly longer. Safe for concurrent use from many
/// ledgers and streams; real peer discovery and wire transport live
/// outside this workspace behind the same seam.
#[derive(Debug, Default)]
pub struct MemoryHub {
    streams: RwLock<HashMap<String, HubChain>>,
}

impl MemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a chain; the hub keeps it if strictly longer than what it has.
    /// Returns whether the hub adopted the offer.
    pub(crate) fn offer(
        &self,
        stream: &str,
        head: BlockHash,
        length: u64,
        blocks: HashMap<BlockHash, Block>,
    ) -> bool {
        let mut streams = self.streams.write();
        match streams.get(stream) {
            Some(existing) if existing.length >= length => false,
            _ => {
                debug!(stream, length, head = %head, "hub adopted chain");
                streams.insert(stream.to_string(), HubChain { head, length, blocks });
                true
            }
        }
    }

    /// The hub's current chain for a stream, if any.
    pub(crate) fn chain(&self, stream: &str) -> Option<HubChain> {
        self.streams.read().get(stream).cloned()
    }

    /// Length of the hub's chain for a stream (0 when absent).
    pub fn chain_length(&self, stream: &str) -> u64 {
        self.streams.read().get(stream).map(|c| c.length).unwrap_or(0)
    }
}
