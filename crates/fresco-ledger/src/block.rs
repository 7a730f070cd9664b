//! Blocks and proof-of-work.

use crate::entry::Entry;

/// Production proof-of-work threshold: leading zero bits required of a
/// block hash. Tests use much smaller values.
pub const PAINT_DIFFICULTY: u32 = 18;

/// A 32-byte blake3 block hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Number of leading zero bits - the proof-of-work measure.
    pub fn leading_zero_bits(&self) -> u32 {
        let mut zeros = 0;
        for byte in self.0 {
            if byte == 0 {
                zeros += 8;
            } else {
                zeros += byte.leading_zeros();
                break;
            }
        }
        zeros
    }

    /// Full hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}...", &self.to_hex()[..8])
    }
}

/// One mined block: a batch of entries chained to its predecessor.
#[derive(Debug, Clone)]
pub struct Block {
    /// Hash of the previous block; `None` for the stream's first block
    pub previous: Option<BlockHash>,
    /// When mining completed, nanoseconds since the Unix epoch
    pub timestamp: u64,
    /// Alias of the miner
    pub miner: String,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Entries mined into this block, in append order
    pub entries: Vec<Entry>,
}

impl Block {
    /// Hash of the block's canonical form.
    ///
    /// Entries contribute through their content hashes, so the block hash
    /// commits to entry identity without re-hashing record bodies in the
    /// mining loop.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = blake3::Hasher::new();
        match self.previous {
            Some(previous) => hasher.update(previous.as_bytes()),
            None => hasher.update(&[0u8; 32]),
        };
        hasher.update(&self.timestamp.to_be_bytes());
        hasher.update(&(self.miner.len() as u64).to_be_bytes());
        hasher.update(self.miner.as_bytes());
        hasher.update(&self.nonce.to_be_bytes());
        for entry in &self.entries {
            hasher.update(entry.hash().as_bytes());
        }
        BlockHash(*hasher.finalize().as_bytes())
    }

    /// Whether this block's hash meets a difficulty threshold.
    pub fn meets(&self, difficulty: u32) -> bool {
        self.hash().leading_zero_bits() >= difficulty
    }
}

/// Observer for proof-of-work progress.
///
/// Called from inside the mining loop whenever the best hash seen so far
/// improves; implementations must be cheap.
pub trait MiningListener: Send + Sync {
    /// A new best attempt: the nonce tried and the leading zero bits achieved.
    fn on_progress(&self, nonce: u64, zero_bits: u32);
}
