//! The ledger service: block construction, linkage, persistence, retrieval,
//! and validation.
//!
//! [`BlockChain`] orchestrates everything around the injected
//! [`BlockStore`]: it derives heights, links each new block to its parent's
//! hash, computes block hashes, and exposes the scanning and validation
//! operations. The first time an empty store is opened, a genesis block is
//! synthesized and persisted automatically.
//!
//! # Concurrency
//!
//! Appends are serialized by a mutex-held height counter: height reservation,
//! parent-hash linking, hash computation, and the persist all happen inside
//! one critical section, so two concurrent `add_block` calls can never claim
//! the same height. Reads and scans run lock-free against the store and may
//! execute concurrently with each other and with the writer; a validation
//! scan racing an in-flight append may observe a transient tail, so results
//! against a moving ledger are best-effort.
//!
//! # Example
//!
//! ```
//! use libledger::{BlockChain, MemoryStore, RecordBody};
//!
//! # fn main() -> Result<(), libledger::LedgerError> {
//! let chain = BlockChain::open(MemoryStore::new())?;
//!
//! let block = chain.add_block(RecordBody::new("1A2b3C", "hello"))?;
//! assert_eq!(block.height, 1);
//! assert_eq!(block.previous_block_hash, chain.get_block(0)?.hash);
//!
//! assert!(chain.validate_chain()?.is_valid());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::block::{Block, BlockBody};
use crate::error::LedgerError;
use crate::hasher::{hash_block, BlockHasher, Sha256Hasher};
use crate::scanner::ChainScanner;
use crate::store::BlockStore;

/// Payload of the automatically created genesis block.
pub const GENESIS_NOTE: &str = "First block in the chain - Genesis block";

/// Append-only, hash-linked ledger over an injected [`BlockStore`].
///
/// The store and hasher are constructor dependencies, so tests run against
/// [`MemoryStore`](crate::store::MemoryStore) and production against a
/// persistent backend without touching the service.
pub struct BlockChain<S: BlockStore, H: BlockHasher = Sha256Hasher> {
    store: S,
    hasher: H,

    /// Next height to be assigned. Recovered from the store at open, then
    /// maintained here so height reads never rescan the store.
    next_height: Mutex<u64>,
}

impl<S: BlockStore> BlockChain<S, Sha256Hasher> {
    /// Open a ledger over `store` with the default SHA-256 hasher.
    ///
    /// Scans the store once to recover the current tip. If the store is
    /// empty, a genesis block is synthesized and persisted: height 0, empty
    /// `previous_block_hash`, and the fixed [`GENESIS_NOTE`] payload.
    pub fn open(store: S) -> Result<Self, LedgerError> {
        Self::open_with_hasher(store, Sha256Hasher)
    }
}

impl<S: BlockStore, H: BlockHasher> BlockChain<S, H> {
    /// Open a ledger with a custom hasher. See [`BlockChain::open`].
    pub fn open_with_hasher(store: S, hasher: H) -> Result<Self, LedgerError> {
        let mut tip: Option<u64> = None;
        for entry in store.iter() {
            let (height, _value) = entry?;
            tip = Some(height);
        }

        let chain = Self {
            store,
            hasher,
            next_height: Mutex::new(tip.map_or(0, |t| t + 1)),
        };
        if tip.is_none() {
            let genesis = chain.add_block(GENESIS_NOTE)?;
            info!(hash = %genesis.hash, "genesis block created");
        }
        Ok(chain)
    }

    /// Append a new block carrying `body`.
    ///
    /// The ledger completes the block: it derives the next height, copies the
    /// parent's hash into `previous_block_hash` (heights > 0), stamps the
    /// timestamp, computes the hash over the canonical form, and persists the
    /// block under its height key.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`](crate::error::StoreError) if persistence
    /// fails after hashing. In that case the height counter is untouched and
    /// the block is entirely lost; there is no partial state to recover, and the
    /// caller retries the whole operation with the original payload.
    pub fn add_block(&self, body: impl Into<BlockBody>) -> Result<Block, LedgerError> {
        let mut next = self.next_height.lock().unwrap();

        let height = *next;
        let previous_block_hash = if height == 0 {
            String::new()
        } else {
            self.get_block(height - 1)?.hash
        };

        let mut block = Block {
            height,
            hash: String::new(),
            previous_block_hash,
            timestamp: unix_now(),
            body: body.into(),
        };
        block.hash = hash_block(&self.hasher, &block)?;

        let value = serde_json::to_vec(&block)?;
        self.store.put(height, &value)?;
        *next = height + 1;

        debug!(height, hash = %block.hash, "block appended");
        Ok(block)
    }

    /// Fetch the block at `height`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::BlockNotFound`] if no block exists at this height.
    pub fn get_block(&self, height: u64) -> Result<Block, LedgerError> {
        let bytes = self
            .store
            .get(height)?
            .ok_or(LedgerError::BlockNotFound(height))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::Codec(format!("undecodable block at height {height}: {e}")))
    }

    /// Fetch the block at `height` with the read-time content decode applied
    /// (non-genesis record blocks only).
    pub fn get_block_decoded(&self, height: u64) -> Result<Block, LedgerError> {
        Ok(self.get_block(height)?.decoded())
    }

    /// The highest stored height, or `None` if the store holds no blocks.
    ///
    /// Reads the cached counter; never rescans the store.
    pub fn height(&self) -> Option<u64> {
        self.next_height.lock().unwrap().checked_sub(1)
    }

    /// Total number of blocks in the ledger.
    pub fn block_count(&self) -> u64 {
        *self.next_height.lock().unwrap()
    }

    /// Find the first block whose hash matches.
    ///
    /// Scans in height order and stops at the first match; non-genesis
    /// results carry the decoded content view.
    ///
    /// # Errors
    ///
    /// [`LedgerError::BlockNotFoundByHash`] if the scan completes without a
    /// match.
    pub fn get_block_by_hash(&self, hash: &str) -> Result<Block, LedgerError> {
        for block in self.scanner() {
            let block = block?;
            if block.hash == hash {
                return Ok(block.decoded());
            }
        }
        Err(LedgerError::BlockNotFoundByHash(hash.to_owned()))
    }

    /// All non-genesis blocks registered under `address`, content decoded.
    ///
    /// Returns an empty vector, never an error, when nothing matches.
    pub fn get_blocks_by_address(&self, address: &str) -> Result<Vec<Block>, LedgerError> {
        let mut blocks = Vec::new();
        for block in self.scanner() {
            let block = block?;
            if block.is_genesis() {
                continue;
            }
            if block.record().map_or(false, |r| r.address == address) {
                blocks.push(block.decoded());
            }
        }
        Ok(blocks)
    }

    /// The full ordered chain, genesis first.
    pub fn get_chain(&self) -> Result<Vec<Block>, LedgerError> {
        self.scanner().collect()
    }

    /// Lazily iterate the chain in height order.
    pub fn scanner(&self) -> ChainScanner<'_> {
        ChainScanner::new(&self.store)
    }

    /// Like [`BlockChain::scanner`], but cancellable through `cancel`.
    pub fn scanner_with_cancel(&self, cancel: Arc<AtomicBool>) -> ChainScanner<'_> {
        ChainScanner::with_cancel(&self.store, cancel)
    }

    /// Check a single block's hash: recompute the digest over the stored
    /// block with its hash blanked and compare to the stored hash.
    ///
    /// A mismatch is logged and reported as `Ok(false)`: validation is
    /// advisory, not enforcing.
    pub fn validate_block(&self, height: u64) -> Result<bool, LedgerError> {
        let block = self.get_block(height)?;
        let computed = hash_block(&self.hasher, &block)?;
        if block.hash == computed {
            Ok(true)
        } else {
            warn!(height, stored = %block.hash, computed = %computed, "block hash mismatch");
            Ok(false)
        }
    }

    /// Audit the whole chain in a single pass.
    ///
    /// For every block the stored hash is recomputed and compared, and for
    /// every adjacent pair the hash link is checked. Findings accumulate into
    /// the returned report; this never aborts on a finding and never repairs
    /// anything.
    pub fn validate_chain(&self) -> Result<ValidationReport, LedgerError> {
        let mut faults = Vec::new();
        let mut previous_hash: Option<String> = None;
        let mut expected_height = 0u64;

        for block in self.scanner() {
            let block = block?;

            if block.height != expected_height {
                faults.push(ChainFault {
                    height: block.height,
                    kind: FaultKind::HeightGap,
                });
                expected_height = block.height;
            }

            let computed = hash_block(&self.hasher, &block)?;
            if computed != block.hash {
                warn!(height = block.height, "block hash mismatch");
                faults.push(ChainFault {
                    height: block.height,
                    kind: FaultKind::HashMismatch,
                });
            }

            match &previous_hash {
                None => {
                    if block.height == 0 && !block.previous_block_hash.is_empty() {
                        faults.push(ChainFault {
                            height: 0,
                            kind: FaultKind::BrokenLink,
                        });
                    }
                }
                Some(parent_hash) => {
                    if block.previous_block_hash != *parent_hash {
                        warn!(height = block.height, "hash link mismatch");
                        faults.push(ChainFault {
                            height: block.height,
                            kind: FaultKind::BrokenLink,
                        });
                    }
                }
            }

            previous_hash = Some(block.hash.clone());
            expected_height += 1;
        }

        Ok(ValidationReport { faults })
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Result of a whole-chain audit. Empty faults = untampered chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub faults: Vec<ChainFault>,
}

impl ValidationReport {
    /// Returns `true` if the audit found nothing.
    pub fn is_valid(&self) -> bool {
        self.faults.is_empty()
    }

    /// Sorted, deduplicated heights with at least one fault.
    pub fn offending_heights(&self) -> Vec<u64> {
        let mut heights: Vec<u64> = self.faults.iter().map(|f| f.height).collect();
        heights.sort_unstable();
        heights.dedup();
        heights
    }
}

/// A specific integrity fault found at a height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainFault {
    pub height: u64,
    pub kind: FaultKind,
}

/// The independently reportable failure kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The stored hash does not match the recomputed canonical digest.
    HashMismatch,
    /// `previous_block_hash` does not match the parent's stored hash
    /// (attributed to the child; a genesis block with a non-empty previous
    /// hash reports at height 0).
    BrokenLink,
    /// The stored height breaks the contiguous sequence.
    HeightGap,
}
