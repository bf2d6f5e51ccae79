//! Ordered iteration over the persisted chain.
//!
//! [`ChainScanner`] is a thin abstraction over the store's full-scan
//! capability: a lazily-evaluated, finite, one-shot sequence of decoded
//! blocks in ascending height order. Filtering operations compose standard
//! `Iterator` adapters on top, so a by-hash lookup stops at the first match
//! without materializing the whole ledger.
//!
//! The scanner fuses after the first fault: a store error mid-stream or an
//! undecodable value ends the iteration. Long scans can be cancelled
//! cooperatively through a shared flag checked between iteration steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::block::Block;
use crate::error::LedgerError;
use crate::store::{BlockStore, StoreIter};

/// Lazy one-shot iterator of decoded blocks, ascending by height.
pub struct ChainScanner<'a> {
    entries: StoreIter<'a>,
    cancel: Option<Arc<AtomicBool>>,
    done: bool,
}

impl<'a> ChainScanner<'a> {
    /// Scan all blocks in `store`.
    pub fn new(store: &'a dyn BlockStore) -> Self {
        Self {
            entries: store.iter(),
            cancel: None,
            done: false,
        }
    }

    /// Scan with a cancellation flag. Once the flag is set, the next
    /// iteration step yields [`LedgerError::Cancelled`] and the scanner is
    /// exhausted.
    pub fn with_cancel(store: &'a dyn BlockStore, cancel: Arc<AtomicBool>) -> Self {
        Self {
            entries: store.iter(),
            cancel: Some(cancel),
            done: false,
        }
    }
}

impl Iterator for ChainScanner<'_> {
    type Item = Result<Block, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                self.done = true;
                return Some(Err(LedgerError::Cancelled));
            }
        }
        match self.entries.next()? {
            Ok((height, bytes)) => match serde_json::from_slice::<Block>(&bytes) {
                Ok(block) => Some(Ok(block)),
                Err(e) => {
                    self.done = true;
                    Some(Err(LedgerError::Codec(format!(
                        "undecodable block at height {height}: {e}"
                    ))))
                }
            },
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::RecordBody;
    use crate::store::MemoryStore;

    fn seed_store(count: u64) -> MemoryStore {
        let store = MemoryStore::new();
        for height in 0..count {
            let block = Block {
                height,
                hash: format!("hash-{height}"),
                previous_block_hash: if height == 0 {
                    String::new()
                } else {
                    format!("hash-{}", height - 1)
                },
                timestamp: 1_700_000_000 + height,
                body: RecordBody::new("owner", "payload").into(),
            };
            store
                .put(height, &serde_json::to_vec(&block).unwrap())
                .unwrap();
        }
        store
    }

    #[test]
    fn yields_blocks_in_ascending_height_order() {
        let store = seed_store(5);
        let heights: Vec<u64> = ChainScanner::new(&store)
            .map(|b| b.unwrap().height)
            .collect();
        assert_eq!(heights, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_store_yields_nothing() {
        let store = MemoryStore::new();
        assert_eq!(ChainScanner::new(&store).count(), 0);
    }

    #[test]
    fn supports_early_termination() {
        let store = seed_store(100);
        let found = ChainScanner::new(&store)
            .find(|b| matches!(b, Ok(block) if block.height == 3));
        assert!(found.is_some());
    }

    #[test]
    fn fuses_after_an_undecodable_value() {
        let store = seed_store(3);
        store.put(1, b"not json").unwrap();
        let mut scanner = ChainScanner::new(&store);
        assert!(scanner.next().unwrap().is_ok());
        assert!(matches!(
            scanner.next(),
            Some(Err(LedgerError::Codec(_)))
        ));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn cancellation_ends_the_scan() {
        let store = seed_store(10);
        let cancel = Arc::new(AtomicBool::new(false));
        let mut scanner = ChainScanner::with_cancel(&store, cancel.clone());
        assert!(scanner.next().unwrap().is_ok());
        cancel.store(true, Ordering::Relaxed);
        assert!(matches!(scanner.next(), Some(Err(LedgerError::Cancelled))));
        assert!(scanner.next().is_none());
    }
}
