//! Key-value storage backends for the ledger.
//!
//! The ledger consumes storage through the [`BlockStore`] trait: put, get,
//! and an ordered full-scan iteration. Keys are block heights, typed as `u64`
//! at the trait boundary so ascending iteration order equals numeric order as
//! an encoding-level guarantee: every backend stores heights as fixed-width
//! big-endian bytes, never as decimal strings (which would sort height "10"
//! before height "2").
//!
//! Backends:
//! - [`SledStore`]: persistent storage in a sled tree
//! - [`MemoryStore`]: in-memory fake for tests and embedding
//! - `RocksStore` (feature `rocks`): persistent storage in a RocksDB column
//!   family

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use crate::db_model::{FlushMode, SledDbModel};
use crate::error::StoreError;

/// Tree / column family holding blocks, keyed by big-endian height.
pub const BLOCKS_TREE: &str = "blocks";

/// One-shot ordered iteration over a store's `(height, value)` entries.
pub type StoreIter<'a> = Box<dyn Iterator<Item = Result<(u64, Vec<u8>), StoreError>> + 'a>;

/// Durable mapping from block height to serialized block bytes.
///
/// Iteration is ascending by height, finite, and may fail mid-stream with a
/// [`StoreError`] on an I/O fault.
pub trait BlockStore: Send + Sync {
    /// Persist `value` under `height`, replacing any existing entry.
    fn put(&self, height: u64, value: &[u8]) -> Result<(), StoreError>;

    /// Fetch the value at `height`, or `None` if the key is absent.
    fn get(&self, height: u64) -> Result<Option<Vec<u8>>, StoreError>;

    /// Iterate all entries in ascending height order.
    fn iter(&self) -> StoreIter<'_>;
}

fn decode_height(key: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StoreError::Backend(format!("malformed height key ({} bytes)", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Sled-backed block store.
///
/// Heights are stored as `u64::to_be_bytes`, so sled's lexicographic key
/// order is numeric height order. When opened from a model with
/// [`FlushMode::EveryOp`], every put flushes to disk before returning.
pub struct SledStore {
    tree: sled::Tree,
    flush_on_write: bool,
}

impl SledStore {
    /// Open (or create) a store at `path` with the durability-oriented
    /// defaults of [`SledDbModel::high_durability`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_model(SledDbModel::high_durability(path.as_ref()))
    }

    /// Open a store from an explicit configuration model.
    pub fn with_model(model: SledDbModel) -> Result<Self, StoreError> {
        let flush_on_write = model.flush_mode == FlushMode::EveryOp;
        let db = model.open()?;
        let tree = db.open_tree(BLOCKS_TREE)?;
        Ok(Self {
            tree,
            flush_on_write,
        })
    }

    /// Open a temporary store that is deleted when dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::with_model(SledDbModel::temporary())
    }
}

impl BlockStore for SledStore {
    fn put(&self, height: u64, value: &[u8]) -> Result<(), StoreError> {
        self.tree.insert(height.to_be_bytes(), value)?;
        if self.flush_on_write {
            self.tree.flush()?;
        }
        Ok(())
    }

    fn get(&self, height: u64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tree
            .get(height.to_be_bytes())?
            .map(|value| value.to_vec()))
    }

    fn iter(&self) -> StoreIter<'_> {
        Box::new(
            self.tree
                .iter()
                .map(|entry| -> Result<(u64, Vec<u8>), StoreError> {
                    let (key, value) = entry?;
                    Ok((decode_height(&key)?, value.to_vec()))
                }),
        )
    }
}

/// In-memory block store for tests, local demos, and embedding.
///
/// `iter` yields a point-in-time snapshot; entries put after the iterator is
/// created are not observed by it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<u64, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryStore {
    fn put(&self, height: u64, value: &[u8]) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?;
        inner.insert(height, value.to_vec());
        Ok(())
    }

    fn get(&self, height: u64) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?;
        Ok(inner.get(&height).cloned())
    }

    fn iter(&self) -> StoreIter<'_> {
        let snapshot: Vec<(u64, Vec<u8>)> = match self.inner.read() {
            Ok(inner) => inner.iter().map(|(h, v)| (*h, v.clone())).collect(),
            Err(_) => {
                return Box::new(std::iter::once(Err(StoreError::Backend(
                    "memory store lock poisoned".into(),
                ))))
            }
        };
        Box::new(snapshot.into_iter().map(Ok))
    }
}

/// RocksDB-backed block store.
#[cfg(feature = "rocks")]
pub struct RocksStore {
    db: rocksdb::DB,
}

#[cfg(feature = "rocks")]
impl RocksStore {
    /// Open (or create) a store at `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_model(crate::db_model::RocksDbModel::new(path.as_ref()))
    }

    /// Open a store from an explicit configuration model.
    pub fn with_model(model: crate::db_model::RocksDbModel) -> Result<Self, StoreError> {
        let db = model.open()?;
        Ok(Self { db })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(BLOCKS_TREE)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {BLOCKS_TREE:?}")))
    }
}

#[cfg(feature = "rocks")]
impl BlockStore for RocksStore {
    fn put(&self, height: u64, value: &[u8]) -> Result<(), StoreError> {
        self.db.put_cf(self.cf()?, height.to_be_bytes(), value)?;
        Ok(())
    }

    fn get(&self, height: u64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get_cf(self.cf()?, height.to_be_bytes())?)
    }

    fn iter(&self) -> StoreIter<'_> {
        let cf = match self.cf() {
            Ok(cf) => cf,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };
        Box::new(
            self.db
                .iterator_cf(cf, rocksdb::IteratorMode::Start)
                .map(|entry| -> Result<(u64, Vec<u8>), StoreError> {
                    let (key, value) = entry.map_err(StoreError::from)?;
                    Ok((decode_height(&key)?, value.to_vec()))
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_ordering(store: &dyn BlockStore) {
        // Insert out of order, past the single-digit range where a decimal
        // string encoding would still happen to sort correctly.
        for height in [11u64, 2, 0, 10, 7, 1, 12, 3] {
            store
                .put(height, format!("value-{height}").as_bytes())
                .unwrap();
        }
        let heights: Vec<u64> = store
            .iter()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(heights, vec![0, 1, 2, 3, 7, 10, 11, 12]);
    }

    #[test]
    fn memory_store_put_get() {
        let store = MemoryStore::new();
        assert_eq!(store.get(0).unwrap(), None);
        store.put(0, b"genesis").unwrap();
        assert_eq!(store.get(0).unwrap(), Some(b"genesis".to_vec()));
    }

    #[test]
    fn memory_store_iterates_in_numeric_order() {
        let store = MemoryStore::new();
        exercise_ordering(&store);
    }

    #[test]
    fn memory_store_iter_is_a_snapshot() {
        let store = MemoryStore::new();
        store.put(0, b"a").unwrap();
        let iter = store.iter();
        store.put(1, b"b").unwrap();
        assert_eq!(iter.count(), 1);
    }

    #[test]
    fn sled_store_put_get() {
        let store = SledStore::temporary().unwrap();
        assert_eq!(store.get(5).unwrap(), None);
        store.put(5, b"five").unwrap();
        assert_eq!(store.get(5).unwrap(), Some(b"five".to_vec()));
    }

    #[test]
    fn sled_store_iterates_in_numeric_order() {
        let store = SledStore::temporary().unwrap();
        exercise_ordering(&store);
    }

    #[test]
    fn sled_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            store.put(0, b"durable").unwrap();
        }
        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.get(0).unwrap(), Some(b"durable".to_vec()));
    }

    #[cfg(feature = "rocks")]
    #[test]
    fn rocks_store_iterates_in_numeric_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        exercise_ordering(&store);
    }
}
