//! Error taxonomy for the ledger.
//!
//! `StoreError` covers backend faults and is propagated verbatim; the core
//! performs no retries. `LedgerError` is the failure surface of the public
//! `BlockChain` operations. Validation mismatches are never errors; they are
//! reported through booleans and accumulated reports.

/// Fault raised by a [`BlockStore`](crate::store::BlockStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// I/O or backend fault, not further classified.
    #[error("store backend fault: {0}")]
    Backend(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(feature = "rocks")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No block is stored at the requested height.
    #[error("no block at height {0}")]
    BlockNotFound(u64),

    /// A full scan completed without finding a block with the given hash.
    #[error("no block with hash {0}")]
    BlockNotFoundByHash(String),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// A scan was cancelled through its cancellation flag.
    #[error("scan cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Codec(err.to_string())
    }
}
