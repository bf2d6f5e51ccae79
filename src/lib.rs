//! An append-only, hash-linked ledger of opaque records over an embedded
//! key-value store.
//!
//! This library provides the core ledger primitives:
//! - Block structures with cryptographic hashing and hash linkage
//! - Persistent storage behind an injectable [`BlockStore`] trait (sled by
//!   default, RocksDB behind the `rocks` feature, in-memory for tests)
//! - Automatic height derivation and genesis creation
//! - Scanning and filtering over the stored chain
//! - Advisory integrity validation (per-block and whole-chain)
//!
//! # Architecture
//!
//! The ledger is data-agnostic: a block's payload is an opaque
//! [`BlockBody`], with a documented record schema (owner address plus
//! hex-encoded content) for the record kind the filtering operations
//! understand. The [`BlockChain`] service completes and persists blocks; it
//! is the only writer, and appends are serialized internally so every block
//! gets a unique, correctly linked height.
//!
//! # Core Components
//!
//! - [`block`]: `Block`, `BlockBody`, and `RecordBody` structures
//! - [`hasher`]: canonical-form digest computation ([`Sha256Hasher`])
//! - [`store`]: the key-value contract and its backends
//! - [`scanner`]: lazy ordered iteration over the stored chain
//! - [`blockchain`]: the `BlockChain` service
//! - [`db_model`]: database configuration presets
//!
//! # Example
//!
//! ```
//! use libledger::{BlockChain, MemoryStore, RecordBody};
//!
//! # fn main() -> Result<(), libledger::LedgerError> {
//! // Opening an empty store persists the genesis block automatically.
//! let chain = BlockChain::open(MemoryStore::new())?;
//! assert_eq!(chain.height(), Some(0));
//!
//! // Append a record; the ledger completes and links the block.
//! let block = chain.add_block(RecordBody::new("1A2b3C", "hello"))?;
//! assert_eq!(block.previous_block_hash, chain.get_block(0)?.hash);
//!
//! // Query and audit.
//! assert_eq!(chain.get_blocks_by_address("1A2b3C")?.len(), 1);
//! assert!(chain.validate_chain()?.is_valid());
//! # Ok(())
//! # }
//! ```
//!
//! Persistent storage goes through [`SledStore`]:
//!
//! ```no_run
//! use libledger::{BlockChain, RecordBody, SledStore};
//!
//! # fn main() -> Result<(), libledger::LedgerError> {
//! let chain = BlockChain::open(SledStore::open("./ledger_data")?)?;
//! chain.add_block(RecordBody::new("1A2b3C", "a registered record"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Decisions
//!
//! - **Injected storage**: the store is a constructor dependency, so tests
//!   substitute [`MemoryStore`] for the persistent backend
//! - **Encoding-level key ordering**: store keys are `u64` heights encoded
//!   big-endian, so iteration order equals numeric order on every backend
//! - **Serialized writer**: a mutex-held height counter makes appends
//!   atomic; reads and scans stay concurrent
//! - **Advisory validation**: hash and linkage mismatches are reported, never
//!   thrown, and nothing is repaired automatically

pub mod block;
pub mod blockchain;
pub mod db_model;
pub mod error;
pub mod hasher;
pub mod scanner;
pub mod store;

pub use block::{Block, BlockBody, RecordBody};
pub use blockchain::{BlockChain, ChainFault, FaultKind, ValidationReport, GENESIS_NOTE};
pub use db_model::{FlushMode, SledDbModel};
pub use error::{LedgerError, StoreError};
pub use hasher::{BlockHasher, Sha256Hasher};
pub use scanner::ChainScanner;
#[cfg(feature = "rocks")]
pub use store::RocksStore;
pub use store::{BlockStore, MemoryStore, SledStore};
