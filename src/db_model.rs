//! Database configuration models for the ledger's embedded backends.
//!
//! Configuration structures for creating the sled database the ledger
//! persists to, plus a RocksDB equivalent behind the `rocks` feature.
//!
//! # Presets
//!
//! - [`SledDbModel::high_performance()`]: large cache, periodic background
//!   flush
//! - [`SledDbModel::high_durability()`]: flush after every write, compression
//! - [`SledDbModel::temporary()`]: database deleted on close (tests)
//!
//! # Example
//!
//! ```no_run
//! use libledger::db_model::{FlushMode, SledDbModel};
//!
//! # fn example() -> Result<(), sled::Error> {
//! // Use a preset configuration
//! let db = SledDbModel::high_durability("/path/to/db").open()?;
//!
//! // Or customize settings
//! let db = SledDbModel::new("/path/to/db")
//!     .with_cache_capacity_mb(256)
//!     .with_flush_mode(FlushMode::Auto)
//!     .with_compression(3)
//!     .open()?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Flush mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlushMode {
    /// Flush periodically in the background (balanced durability/performance)
    Auto,

    /// Flush after every write operation (maximum durability, lowest
    /// performance). Honored by [`SledStore`](crate::store::SledStore),
    /// which flushes synchronously after each put.
    EveryOp,

    /// Never flush automatically (maximum performance, data may be lost on
    /// crash)
    Never,
}

/// Space/throughput trade-off for sled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SledMode {
    LowSpace,
    HighThroughput,
}

/// Configuration structure for creating a sled database instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SledDbModel {
    /// Path to the database directory
    pub path: PathBuf,

    /// Read cache size in bytes (`None` = sled default)
    pub cache_capacity: Option<u64>,

    /// When data reaches disk
    pub flush_mode: FlushMode,

    /// Background flush interval for [`FlushMode::Auto`], in milliseconds
    pub flush_interval_ms: Option<u64>,

    /// Zstd-compress stored values
    pub use_compression: bool,

    /// Compression level (1-22), when compression is enabled
    pub compression_factor: Option<i32>,

    /// Delete the database when the last handle drops
    pub temporary: bool,

    /// Space/throughput trade-off
    pub mode: SledMode,
}

impl SledDbModel {
    /// Create a configuration with balanced defaults at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_capacity: None,
            flush_mode: FlushMode::Auto,
            flush_interval_ms: Some(500),
            use_compression: false,
            compression_factor: None,
            temporary: false,
            mode: SledMode::LowSpace,
        }
    }

    /// Create a high-performance configuration (less durable).
    pub fn high_performance(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_capacity: Some(1024 * 1024 * 1024), // 1 GB
            flush_interval_ms: Some(1000),
            mode: SledMode::HighThroughput,
            ..Self::new(path)
        }
    }

    /// Create a high-durability configuration (slower performance).
    ///
    /// Every write is flushed before the put returns; an append that was
    /// acknowledged survives a crash.
    pub fn high_durability(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_capacity: Some(256 * 1024 * 1024), // 256 MB
            flush_mode: FlushMode::EveryOp,
            use_compression: true,
            compression_factor: Some(3),
            ..Self::new(path)
        }
    }

    /// Create a configuration for a throwaway database, deleted on close.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::new("")
        }
    }

    /// Open a sled database with this configuration.
    pub fn open(&self) -> Result<sled::Db, sled::Error> {
        let mut config = sled::Config::new()
            .temporary(self.temporary)
            .use_compression(self.use_compression)
            .mode(match self.mode {
                SledMode::LowSpace => sled::Mode::LowSpace,
                SledMode::HighThroughput => sled::Mode::HighThroughput,
            })
            .flush_every_ms(match self.flush_mode {
                FlushMode::Auto => Some(self.flush_interval_ms.unwrap_or(500)),
                // EveryOp flushes synchronously at the store layer.
                FlushMode::EveryOp | FlushMode::Never => None,
            });

        if !self.temporary {
            config = config.path(&self.path);
        }
        if let Some(capacity) = self.cache_capacity {
            config = config.cache_capacity(capacity);
        }
        if let Some(factor) = self.compression_factor {
            config = config.compression_factor(factor);
        }

        config.open()
    }

    // ===== Builder Pattern Methods =====

    /// Set the database path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set read cache size in bytes
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = Some(bytes);
        self
    }

    /// Set read cache size in megabytes
    pub fn with_cache_capacity_mb(mut self, megabytes: u64) -> Self {
        self.cache_capacity = Some(megabytes * 1024 * 1024);
        self
    }

    /// Set the flush mode
    pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    /// Set the background flush interval in milliseconds
    pub fn with_flush_interval_ms(mut self, interval: u64) -> Self {
        self.flush_interval_ms = Some(interval);
        self
    }

    /// Enable compression at the given level
    pub fn with_compression(mut self, factor: i32) -> Self {
        self.use_compression = true;
        self.compression_factor = Some(factor);
        self
    }

    /// Set the space/throughput mode
    pub fn with_mode(mut self, mode: SledMode) -> Self {
        self.mode = mode;
        self
    }

    /// Delete the database when the last handle drops
    pub fn as_temporary(mut self) -> Self {
        self.temporary = true;
        self
    }
}

/// Compression types supported by RocksDB
#[cfg(feature = "rocks")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    Snappy,
    Lz4,
    Zstd,
}

#[cfg(feature = "rocks")]
impl From<CompressionType> for rocksdb::DBCompressionType {
    fn from(compression: CompressionType) -> Self {
        match compression {
            CompressionType::None => rocksdb::DBCompressionType::None,
            CompressionType::Snappy => rocksdb::DBCompressionType::Snappy,
            CompressionType::Lz4 => rocksdb::DBCompressionType::Lz4,
            CompressionType::Zstd => rocksdb::DBCompressionType::Zstd,
        }
    }
}

/// Configuration structure for creating a RocksDB database instance.
#[cfg(feature = "rocks")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbModel {
    /// Path to the database directory
    pub path: PathBuf,

    /// Create the database directory if it doesn't exist
    pub create_if_missing: bool,

    /// Block cache size in bytes (read cache)
    pub block_cache_size: Option<usize>,

    /// Write buffer (memtable) size in bytes
    pub write_buffer_size: Option<usize>,

    /// Compression type for data blocks
    pub compression_type: CompressionType,

    /// Sync writes to disk (slower but safer)
    pub sync_writes: bool,

    /// Column families to create/open
    pub column_families: Vec<String>,
}

#[cfg(feature = "rocks")]
impl RocksDbModel {
    /// Create a configuration with balanced defaults at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            block_cache_size: Some(256 * 1024 * 1024), // 256 MB
            write_buffer_size: Some(64 * 1024 * 1024), // 64 MB
            compression_type: CompressionType::Lz4,
            sync_writes: false,
            column_families: vec![
                "default".to_string(),
                crate::store::BLOCKS_TREE.to_string(),
            ],
        }
    }

    /// Create a high-performance configuration (less durable).
    pub fn high_performance(path: impl Into<PathBuf>) -> Self {
        Self {
            block_cache_size: Some(1024 * 1024 * 1024), // 1 GB
            write_buffer_size: Some(128 * 1024 * 1024), // 128 MB
            ..Self::new(path)
        }
    }

    /// Create a high-durability configuration (slower performance).
    pub fn high_durability(path: impl Into<PathBuf>) -> Self {
        Self {
            compression_type: CompressionType::Zstd,
            sync_writes: true,
            ..Self::new(path)
        }
    }

    /// Open a RocksDB database with this configuration.
    pub fn open(&self) -> Result<rocksdb::DB, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(self.create_if_missing);
        opts.create_missing_column_families(true);

        if let Some(cache_size) = self.block_cache_size {
            let cache = rocksdb::Cache::new_lru_cache(cache_size);
            let mut block_opts = rocksdb::BlockBasedOptions::default();
            block_opts.set_block_cache(&cache);
            opts.set_block_based_table_factory(&block_opts);
        }
        if let Some(buffer_size) = self.write_buffer_size {
            opts.set_write_buffer_size(buffer_size);
        }
        opts.set_compression_type(self.compression_type.into());

        rocksdb::DB::open_cf(&opts, &self.path, &self.column_families)
    }

    /// Set block cache size in megabytes
    pub fn with_block_cache_size_mb(mut self, megabytes: usize) -> Self {
        self.block_cache_size = Some(megabytes * 1024 * 1024);
        self
    }

    /// Set compression type
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression_type = compression;
        self
    }

    /// Add a column family
    pub fn with_column_family(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.column_families.contains(&name) {
            self.column_families.push(name);
        }
        self
    }
}
