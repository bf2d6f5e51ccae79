//! Digest computation over blocks.
//!
//! A block's hash is the hex-encoded digest of its canonical form: the block
//! serialized in a fixed, stable field order with the `hash` field forced to
//! the empty string. Determinism is a correctness contract: the canonical
//! form never depends on ambient map or iteration order.

use sha2::{Digest, Sha256};

use crate::block::Block;
use crate::error::LedgerError;

/// Trait for hashing operations in the ledger.
///
/// Implement this trait to use a custom digest algorithm (SHA3, BLAKE3, etc.)
/// with the [`BlockChain`](crate::blockchain::BlockChain) service. The
/// default is [`Sha256Hasher`].
pub trait BlockHasher: Send + Sync {
    /// Compute the digest of the given data.
    ///
    /// The returned vector's length must match `digest_size()`.
    fn digest(&self, data: &[u8]) -> Vec<u8>;

    /// Size of digests produced by this hasher, in bytes.
    fn digest_size(&self) -> usize;
}

/// SHA-256 hasher, the ledger's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl BlockHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn digest_size(&self) -> usize {
        32
    }
}

/// Compute a block's hash: canonical form, digested, hex-encoded.
///
/// The block's current `hash` field is irrelevant (the canonical form blanks
/// it), so this works both for completing a fresh block and for re-checking a
/// stored one.
pub fn hash_block<H: BlockHasher>(hasher: &H, block: &Block) -> Result<String, LedgerError> {
    let canonical = block.canonical_bytes()?;
    Ok(hex::encode(hasher.digest(&canonical)))
}
