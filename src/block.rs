//! Block structures for the ledger.
//!
//! This module defines the ledger entry entity:
//! - `Block`: one immutable ledger entry (metadata + payload)
//! - `BlockBody`: the opaque payload, either a structured record or a
//!   free-form note (the genesis block uses a note)
//! - `RecordBody`: the documented record kind, an owner address plus a
//!   hex-encoded content field
//!
//! Blocks are linked through `previous_block_hash` to form a tamper-evident
//! chain. A block's hash is computed over its canonical form: the block
//! serialized with the `hash` field blanked (see [`crate::hasher`]).
//!
//! # Persisted layout
//!
//! Each store value is the block serialized as JSON with all five fields
//! present. The record `content` field is hex-encoded at rest so arbitrary
//! text stays safely printable inside the stored byte stream; it is decoded
//! back to text only at read time, for non-genesis blocks.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// One immutable ledger entry.
///
/// A `Block` enters the system as a bare payload; the
/// [`BlockChain`](crate::blockchain::BlockChain) service completes it
/// (height, timestamp, previous hash, hash) and persists it exactly once.
/// It is never mutated again.
///
/// Serde serializes struct fields in declaration order, so the JSON form of
/// a block is deterministic. The field order below is therefore part of the
/// hashing contract and must not be reordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain; unique, contiguous, zero-based.
    pub height: u64,

    /// Hex-encoded digest of the canonical form. Empty only transiently,
    /// before the service computes it.
    pub hash: String,

    /// Hash of the block at `height - 1`; empty string only for genesis.
    pub previous_block_hash: String,

    /// Seconds since the Unix epoch, assigned at persist time.
    pub timestamp: u64,

    /// Application payload.
    pub body: BlockBody,
}

impl Block {
    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Serialize the canonical form used as hashing input: this block with
    /// the `hash` field blanked and any presentation-only state stripped.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let mut canonical = self.clone();
        canonical.hash = String::new();
        if let BlockBody::Record(record) = &mut canonical.body {
            record.content_decoded = None;
        }
        Ok(serde_json::to_vec(&canonical)?)
    }

    /// Read-time presentation transform: for non-genesis record blocks, fill
    /// in the decoded view of the content field. The stored form is not
    /// affected; undecodable content simply stays undecoded.
    pub fn decoded(mut self) -> Self {
        if !self.is_genesis() {
            if let BlockBody::Record(record) = &mut self.body {
                record.content_decoded = record.decode_content().ok();
            }
        }
        self
    }

    /// The record payload, if this block carries one.
    pub fn record(&self) -> Option<&RecordBody> {
        match &self.body {
            BlockBody::Record(record) => Some(record),
            BlockBody::Note(_) => None,
        }
    }
}

/// Opaque block payload.
///
/// The ledger itself never interprets the payload beyond the documented
/// record schema; filtering and decoding are read-time concerns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockBody {
    /// The documented record kind: owner address + hex-encoded content.
    Record(RecordBody),
    /// Free-form text. The genesis block uses this variant.
    Note(String),
}

impl From<RecordBody> for BlockBody {
    fn from(record: RecordBody) -> Self {
        BlockBody::Record(record)
    }
}

impl From<String> for BlockBody {
    fn from(note: String) -> Self {
        BlockBody::Note(note)
    }
}

impl From<&str> for BlockBody {
    fn from(note: &str) -> Self {
        BlockBody::Note(note.to_owned())
    }
}

/// Owner-attributed record payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBody {
    /// Owner identifier the record is registered under.
    pub address: String,

    /// Hex-encoded content bytes.
    pub content: String,

    /// Decoded view of `content`, filled at read time for presentation.
    /// Never persisted and never part of the canonical (hashed) form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_decoded: Option<String>,
}

impl RecordBody {
    /// Build a record, hex-encoding the content bytes for storage.
    pub fn new(address: impl Into<String>, content: impl AsRef<[u8]>) -> Self {
        Self {
            address: address.into(),
            content: hex::encode(content.as_ref()),
            content_decoded: None,
        }
    }

    /// Decode the stored content back into displayable text.
    pub fn decode_content(&self) -> Result<String, LedgerError> {
        let bytes = hex::decode(&self.content)
            .map_err(|e| LedgerError::Codec(format!("content is not valid hex: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| LedgerError::Codec(format!("content is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            height: 3,
            hash: "abc123".to_owned(),
            previous_block_hash: "def456".to_owned(),
            timestamp: 1_700_000_000,
            body: RecordBody::new("1A2b3C", "hello").into(),
        }
    }

    #[test]
    fn record_content_round_trips_through_hex() {
        let record = RecordBody::new("owner", "a star story");
        assert_eq!(record.content, hex::encode("a star story"));
        assert_eq!(record.decode_content().unwrap(), "a star story");
    }

    #[test]
    fn decode_rejects_invalid_hex() {
        let record = RecordBody {
            address: "owner".to_owned(),
            content: "not hex!".to_owned(),
            content_decoded: None,
        };
        assert!(matches!(record.decode_content(), Err(LedgerError::Codec(_))));
    }

    #[test]
    fn body_serde_is_untagged() {
        let note: BlockBody = "First block in the chain - Genesis block".into();
        let json = serde_json::to_string(&note).unwrap();
        assert_eq!(json, "\"First block in the chain - Genesis block\"");

        let record: BlockBody = RecordBody::new("owner", "x").into();
        let json = serde_json::to_string(&record).unwrap();
        let back: BlockBody = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn canonical_form_blanks_the_hash_field() {
        let block = sample_block();
        let canonical = String::from_utf8(block.canonical_bytes().unwrap()).unwrap();
        assert!(canonical.contains("\"hash\":\"\""));
        assert!(canonical.contains("\"previous_block_hash\":\"def456\""));
    }

    #[test]
    fn canonical_form_ignores_presentation_state() {
        let block = sample_block();
        let decorated = block.clone().decoded();
        assert!(decorated.record().unwrap().content_decoded.is_some());
        assert_eq!(
            block.canonical_bytes().unwrap(),
            decorated.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn genesis_blocks_are_not_decorated() {
        let genesis = Block {
            height: 0,
            hash: "h".to_owned(),
            previous_block_hash: String::new(),
            timestamp: 0,
            body: "First block in the chain - Genesis block".into(),
        };
        assert!(genesis.is_genesis());
        let decoded = genesis.clone().decoded();
        assert_eq!(decoded, genesis);
    }

    #[test]
    fn stored_form_round_trips() {
        let block = sample_block();
        let bytes = serde_json::to_vec(&block).unwrap();
        let back: Block = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, block);
    }
}
