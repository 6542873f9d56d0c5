//! Sled-backed Persistent Event Indexer
//!
//! Events are keyed by a monotonically increasing sequence number so a tree
//! scan yields emission order. Secondary indices map token, block height and
//! event type to that sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use super::events::{EventIndexer, LaunchpadEvent};
use crate::errors::IndexerError;
use crate::primitives::TokenId;

/// Sled-backed persistent event indexer
#[derive(Debug)]
pub struct SledEventIndexer {
    _db: sled::Db,
    events: sled::Tree,
    token_index: sled::Tree,
    block_index: sled::Tree,
    type_index: sled::Tree,
    meta: sled::Tree,
    next_seq: AtomicU64,
}

const TREE_EVENTS: &str = "launchpad_events";
const TREE_TOKEN_INDEX: &str = "lp_events_token_idx";
const TREE_BLOCK_INDEX: &str = "lp_events_block_idx";
const TREE_TYPE_INDEX: &str = "lp_events_type_idx";
const TREE_META: &str = "lp_events_meta";
const KEY_NEXT_SEQ: &str = "next_seq";

impl SledEventIndexer {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, sled::Error> {
        let events = db.open_tree(TREE_EVENTS)?;
        let token_index = db.open_tree(TREE_TOKEN_INDEX)?;
        let block_index = db.open_tree(TREE_BLOCK_INDEX)?;
        let type_index = db.open_tree(TREE_TYPE_INDEX)?;
        let meta = db.open_tree(TREE_META)?;

        let next_seq = meta
            .get(KEY_NEXT_SEQ)?
            .map(|v| {
                let bytes: [u8; 8] = v.as_ref().try_into().unwrap_or([0u8; 8]);
                u64::from_be_bytes(bytes)
            })
            .unwrap_or(0);

        Ok(Self {
            _db: db,
            events,
            token_index,
            block_index,
            type_index,
            meta,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    pub fn flush(&self) -> Result<(), sled::Error> {
        self.events.flush()?;
        self.token_index.flush()?;
        self.block_index.flush()?;
        self.type_index.flush()?;
        self.meta.flush()?;
        Ok(())
    }

    /// Events of one type for a token, in emission order
    pub fn token_events_by_type(&self, token_id: &TokenId, event_type: &str) -> Vec<LaunchpadEvent> {
        let prefix = type_prefix(event_type);
        self.collect_indexed(&self.type_index, prefix.as_slice(), "type")
            .into_iter()
            .filter(|e| e.token_id() == token_id)
            .collect()
    }

    fn store(&self, event: &LaunchpadEvent) -> Result<(), IndexerError> {
        let serialized = bincode::serialize(event)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let seq_key = seq.to_be_bytes();

        self.events.insert(seq_key, serialized)?;
        self.meta.insert(KEY_NEXT_SEQ, &(seq + 1).to_be_bytes()[..])?;

        let mut token_key = event.token_id().as_bytes().to_vec();
        token_key.extend_from_slice(&seq_key);
        self.token_index.insert(token_key, &seq_key[..])?;

        let mut block_key = event.block_height().to_be_bytes().to_vec();
        block_key.extend_from_slice(&seq_key);
        self.block_index.insert(block_key, &seq_key[..])?;

        let mut type_key = type_prefix(event.event_type());
        type_key.extend_from_slice(&seq_key);
        self.type_index.insert(type_key, &seq_key[..])?;

        Ok(())
    }

    fn load(&self, seq_key: &[u8]) -> Option<LaunchpadEvent> {
        match self.events.get(seq_key) {
            Ok(Some(data)) => match bincode::deserialize::<LaunchpadEvent>(&data) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::error!("Failed to decode event: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to read event: {}", e);
                None
            }
        }
    }

    fn collect_indexed(&self, index: &sled::Tree, prefix: &[u8], name: &str) -> Vec<LaunchpadEvent> {
        let mut events = Vec::new();
        for result in index.scan_prefix(prefix) {
            match result {
                Ok((_, seq_key)) => events.extend(self.load(&seq_key)),
                Err(e) => tracing::error!("Error reading {} index: {}", name, e),
            }
        }
        events
    }
}

fn type_prefix(event_type: &str) -> Vec<u8> {
    let mut prefix = event_type.as_bytes().to_vec();
    prefix.push(b'/');
    prefix
}

impl EventIndexer for SledEventIndexer {
    fn index_event(&mut self, event: LaunchpadEvent) -> Result<(), IndexerError> {
        self.store(&event)
    }

    fn token_events(&self, token_id: &TokenId) -> Vec<LaunchpadEvent> {
        self.collect_indexed(&self.token_index, token_id.as_bytes(), "token")
    }

    fn events_in_range(&self, start_block: u64, end_block: u64) -> Vec<LaunchpadEvent> {
        if start_block > end_block {
            return Vec::new();
        }
        let start = start_block.to_be_bytes().to_vec();
        let mut events = Vec::new();
        for result in self.block_index.range(start..) {
            match result {
                Ok((key, seq_key)) => {
                    let mut height = [0u8; 8];
                    height.copy_from_slice(&key[..8]);
                    if u64::from_be_bytes(height) > end_block {
                        break;
                    }
                    events.extend(self.load(&seq_key));
                }
                Err(e) => tracing::error!("Error reading block index: {}", e),
            }
        }
        events
    }

    fn latest_event(&self, token_id: &TokenId) -> Option<LaunchpadEvent> {
        match self.token_index.scan_prefix(token_id.as_bytes()).next_back() {
            Some(Ok((_, seq_key))) => self.load(&seq_key),
            Some(Err(e)) => {
                tracing::error!("Error reading token index: {}", e);
                None
            }
            None => None,
        }
    }

    fn all_events(&self) -> Vec<LaunchpadEvent> {
        let mut events = Vec::new();
        for result in self.events.iter() {
            match result {
                Ok((_, data)) => match bincode::deserialize::<LaunchpadEvent>(&data) {
                    Ok(event) => events.push(event),
                    Err(e) => tracing::error!("Failed to decode event: {}", e),
                },
                Err(e) => tracing::error!("Error reading events: {}", e),
            }
        }
        events
    }

    fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonding_curve::events::tests::{created_event, trade_event};
    use tempfile::TempDir;

    #[test]
    fn test_sled_event_indexer_basic() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer = SledEventIndexer::open(temp_dir.path()).unwrap();

        let token1 = TokenId([1u8; 32]);
        let token2 = TokenId([2u8; 32]);

        indexer.index_event(created_event(token1, 99)).unwrap();
        indexer.index_event(trade_event(token1, 100)).unwrap();
        indexer.index_event(trade_event(token2, 150)).unwrap();
        indexer.flush().unwrap();

        assert_eq!(indexer.event_count(), 3);
        let token1_events = indexer.token_events(&token1);
        assert_eq!(token1_events.len(), 2);
        assert_eq!(token1_events[0].event_type(), "token_created");
        assert_eq!(indexer.token_events(&token2).len(), 1);
        assert_eq!(indexer.latest_event(&token1).unwrap().block_height(), 100);
    }

    #[test]
    fn test_sled_event_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();
        let token1 = TokenId([1u8; 32]);

        {
            let mut indexer = SledEventIndexer::open(&path).unwrap();
            indexer.index_event(created_event(token1, 100)).unwrap();
            indexer.index_event(trade_event(token1, 101)).unwrap();
            indexer.flush().unwrap();
        }

        {
            let mut indexer = SledEventIndexer::open(&path).unwrap();
            assert_eq!(indexer.token_events(&token1).len(), 2);
            assert_eq!(indexer.token_events_by_type(&token1, "trade").len(), 1);

            // sequence resumes after reopen
            indexer.index_event(trade_event(token1, 102)).unwrap();
            let all = indexer.all_events();
            assert_eq!(all.len(), 3);
            assert_eq!(all[2].block_height(), 102);
        }
    }

    #[test]
    fn test_sled_event_range_query() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer = SledEventIndexer::open(temp_dir.path()).unwrap();
        let token1 = TokenId([1u8; 32]);

        for block in 100..=110 {
            indexer.index_event(trade_event(token1, block)).unwrap();
        }
        indexer.flush().unwrap();

        assert_eq!(indexer.events_in_range(105, 108).len(), 4);
        assert!(indexer.events_in_range(108, 105).is_empty());
        assert!(indexer.events_in_range(200, 300).is_empty());
    }
}
