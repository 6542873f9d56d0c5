//! Launchpad Events
//!
//! Every committed state change emits an event for indexing.
//! Events are appended only after the owning operation commits, so the log
//! never contains an effect that was rolled back.

use serde::{Deserialize, Serialize};

use super::types::{CurveKind, GraduationRecord, Trade};
use crate::errors::IndexerError;
use crate::primitives::{Address, LockId, PairId, TokenId};

/// Launchpad events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LaunchpadEvent {
    /// Token created and creation fee collected
    TokenCreated {
        token_id: TokenId,
        creator: Address,
        name: String,
        symbol: String,
        curve_kind: CurveKind,
        initial_price: u128,
        royalty_bps: u16,
        creation_fee: u128,
        block_height: u64,
        timestamp: u64,
    },

    /// Buy or sell executed against the curve
    Trade {
        token_id: TokenId,
        trade: Trade,
        block_height: u64,
        timestamp: u64,
    },

    /// Token graduated and its liquidity migrated
    Graduated {
        token_id: TokenId,
        /// Supply frozen at graduation
        final_supply: u128,
        record: GraduationRecord,
    },

    /// Vault share of the pool registered with the lock vault
    LiquidityLocked {
        token_id: TokenId,
        lock_id: LockId,
        pair_id: PairId,
        amount: u128,
        unlock_time: u64,
        block_height: u64,
        timestamp: u64,
    },
}

impl LaunchpadEvent {
    /// Get the token ID associated with this event
    pub fn token_id(&self) -> &TokenId {
        match self {
            LaunchpadEvent::TokenCreated { token_id, .. } => token_id,
            LaunchpadEvent::Trade { token_id, .. } => token_id,
            LaunchpadEvent::Graduated { token_id, .. } => token_id,
            LaunchpadEvent::LiquidityLocked { token_id, .. } => token_id,
        }
    }

    /// Get the block height for this event
    pub fn block_height(&self) -> u64 {
        match self {
            LaunchpadEvent::TokenCreated { block_height, .. } => *block_height,
            LaunchpadEvent::Trade { block_height, .. } => *block_height,
            LaunchpadEvent::Graduated { record, .. } => record.block_height,
            LaunchpadEvent::LiquidityLocked { block_height, .. } => *block_height,
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            LaunchpadEvent::TokenCreated { .. } => "token_created",
            LaunchpadEvent::Trade { .. } => "trade",
            LaunchpadEvent::Graduated { .. } => "graduated",
            LaunchpadEvent::LiquidityLocked { .. } => "liquidity_locked",
        }
    }
}

/// Event indexer interface
///
/// Implement this to index launchpad events for audit and replay.
pub trait EventIndexer: Send {
    /// Append a new event; an error means the event is not in the log
    fn index_event(&mut self, event: LaunchpadEvent) -> Result<(), IndexerError>;

    /// All events for a token, in emission order
    fn token_events(&self, token_id: &TokenId) -> Vec<LaunchpadEvent>;

    /// Events with `start_block <= block_height <= end_block`, in emission order
    fn events_in_range(&self, start_block: u64, end_block: u64) -> Vec<LaunchpadEvent>;

    /// Most recently emitted event for a token
    fn latest_event(&self, token_id: &TokenId) -> Option<LaunchpadEvent>;

    /// Every indexed event, in emission order
    fn all_events(&self) -> Vec<LaunchpadEvent>;

    fn event_count(&self) -> usize;
}

/// In-memory event indexer
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventIndexer {
    events: Vec<LaunchpadEvent>,
}

impl InMemoryEventIndexer {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventIndexer for InMemoryEventIndexer {
    fn index_event(&mut self, event: LaunchpadEvent) -> Result<(), IndexerError> {
        self.events.push(event);
        Ok(())
    }

    fn token_events(&self, token_id: &TokenId) -> Vec<LaunchpadEvent> {
        self.events
            .iter()
            .filter(|e| e.token_id() == token_id)
            .cloned()
            .collect()
    }

    fn events_in_range(&self, start_block: u64, end_block: u64) -> Vec<LaunchpadEvent> {
        self.events
            .iter()
            .filter(|e| {
                let height = e.block_height();
                height >= start_block && height <= end_block
            })
            .cloned()
            .collect()
    }

    fn latest_event(&self, token_id: &TokenId) -> Option<LaunchpadEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| e.token_id() == token_id)
            .cloned()
    }

    fn all_events(&self) -> Vec<LaunchpadEvent> {
        self.events.clone()
    }

    fn event_count(&self) -> usize {
        self.events.len()
    }
}
