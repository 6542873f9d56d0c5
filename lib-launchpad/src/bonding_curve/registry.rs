//! Bonding Curve Registry
//!
//! Index of all launched tokens with query capabilities.
//! Each token sits behind its own mutex so trades on one token are serialized
//! while different tokens proceed in parallel.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{token::Token, types::Phase};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{Address, TokenId};

/// Shared handle to one token's serialized state
pub type TokenHandle = Arc<Mutex<Token>>;

/// Token Registry
#[derive(Debug, Default)]
pub struct TokenRegistry {
    /// All registered tokens by ID
    tokens: RwLock<HashMap<TokenId, TokenHandle>>,

    /// Creator index, in creation order
    by_creator: RwLock<HashMap<Address, Vec<TokenId>>>,

    counters: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    total_created: u64,
    total_graduated: u64,
}

impl TokenRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Id-derivation nonce for `creator`'s next token: the number of tokens
    /// it has registered so far. Reading it changes nothing, so a creation
    /// that is later rejected leaves the next id unchanged.
    pub fn creator_nonce(&self, creator: &Address) -> u64 {
        self.by_creator
            .read()
            .get(creator)
            .map_or(0, |ids| ids.len() as u64)
    }

    /// Register a newly created token
    pub fn register(&self, token: Token) -> LaunchpadResult<()> {
        let token_id = token.token_id;
        let creator = token.creator;

        {
            let mut tokens = self.tokens.write();
            if tokens.contains_key(&token_id) {
                return Err(LaunchpadError::InvalidParameters(
                    "Token already registered".to_string(),
                ));
            }
            tokens.insert(token_id, Arc::new(Mutex::new(token)));
        }

        self.by_creator
            .write()
            .entry(creator)
            .or_default()
            .push(token_id);
        self.counters.lock().total_created += 1;

        Ok(())
    }

    /// Get the lockable handle of a token
    pub fn handle(&self, token_id: &TokenId) -> LaunchpadResult<TokenHandle> {
        self.tokens
            .read()
            .get(token_id)
            .cloned()
            .ok_or(LaunchpadError::TokenNotFound(*token_id))
    }

    /// Snapshot of a token's current state
    pub fn get(&self, token_id: &TokenId) -> Option<Token> {
        let handle = self.tokens.read().get(token_id).cloned()?;
        let token = handle.lock().clone();
        Some(token)
    }

    /// Tokens created by `creator`, oldest first
    pub fn creator_tokens(&self, creator: &Address) -> Vec<TokenId> {
        self.by_creator
            .read()
            .get(creator)
            .cloned()
            .unwrap_or_default()
    }

    /// Record that a token committed its graduation
    pub fn record_graduation(&self) {
        self.counters.lock().total_graduated += 1;
    }

    /// Get all tokens in a specific phase
    pub fn tokens_in_phase(&self, phase: Phase) -> Vec<TokenId> {
        let handles: Vec<(TokenId, TokenHandle)> = self
            .tokens
            .read()
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();

        let mut ids: Vec<TokenId> = handles
            .into_iter()
            .filter(|(_, handle)| handle.lock().phase == phase)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Get total token count
    pub fn total_count(&self) -> usize {
        self.tokens.read().len()
    }

    /// Check if token exists
    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.tokens.read().contains_key(token_id)
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let counters = self.counters.lock();
        RegistryStats {
            total_created: counters.total_created,
            total_graduated: counters.total_graduated,
            in_trading_phase: counters.total_created - counters.total_graduated,
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_created: u64,
    pub total_graduated: u64,
    pub in_trading_phase: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonding_curve::types::{CurveConstants, CurveKind, CurveParams, TokenMetadata};
    use crate::primitives::WAD;

    fn test_token(id: u8, creator: u8) -> Token {
        Token::new(
            TokenId([id; 32]),
            format!("Token {}", id),
            format!("TK{}", id),
            TokenMetadata::default(),
            Address([creator; 32]),
            CurveParams::new(CurveKind::Linear, WAD / 1000, CurveConstants::default()),
            100,
            100,
            1_600_000_000,
        )
        .unwrap()
    }

    #[test]
    fn test_register_token() {
        let registry = TokenRegistry::new();
        assert!(registry.register(test_token(1, 9)).is_ok());
        assert_eq!(registry.total_count(), 1);
        assert!(registry.contains(&TokenId([1u8; 32])));
        assert_eq!(registry.tokens_in_phase(Phase::Trading).len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = TokenRegistry::new();
        let token = test_token(1, 9);
        assert!(registry.register(token.clone()).is_ok());
        assert!(registry.register(token).is_err());
        assert_eq!(registry.stats().total_created, 1);
    }

    #[test]
    fn test_creator_index_keeps_creation_order() {
        let registry = TokenRegistry::new();
        registry.register(test_token(3, 9)).unwrap();
        registry.register(test_token(1, 9)).unwrap();
        registry.register(test_token(2, 8)).unwrap();

        assert_eq!(
            registry.creator_tokens(&Address([9u8; 32])),
            vec![TokenId([3u8; 32]), TokenId([1u8; 32])]
        );
        assert!(registry.creator_tokens(&Address([7u8; 32])).is_empty());
    }

    #[test]
    fn test_get_returns_snapshot() {
        let registry = TokenRegistry::new();
        registry.register(test_token(1, 9)).unwrap();
        let id = TokenId([1u8; 32]);

        let mut snapshot = registry.get(&id).unwrap();
        snapshot.total_supply = 42;
        assert_eq!(registry.get(&id).unwrap().total_supply, 0);
        assert!(matches!(
            registry.handle(&TokenId([5u8; 32])),
            Err(LaunchpadError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_phase_query_and_stats() {
        let registry = TokenRegistry::new();
        registry.register(test_token(1, 9)).unwrap();
        registry.register(test_token(2, 9)).unwrap();

        let handle = registry.handle(&TokenId([2u8; 32])).unwrap();
        handle.lock().phase = Phase::Graduated;
        registry.record_graduation();

        assert_eq!(registry.tokens_in_phase(Phase::Graduated), vec![TokenId([2u8; 32])]);
        let stats = registry.stats();
        assert_eq!(stats.total_created, 2);
        assert_eq!(stats.total_graduated, 1);
        assert_eq!(stats.in_trading_phase, 1);
    }

    #[test]
    fn test_nonce_advances_only_on_register() {
        let registry = TokenRegistry::new();
        let creator = Address([9u8; 32]);
        assert_eq!(registry.creator_nonce(&creator), 0);
        assert_eq!(registry.creator_nonce(&creator), 0);

        registry.register(test_token(1, 9)).unwrap();
        assert_eq!(registry.creator_nonce(&creator), 1);
        assert!(registry.register(test_token(1, 9)).is_err());
        assert_eq!(registry.creator_nonce(&creator), 1);
        assert_eq!(registry.creator_nonce(&Address([8u8; 32])), 0);
    }
}
