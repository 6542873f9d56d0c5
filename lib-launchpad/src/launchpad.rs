//! Launchpad
//!
//! Entry point tying the registry, trading engine, collaborators and event
//! log together. All operations are synchronous; per-token locks make trades
//! on one token strictly sequential while different tokens run in parallel.
//!
//! ## Operations
//! - `create_token`: validate, collect the exact creation fee, register
//! - `buy` / `sell`: trade against the curve, graduating when the reserve
//!   reaches the threshold
//! - `get_token_info` / `get_creator_tokens`: queries
//!
//! Events are written after the operation commits. A write the event log
//! refuses cannot undo the operation; it is logged and counted in
//! [`Launchpad::dropped_events`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

use crate::bonding_curve::events::{EventIndexer, InMemoryEventIndexer, LaunchpadEvent};
use crate::bonding_curve::registry::{RegistryStats, TokenRegistry};
use crate::bonding_curve::token::Token;
use crate::bonding_curve::types::{CurveKind, CurveParams, CurveStats, TokenMetadata, Trade};
use crate::collaborators::{calls, Collaborators};
use crate::config::LaunchpadConfig;
use crate::errors::{ConfigError, LaunchpadError, LaunchpadResult};
use crate::graduation::migrator::LiquidityMigrator;
use crate::graduation::monitor::GraduationMonitor;
use crate::graduation::saga::{Compensation, Saga};
use crate::graduation::vesting::{LiquidityLock, VestingLocker};
use crate::primitives::{Address, TokenId, TxContext};
use crate::trading::{TradeReceipt, TradingEngine};

/// Parameters of a new token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub curve_kind: CurveKind,
    /// Base WAD per whole token
    pub initial_price: u128,
    pub royalty_bps: u16,
    #[serde(default)]
    pub metadata: TokenMetadata,
}

/// Bonding-curve launch venue
pub struct Launchpad {
    config: LaunchpadConfig,
    registry: TokenRegistry,
    engine: TradingEngine,
    collaborators: Collaborators,
    indexer: Mutex<Box<dyn EventIndexer>>,
    dropped_events: AtomicU64,
}

impl std::fmt::Debug for Launchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launchpad")
            .field("config", &self.config)
            .field("registry", &self.registry.stats())
            .finish_non_exhaustive()
    }
}

impl Launchpad {
    /// Launchpad with an in-memory event log
    pub fn new(config: LaunchpadConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        Self::with_indexer(config, collaborators, Box::new(InMemoryEventIndexer::new()))
    }

    pub fn with_indexer(
        config: LaunchpadConfig,
        collaborators: Collaborators,
        indexer: Box<dyn EventIndexer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let protocol = &config.protocol;
        if protocol.locker == collaborators.lock_vault.custody_account() {
            return Err(ConfigError::Invalid(
                "locker must differ from the lock vault custody account".to_string(),
            ));
        }

        let migrator = LiquidityMigrator::new(
            protocol.locker,
            VestingLocker::new(protocol.vault_share_bps, protocol.lock_duration_secs),
        );
        let engine = TradingEngine::new(
            protocol.trade_fee_bps,
            GraduationMonitor::new(protocol.graduation_threshold),
            migrator,
            collaborators.clone(),
            config.runtime.collaborator_timeout(),
        );

        Ok(Self {
            config,
            registry: TokenRegistry::new(),
            engine,
            collaborators,
            indexer: Mutex::new(indexer),
            dropped_events: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    /// Create a token; `creation_fee_paid` must equal the configured fee exactly
    pub fn create_token(
        &self,
        ctx: &TxContext,
        request: CreateTokenRequest,
        creation_fee_paid: u128,
    ) -> LaunchpadResult<TokenId> {
        let protocol = &self.config.protocol;

        if request.royalty_bps > protocol.max_royalty_bps {
            return Err(LaunchpadError::InvalidParameters(format!(
                "royalty {} bps exceeds maximum {} bps",
                request.royalty_bps, protocol.max_royalty_bps
            )));
        }
        let constants = self
            .config
            .curve
            .constants()
            .map_err(|e| LaunchpadError::InvalidParameters(e.to_string()))?;
        let curve = CurveParams::new(request.curve_kind, request.initial_price, constants);

        let nonce = self.registry.creator_nonce(&ctx.caller);
        let token_id = TokenId::derive(&ctx.caller, nonce, &request.name, &request.symbol);
        let token = Token::new(
            token_id,
            request.name,
            request.symbol,
            request.metadata,
            ctx.caller,
            curve,
            request.royalty_bps,
            ctx.block_height,
            ctx.timestamp,
        )?;

        if creation_fee_paid < protocol.creation_fee {
            warn!(
                "Token creation by {} rejected: fee {} below {}",
                ctx.caller, creation_fee_paid, protocol.creation_fee
            );
            return Err(LaunchpadError::InsufficientFee {
                required: protocol.creation_fee,
                paid: creation_fee_paid,
            });
        }
        if creation_fee_paid > protocol.creation_fee {
            return Err(LaunchpadError::InvalidParameters(format!(
                "creation fee overpaid: {} > {}",
                creation_fee_paid, protocol.creation_fee
            )));
        }

        let fee = protocol.creation_fee;
        let mut saga = Saga::new(&self.collaborators, self.config.runtime.collaborator_timeout());
        if let Err(source) = saga.step(
            calls::RECEIVE_FEE,
            |c| c.treasury.receive_fee(&token_id, fee),
            |_| Some(Compensation::RefundFee { token_id, amount: fee }),
        ) {
            saga.rollback();
            return Err(LaunchpadError::ExternalCallFailed {
                call: calls::RECEIVE_FEE,
                source,
            });
        }

        let event = LaunchpadEvent::TokenCreated {
            token_id,
            creator: token.creator,
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            curve_kind: token.curve.kind,
            initial_price: token.curve.initial_price,
            royalty_bps: token.royalty_bps,
            creation_fee: fee,
            block_height: ctx.block_height,
            timestamp: ctx.timestamp,
        };
        let symbol = token.symbol.clone();

        if let Err(e) = self.registry.register(token) {
            saga.rollback();
            return Err(e);
        }
        saga.commit();
        self.emit(&mut **self.indexer.lock(), event);

        info!(
            "Token {} ({}) created by {} on a {} curve",
            token_id, symbol, ctx.caller, request.curve_kind
        );
        Ok(token_id)
    }

    /// Buy with `base_in` gross base asset; fails with `SlippageExceeded`
    /// when fewer than `min_tokens_out` tokens would be minted
    pub fn buy(
        &self,
        ctx: &TxContext,
        token_id: &TokenId,
        base_in: u128,
        min_tokens_out: u128,
    ) -> LaunchpadResult<TradeReceipt> {
        self.trade(ctx, token_id, |engine, token| {
            engine.buy(token, ctx, base_in, min_tokens_out)
        })
    }

    /// Sell `tokens_in`; fails with `SlippageExceeded` when the net payout
    /// is below `min_base_out`
    pub fn sell(
        &self,
        ctx: &TxContext,
        token_id: &TokenId,
        tokens_in: u128,
        min_base_out: u128,
    ) -> LaunchpadResult<TradeReceipt> {
        self.trade(ctx, token_id, |engine, token| {
            engine.sell(token, ctx, tokens_in, min_base_out)
        })
    }

    fn trade(
        &self,
        ctx: &TxContext,
        token_id: &TokenId,
        run: impl FnOnce(&TradingEngine, &mut Token) -> LaunchpadResult<TradeReceipt>,
    ) -> LaunchpadResult<TradeReceipt> {
        let handle = self.registry.handle(token_id)?;
        let mut token = handle.lock();
        let receipt = run(&self.engine, &mut token)?;

        // Still under the token lock, so the log keeps per-token trade order
        let mut indexer = self.indexer.lock();
        self.emit(
            &mut **indexer,
            LaunchpadEvent::Trade {
                token_id: *token_id,
                trade: receipt.trade.clone(),
                block_height: ctx.block_height,
                timestamp: ctx.timestamp,
            },
        );
        if let Some(record) = &receipt.graduation {
            self.emit(
                &mut **indexer,
                LaunchpadEvent::Graduated {
                    token_id: *token_id,
                    final_supply: token.total_supply,
                    record: record.clone(),
                },
            );
            self.emit(
                &mut **indexer,
                LaunchpadEvent::LiquidityLocked {
                    token_id: *token_id,
                    lock_id: record.lock_id,
                    pair_id: record.pair_id,
                    amount: record.vault_share,
                    unlock_time: record.unlock_time,
                    block_height: record.block_height,
                    timestamp: record.timestamp,
                },
            );
            self.registry.record_graduation();
        }
        Ok(receipt)
    }

    fn emit(&self, indexer: &mut dyn EventIndexer, event: LaunchpadEvent) {
        let event_type = event.event_type();
        let token_id = *event.token_id();
        if let Err(e) = indexer.index_event(event) {
            self.dropped_events.fetch_add(1, Ordering::SeqCst);
            error!(
                "Committed {} event for token {} missing from the event log: {}",
                event_type, token_id, e
            );
        }
    }

    /// Committed events the event log failed to store
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::SeqCst)
    }

    /// Quote a buy against the current curve state
    pub fn quote_buy(&self, ctx: &TxContext, token_id: &TokenId, base_in: u128) -> LaunchpadResult<Trade> {
        let handle = self.registry.handle(token_id)?;
        let token = handle.lock();
        self.engine.quote_buy(&token, ctx, base_in)
    }

    /// Quote a sell against the current curve state
    pub fn quote_sell(&self, ctx: &TxContext, token_id: &TokenId, tokens_in: u128) -> LaunchpadResult<Trade> {
        let handle = self.registry.handle(token_id)?;
        let token = handle.lock();
        self.engine.quote_sell(&token, ctx, tokens_in)
    }

    /// Snapshot of a token
    pub fn get_token_info(&self, token_id: &TokenId) -> LaunchpadResult<Token> {
        self.registry
            .get(token_id)
            .ok_or(LaunchpadError::TokenNotFound(*token_id))
    }

    /// Tokens created by `creator`, oldest first
    pub fn get_creator_tokens(&self, creator: &Address) -> Vec<TokenId> {
        self.registry.creator_tokens(creator)
    }

    pub fn token_stats(&self, token_id: &TokenId) -> LaunchpadResult<CurveStats> {
        self.get_token_info(token_id)?
            .stats(self.config.protocol.graduation_threshold)
    }

    /// Vault lock created when the token graduated
    pub fn liquidity_lock(&self, token_id: &TokenId) -> LaunchpadResult<Option<LiquidityLock>> {
        let token = self.get_token_info(token_id)?;
        Ok(token
            .graduation
            .and_then(|record| self.collaborators.lock_vault.get_lock(&record.lock_id)))
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Committed events for one token, in emission order
    pub fn token_events(&self, token_id: &TokenId) -> Vec<LaunchpadEvent> {
        self.indexer.lock().token_events(token_id)
    }

    /// Every committed event, in emission order
    pub fn events(&self) -> Vec<LaunchpadEvent> {
        self.indexer.lock().all_events()
    }
}
