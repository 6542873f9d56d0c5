//! External Collaborators
//!
//! Interfaces to the systems the launchpad moves value through: the protocol
//! treasury, outbound payments, the external AMM and the lock vault. Every
//! effect has a matching compensating call so a failed trade can be unwound.

pub mod memory;

use std::sync::Arc;

use crate::errors::CollaboratorResult;
use crate::graduation::vesting::{LiquidityLock, LockRequest};
use crate::primitives::{Address, LockId, PairId, TokenId};

pub use memory::{
    FailurePlan, InMemoryAmm, InMemoryCollaborators, InMemoryLockVault, InMemoryPayments,
    InMemoryTreasury, PoolSnapshot,
};

/// Result of [`AmmGateway::create_pair`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairHandle {
    pub pair_id: PairId,
    /// False when the pair already existed before the call
    pub created: bool,
}

/// Collaborator call names, used in errors, logs and failure injection
pub mod calls {
    pub const RECEIVE_FEE: &str = "receive_fee";
    pub const REFUND_FEE: &str = "refund_fee";
    pub const PAY: &str = "pay";
    pub const RECLAIM_PAYMENT: &str = "reclaim_payment";
    pub const CREATE_PAIR: &str = "create_pair";
    pub const REMOVE_PAIR: &str = "remove_pair";
    pub const TRANSFER_SHARES: &str = "transfer_shares";
    pub const ADD_LIQUIDITY: &str = "add_liquidity";
    pub const REMOVE_LIQUIDITY: &str = "remove_liquidity";
    pub const LOCK: &str = "lock";
    pub const CANCEL_LOCK: &str = "cancel_lock";
}

/// Protocol fee sink
pub trait Treasury: Send + Sync {
    /// Credit a creation or trade fee attributed to `token_id`
    fn receive_fee(&self, token_id: &TokenId, amount: u128) -> CollaboratorResult<()>;

    /// Reverse a previously received fee
    fn refund_fee(&self, token_id: &TokenId, amount: u128) -> CollaboratorResult<()>;
}

/// Outbound base-asset transfers
pub trait Payments: Send + Sync {
    fn pay(&self, recipient: &Address, amount: u128) -> CollaboratorResult<()>;

    fn reclaim_payment(&self, recipient: &Address, amount: u128) -> CollaboratorResult<()>;
}

/// External constant-product market
pub trait AmmGateway: Send + Sync {
    /// Create (or look up) the pair for two assets
    fn create_pair(
        &self,
        token_a: &[u8; 32],
        token_b: &[u8; 32],
    ) -> CollaboratorResult<PairHandle>;

    /// Delete a pair that holds no liquidity
    fn remove_pair(&self, pair_id: &PairId) -> CollaboratorResult<()>;

    /// Deposit both sides and mint pool shares to `recipient`
    fn add_liquidity(
        &self,
        pair_id: &PairId,
        amount_a: u128,
        amount_b: u128,
        recipient: &Address,
    ) -> CollaboratorResult<u128>;

    /// Burn `shares` held by `holder` and return the withdrawn (a, b) amounts
    fn remove_liquidity(
        &self,
        pair_id: &PairId,
        shares: u128,
        holder: &Address,
    ) -> CollaboratorResult<(u128, u128)>;

    /// Move pool shares between holders without touching reserves
    fn transfer_shares(
        &self,
        pair_id: &PairId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> CollaboratorResult<()>;
}

/// Protocol-controlled lock custody
pub trait LockVault: Send + Sync {
    /// Account that holds locked pool shares until release
    fn custody_account(&self) -> Address;

    /// Record a lock over shares already moved into custody
    fn lock(&self, request: LockRequest) -> CollaboratorResult<LockId>;

    fn cancel_lock(&self, lock_id: &LockId) -> CollaboratorResult<()>;

    fn get_lock(&self, lock_id: &LockId) -> Option<LiquidityLock>;
}

/// Bundle of collaborator handles shared by the engine
#[derive(Clone)]
pub struct Collaborators {
    pub treasury: Arc<dyn Treasury>,
    pub payments: Arc<dyn Payments>,
    pub amm: Arc<dyn AmmGateway>,
    pub lock_vault: Arc<dyn LockVault>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
