//! In-memory collaborator implementations
//!
//! Default backends for the simulator and tests. Each one consults a shared
//! [`FailurePlan`] before acting, which lets tests fail or stall any call.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::{calls, AmmGateway, Collaborators, LockVault, PairHandle, Payments, Treasury};
use crate::bonding_curve::fixed_point::{isqrt, narrow};
use crate::config::protocol_address;
use crate::errors::{CollaboratorError, CollaboratorResult};
use crate::graduation::vesting::{LiquidityLock, LockRequest};
use crate::primitives::{Address, LockId, PairId, TokenId, U256};

/// Shares permanently locked in a pool on first deposit
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Injection {
    FailAlways,
    /// Fail only the n-th call (1-based)
    FailNth(u64),
    Delay(Duration),
}

/// Failure injection shared by the in-memory collaborators
#[derive(Debug, Default)]
pub struct FailurePlan {
    rules: Mutex<HashMap<&'static str, Injection>>,
    calls: Mutex<HashMap<&'static str, u64>>,
}

impl FailurePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call to `call`
    pub fn fail_always(&self, call: &'static str) {
        self.rules.lock().insert(call, Injection::FailAlways);
    }

    /// Fail the `n`-th call to `call`, counting from 1 and from plan creation
    pub fn fail_nth(&self, call: &'static str, n: u64) {
        self.rules.lock().insert(call, Injection::FailNth(n));
    }

    /// Stall every call to `call` for `delay` before it succeeds
    pub fn delay(&self, call: &'static str, delay: Duration) {
        self.rules.lock().insert(call, Injection::Delay(delay));
    }

    /// Remove all injections
    pub fn clear(&self) {
        self.rules.lock().clear();
    }

    /// Number of times `call` has been attempted
    pub fn call_count(&self, call: &'static str) -> u64 {
        self.calls.lock().get(call).copied().unwrap_or(0)
    }

    fn check(&self, call: &'static str) -> CollaboratorResult<()> {
        let attempt = {
            let mut counts = self.calls.lock();
            let count = counts.entry(call).or_insert(0);
            *count += 1;
            *count
        };
        let rule = self.rules.lock().get(call).copied();

        match rule {
            Some(Injection::FailAlways) => Err(injected(call)),
            Some(Injection::FailNth(n)) if n == attempt => Err(injected(call)),
            Some(Injection::Delay(delay)) => {
                std::thread::sleep(delay);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn injected(call: &'static str) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{} injected failure", call))
}

// ============================================================================
// Treasury
// ============================================================================

#[derive(Debug, Default)]
struct TreasuryState {
    balance: u128,
    by_token: HashMap<TokenId, u128>,
}

/// In-memory protocol treasury
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    plan: Arc<FailurePlan>,
    state: Mutex<TreasuryState>,
}

impl InMemoryTreasury {
    pub fn new(plan: Arc<FailurePlan>) -> Self {
        Self {
            plan,
            state: Mutex::new(TreasuryState::default()),
        }
    }

    /// Total fees held
    pub fn balance(&self) -> u128 {
        self.state.lock().balance
    }

    /// Fees attributed to one token (creation fee plus trade fees)
    pub fn fees_for(&self, token_id: &TokenId) -> u128 {
        self.state.lock().by_token.get(token_id).copied().unwrap_or(0)
    }
}

impl Treasury for InMemoryTreasury {
    fn receive_fee(&self, token_id: &TokenId, amount: u128) -> CollaboratorResult<()> {
        self.plan.check(calls::RECEIVE_FEE)?;
        let mut state = self.state.lock();
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or_else(|| CollaboratorError::Rejected("treasury balance overflow".to_string()))?;
        *state.by_token.entry(*token_id).or_insert(0) += amount;
        Ok(())
    }

    fn refund_fee(&self, token_id: &TokenId, amount: u128) -> CollaboratorResult<()> {
        self.plan.check(calls::REFUND_FEE)?;
        let mut state = self.state.lock();
        let held = state.by_token.get(token_id).copied().unwrap_or(0);
        if held < amount {
            return Err(CollaboratorError::Rejected(format!(
                "refund of {} exceeds {} held for token {}",
                amount, held, token_id
            )));
        }
        state.by_token.insert(*token_id, held - amount);
        state.balance -= amount;
        Ok(())
    }
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Debug, Default)]
struct PaymentsState {
    base: HashMap<Address, u128>,
}

/// In-memory outbound payment ledger
#[derive(Debug, Default)]
pub struct InMemoryPayments {
    plan: Arc<FailurePlan>,
    state: Mutex<PaymentsState>,
}

impl InMemoryPayments {
    pub fn new(plan: Arc<FailurePlan>) -> Self {
        Self {
            plan,
            state: Mutex::new(PaymentsState::default()),
        }
    }

    /// Base asset paid out to `recipient`
    pub fn balance_of(&self, recipient: &Address) -> u128 {
        self.state.lock().base.get(recipient).copied().unwrap_or(0)
    }

    pub fn total_paid(&self) -> u128 {
        self.state.lock().base.values().sum()
    }
}

impl Payments for InMemoryPayments {
    fn pay(&self, recipient: &Address, amount: u128) -> CollaboratorResult<()> {
        self.plan.check(calls::PAY)?;
        *self.state.lock().base.entry(*recipient).or_insert(0) += amount;
        Ok(())
    }

    fn reclaim_payment(&self, recipient: &Address, amount: u128) -> CollaboratorResult<()> {
        self.plan.check(calls::RECLAIM_PAYMENT)?;
        let mut state = self.state.lock();
        let paid = state.base.get(recipient).copied().unwrap_or(0);
        if paid < amount {
            return Err(CollaboratorError::Rejected(format!(
                "cannot reclaim {} from {}: only {} paid",
                amount, recipient, paid
            )));
        }
        state.base.insert(*recipient, paid - amount);
        Ok(())
    }
}

// ============================================================================
// AMM
// ============================================================================

#[derive(Debug, Clone)]
struct Pool {
    token_a: [u8; 32],
    token_b: [u8; 32],
    reserve_a: u128,
    reserve_b: u128,
    total_shares: u128,
    holders: HashMap<Address, u128>,
}

/// Read-only view of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pair_id: PairId,
    pub token_a: [u8; 32],
    pub token_b: [u8; 32],
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub total_shares: u128,
}

/// In-memory constant-product pool registry (x · y = k)
///
/// Supports pair creation, liquidity provision and share transfers between
/// holders; swaps are not modelled.
#[derive(Debug, Default)]
pub struct InMemoryAmm {
    plan: Arc<FailurePlan>,
    pools: Mutex<HashMap<PairId, Pool>>,
}

impl InMemoryAmm {
    pub fn new(plan: Arc<FailurePlan>) -> Self {
        Self {
            plan,
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self, pair_id: &PairId) -> Option<PoolSnapshot> {
        self.pools.lock().get(pair_id).map(|pool| PoolSnapshot {
            pair_id: *pair_id,
            token_a: pool.token_a,
            token_b: pool.token_b,
            reserve_a: pool.reserve_a,
            reserve_b: pool.reserve_b,
            total_shares: pool.total_shares,
        })
    }

    pub fn shares_of(&self, pair_id: &PairId, holder: &Address) -> u128 {
        self.pools
            .lock()
            .get(pair_id)
            .and_then(|pool| pool.holders.get(holder).copied())
            .unwrap_or(0)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.lock().len()
    }
}

impl AmmGateway for InMemoryAmm {
    fn create_pair(
        &self,
        token_a: &[u8; 32],
        token_b: &[u8; 32],
    ) -> CollaboratorResult<PairHandle> {
        self.plan.check(calls::CREATE_PAIR)?;
        if token_a == token_b {
            return Err(CollaboratorError::Rejected(
                "pair requires two distinct assets".to_string(),
            ));
        }

        let pair_id = PairId::derive(token_a, token_b);
        let mut pools = self.pools.lock();
        if pools.contains_key(&pair_id) {
            return Ok(PairHandle {
                pair_id,
                created: false,
            });
        }
        pools.insert(
            pair_id,
            Pool {
                token_a: *token_a,
                token_b: *token_b,
                reserve_a: 0,
                reserve_b: 0,
                total_shares: 0,
                holders: HashMap::new(),
            },
        );
        Ok(PairHandle {
            pair_id,
            created: true,
        })
    }

    fn remove_pair(&self, pair_id: &PairId) -> CollaboratorResult<()> {
        self.plan.check(calls::REMOVE_PAIR)?;
        let mut pools = self.pools.lock();
        let pool = pools
            .get(pair_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("pair {}", pair_id)))?;
        if pool.total_shares != 0 {
            return Err(CollaboratorError::Rejected(format!(
                "pair {} still holds {} shares",
                pair_id, pool.total_shares
            )));
        }
        pools.remove(pair_id);
        Ok(())
    }

    fn add_liquidity(
        &self,
        pair_id: &PairId,
        amount_a: u128,
        amount_b: u128,
        recipient: &Address,
    ) -> CollaboratorResult<u128> {
        self.plan.check(calls::ADD_LIQUIDITY)?;
        if amount_a == 0 || amount_b == 0 {
            return Err(CollaboratorError::Rejected(
                "both liquidity amounts must be positive".to_string(),
            ));
        }

        let mut pools = self.pools.lock();
        let pool = pools
            .get_mut(pair_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("pair {}", pair_id)))?;
        let overflow = |_| CollaboratorError::Rejected("liquidity overflow".to_string());

        let minted = if pool.total_shares == 0 {
            let root = narrow(isqrt(U256::from(amount_a) * U256::from(amount_b))).map_err(overflow)?;
            if root <= MINIMUM_LIQUIDITY {
                return Err(CollaboratorError::Rejected(
                    "initial liquidity below minimum".to_string(),
                ));
            }
            *pool.holders.entry(Address([0u8; 32])).or_insert(0) += MINIMUM_LIQUIDITY;
            pool.total_shares = MINIMUM_LIQUIDITY;
            root - MINIMUM_LIQUIDITY
        } else {
            let total = U256::from(pool.total_shares);
            let by_a = U256::from(amount_a) * total / U256::from(pool.reserve_a.max(1));
            let by_b = U256::from(amount_b) * total / U256::from(pool.reserve_b.max(1));
            narrow(by_a.min(by_b)).map_err(overflow)?
        };
        if minted == 0 {
            return Err(CollaboratorError::Rejected("no pool shares minted".to_string()));
        }

        pool.reserve_a = pool
            .reserve_a
            .checked_add(amount_a)
            .ok_or_else(|| CollaboratorError::Rejected("reserve overflow".to_string()))?;
        pool.reserve_b = pool
            .reserve_b
            .checked_add(amount_b)
            .ok_or_else(|| CollaboratorError::Rejected("reserve overflow".to_string()))?;
        pool.total_shares += minted;
        *pool.holders.entry(*recipient).or_insert(0) += minted;
        Ok(minted)
    }

    fn remove_liquidity(
        &self,
        pair_id: &PairId,
        shares: u128,
        holder: &Address,
    ) -> CollaboratorResult<(u128, u128)> {
        self.plan.check(calls::REMOVE_LIQUIDITY)?;
        let mut pools = self.pools.lock();
        let pool = pools
            .get_mut(pair_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("pair {}", pair_id)))?;

        let held = pool.holders.get(holder).copied().unwrap_or(0);
        if shares == 0 || shares > held {
            return Err(CollaboratorError::Rejected(format!(
                "cannot burn {} shares, holder has {}",
                shares, held
            )));
        }

        // Last provider out: the locked minimum is burned too and the pool resets
        if pool.total_shares - shares == MINIMUM_LIQUIDITY {
            let drained = (pool.reserve_a, pool.reserve_b);
            pool.reserve_a = 0;
            pool.reserve_b = 0;
            pool.total_shares = 0;
            pool.holders.clear();
            return Ok(drained);
        }

        let total = U256::from(pool.total_shares);
        let out_a = (U256::from(shares) * U256::from(pool.reserve_a) / total).low_u128();
        let out_b = (U256::from(shares) * U256::from(pool.reserve_b) / total).low_u128();

        pool.reserve_a -= out_a;
        pool.reserve_b -= out_b;
        pool.total_shares -= shares;
        pool.holders.insert(*holder, held - shares);
        Ok((out_a, out_b))
    }

    fn transfer_shares(
        &self,
        pair_id: &PairId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> CollaboratorResult<()> {
        self.plan.check(calls::TRANSFER_SHARES)?;
        let mut pools = self.pools.lock();
        let pool = pools
            .get_mut(pair_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("pair {}", pair_id)))?;

        let held = pool.holders.get(from).copied().unwrap_or(0);
        if amount == 0 || amount > held {
            return Err(CollaboratorError::Rejected(format!(
                "cannot transfer {} shares from {}: only {} held",
                amount, from, held
            )));
        }
        if from == to {
            return Ok(());
        }
        pool.holders.insert(*from, held - amount);
        *pool.holders.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

// ============================================================================
// Lock vault
// ============================================================================

#[derive(Debug, Default)]
struct VaultState {
    locks: BTreeMap<LockId, LiquidityLock>,
    next_id: u64,
}

/// In-memory lock vault
///
/// Locked shares sit on the AMM under [`LockVault::custody_account`]; the
/// vault itself keeps the lock records.
#[derive(Debug)]
pub struct InMemoryLockVault {
    plan: Arc<FailurePlan>,
    custody: Address,
    state: Mutex<VaultState>,
}

impl InMemoryLockVault {
    pub fn new(plan: Arc<FailurePlan>) -> Self {
        Self {
            plan,
            custody: protocol_address("lock_vault"),
            state: Mutex::new(VaultState::default()),
        }
    }

    /// Release a matured lock
    pub fn release(&self, lock_id: &LockId, now: u64) -> CollaboratorResult<LiquidityLock> {
        let mut state = self.state.lock();
        let lock = state
            .locks
            .get_mut(lock_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("lock {}", lock_id)))?;
        if lock.released {
            return Err(CollaboratorError::LockAlreadyReleased);
        }
        if now < lock.unlock_time {
            return Err(CollaboratorError::LockNotMatured);
        }
        lock.released = true;
        Ok(lock.clone())
    }

    pub fn locks_for_token(&self, token_id: &TokenId) -> Vec<LiquidityLock> {
        self.state
            .lock()
            .locks
            .values()
            .filter(|lock| &lock.token_id == token_id)
            .cloned()
            .collect()
    }

    pub fn lock_count(&self) -> usize {
        self.state.lock().locks.len()
    }
}

impl Default for InMemoryLockVault {
    fn default() -> Self {
        Self::new(Arc::default())
    }
}

impl LockVault for InMemoryLockVault {
    fn custody_account(&self) -> Address {
        self.custody
    }

    fn lock(&self, request: LockRequest) -> CollaboratorResult<LockId> {
        self.plan.check(calls::LOCK)?;
        if request.amount == 0 {
            return Err(CollaboratorError::Rejected("cannot lock zero shares".to_string()));
        }

        let mut state = self.state.lock();
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"LAUNCHPAD_LOCK_V1");
        hasher.update(&state.next_id.to_be_bytes());
        hasher.update(request.token_id.as_bytes());
        let lock_id = LockId(*hasher.finalize().as_bytes());
        state.next_id += 1;

        state
            .locks
            .insert(lock_id, LiquidityLock::from_request(lock_id, request));
        Ok(lock_id)
    }

    fn cancel_lock(&self, lock_id: &LockId) -> CollaboratorResult<()> {
        self.plan.check(calls::CANCEL_LOCK)?;
        let mut state = self.state.lock();
        match state.locks.get(lock_id) {
            None => Err(CollaboratorError::NotFound(format!("lock {}", lock_id))),
            Some(lock) if lock.released => Err(CollaboratorError::LockAlreadyReleased),
            Some(_) => {
                state.locks.remove(lock_id);
                Ok(())
            }
        }
    }

    fn get_lock(&self, lock_id: &LockId) -> Option<LiquidityLock> {
        self.state.lock().locks.get(lock_id).cloned()
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// All in-memory collaborators sharing one failure plan
#[derive(Debug, Clone)]
pub struct InMemoryCollaborators {
    pub plan: Arc<FailurePlan>,
    pub treasury: Arc<InMemoryTreasury>,
    pub payments: Arc<InMemoryPayments>,
    pub amm: Arc<InMemoryAmm>,
    pub lock_vault: Arc<InMemoryLockVault>,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        let plan = Arc::new(FailurePlan::new());
        Self {
            treasury: Arc::new(InMemoryTreasury::new(plan.clone())),
            payments: Arc::new(InMemoryPayments::new(plan.clone())),
            amm: Arc::new(InMemoryAmm::new(plan.clone())),
            lock_vault: Arc::new(InMemoryLockVault::new(plan.clone())),
            plan,
        }
    }

    /// Trait-object handles for the engine
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            treasury: self.treasury.clone(),
            payments: self.payments.clone(),
            amm: self.amm.clone(),
            lock_vault: self.lock_vault.clone(),
        }
    }
}

impl Default for InMemoryCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graduation::vesting::BeneficiaryCategory;
    use crate::primitives::WAD;

    fn request(amount: u128) -> LockRequest {
        LockRequest {
            token_id: TokenId([1u8; 32]),
            pair_id: PairId([2u8; 32]),
            category: BeneficiaryCategory::Vault,
            amount,
            created_at: 1_000,
            unlock_time: 2_000,
        }
    }

    #[test]
    fn test_failure_plan_nth_call() {
        let plan = FailurePlan::new();
        plan.fail_nth(calls::PAY, 2);
        assert!(plan.check(calls::PAY).is_ok());
        assert!(plan.check(calls::PAY).is_err());
        assert!(plan.check(calls::PAY).is_ok());
        assert_eq!(plan.call_count(calls::PAY), 3);

        plan.fail_always(calls::LOCK);
        assert!(plan.check(calls::LOCK).is_err());
        plan.clear();
        assert!(plan.check(calls::LOCK).is_ok());
    }

    #[test]
    fn test_treasury_refund() {
        let treasury = InMemoryTreasury::new(Arc::new(FailurePlan::new()));
        let token = TokenId([1u8; 32]);
        treasury.receive_fee(&token, 100).unwrap();
        treasury.refund_fee(&token, 40).unwrap();
        assert_eq!(treasury.balance(), 60);
        assert!(treasury.refund_fee(&token, 61).is_err());
    }

    #[test]
    fn test_amm_liquidity_lifecycle() {
        let amm = InMemoryAmm::new(Arc::new(FailurePlan::new()));
        let created = amm.create_pair(&[1u8; 32], &[2u8; 32]).unwrap();
        assert!(created.created);
        let existing = amm.create_pair(&[2u8; 32], &[1u8; 32]).unwrap();
        assert_eq!(existing.pair_id, created.pair_id);
        assert!(!existing.created);
        assert_eq!(amm.pool_count(), 1);
        let pair = created.pair_id;

        let recipient = Address([5u8; 32]);
        let minted = amm.add_liquidity(&pair, 4 * WAD, WAD, &recipient).unwrap();
        assert_eq!(minted, 2 * WAD - MINIMUM_LIQUIDITY);
        assert_eq!(amm.shares_of(&pair, &recipient), minted);

        let other = Address([6u8; 32]);
        let second = amm.add_liquidity(&pair, 4 * WAD, WAD, &other).unwrap();
        assert_eq!(second, 2 * WAD);

        let (a, b) = amm.remove_liquidity(&pair, second, &other).unwrap();
        assert_eq!((a, b), (4 * WAD, WAD));

        // last provider out drains the pool completely
        let (a, b) = amm.remove_liquidity(&pair, minted, &recipient).unwrap();
        assert_eq!((a, b), (4 * WAD, WAD));
        let pool = amm.pool(&pair).unwrap();
        assert_eq!(pool.total_shares, 0);
        assert_eq!(pool.reserve_a, 0);
        assert!(amm.remove_liquidity(&pair, 1, &recipient).is_err());
    }

    #[test]
    fn test_amm_rejects_dust_and_unknown_pairs() {
        let amm = InMemoryAmm::new(Arc::new(FailurePlan::new()));
        let pair = amm.create_pair(&[1u8; 32], &[2u8; 32]).unwrap().pair_id;
        assert!(amm.add_liquidity(&pair, 10, 10, &Address([5u8; 32])).is_err());
        assert!(amm.add_liquidity(&pair, 0, WAD, &Address([5u8; 32])).is_err());
        assert!(matches!(
            amm.add_liquidity(&PairId([9u8; 32]), WAD, WAD, &Address([5u8; 32])),
            Err(CollaboratorError::NotFound(_))
        ));
        assert!(amm.create_pair(&[1u8; 32], &[1u8; 32]).is_err());
    }

    #[test]
    fn test_share_transfer_conserves_supply() {
        let amm = InMemoryAmm::new(Arc::new(FailurePlan::new()));
        let pair = amm.create_pair(&[1u8; 32], &[2u8; 32]).unwrap().pair_id;
        let locker = Address([5u8; 32]);
        let creator = Address([6u8; 32]);
        let minted = amm.add_liquidity(&pair, 4 * WAD, WAD, &locker).unwrap();

        amm.transfer_shares(&pair, &locker, &creator, minted / 5).unwrap();
        assert_eq!(amm.shares_of(&pair, &locker), minted - minted / 5);
        assert_eq!(amm.shares_of(&pair, &creator), minted / 5);
        assert_eq!(amm.pool(&pair).unwrap().total_shares, minted + MINIMUM_LIQUIDITY);

        assert!(amm.transfer_shares(&pair, &creator, &locker, minted).is_err());
        assert!(amm.transfer_shares(&pair, &creator, &locker, 0).is_err());
        assert!(matches!(
            amm.transfer_shares(&PairId([9u8; 32]), &locker, &creator, 1),
            Err(CollaboratorError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_pair_requires_empty_pool() {
        let amm = InMemoryAmm::new(Arc::new(FailurePlan::new()));
        let pair = amm.create_pair(&[1u8; 32], &[2u8; 32]).unwrap().pair_id;
        let holder = Address([5u8; 32]);
        let minted = amm.add_liquidity(&pair, 4 * WAD, WAD, &holder).unwrap();
        assert!(amm.remove_pair(&pair).is_err());

        amm.remove_liquidity(&pair, minted, &holder).unwrap();
        amm.remove_pair(&pair).unwrap();
        assert!(amm.pool(&pair).is_none());
        assert_eq!(amm.pool_count(), 0);
        assert!(matches!(amm.remove_pair(&pair), Err(CollaboratorError::NotFound(_))));
    }

    #[test]
    fn test_lock_release_lifecycle() {
        let vault = InMemoryLockVault::new(Arc::new(FailurePlan::new()));
        let lock_id = vault.lock(request(800)).unwrap();
        assert_eq!(vault.get_lock(&lock_id).unwrap().amount, 800);

        assert_eq!(vault.release(&lock_id, 1_999), Err(CollaboratorError::LockNotMatured));
        assert!(vault.release(&lock_id, 2_000).unwrap().released);
        assert_eq!(
            vault.release(&lock_id, 3_000),
            Err(CollaboratorError::LockAlreadyReleased)
        );
        assert_eq!(vault.cancel_lock(&lock_id), Err(CollaboratorError::LockAlreadyReleased));
    }

    #[test]
    fn test_cancel_lock_removes_record() {
        let vault = InMemoryLockVault::new(Arc::new(FailurePlan::new()));
        let first = vault.lock(request(800)).unwrap();
        let second = vault.lock(request(800)).unwrap();
        assert_ne!(first, second);

        vault.cancel_lock(&first).unwrap();
        assert!(vault.get_lock(&first).is_none());
        assert_eq!(vault.lock_count(), 1);
        assert!(vault.lock(request(0)).is_err());
    }
}
