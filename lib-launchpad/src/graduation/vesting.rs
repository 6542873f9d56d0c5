//! Vesting Locker
//!
//! Splits the pool shares minted at migration between the protocol vault and
//! the creator, and describes the time lock registered for the vault share.
//!
//! # Invariants
//! - `vault + creator == shares` for every split
//! - `vault == floor(shares × vault_share_bps / 10_000)`; the rounding
//!   remainder goes to the creator
//! - Calculations use integer math only

use serde::{Deserialize, Serialize};

use crate::bonding_curve::fixed_point::mul_div;
use crate::errors::LaunchpadResult;
use crate::primitives::{LockId, PairId, TokenId, BPS_DENOMINATOR};

/// Who a liquidity lock is held for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeneficiaryCategory {
    /// Protocol-controlled vault
    Vault,
    /// Token creator
    Creator,
}

impl std::fmt::Display for BeneficiaryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeneficiaryCategory::Vault => write!(f, "vault"),
            BeneficiaryCategory::Creator => write!(f, "creator"),
        }
    }
}

/// Request handed to the lock vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    pub token_id: TokenId,
    pub pair_id: PairId,
    pub category: BeneficiaryCategory,
    pub amount: u128,
    pub created_at: u64,
    pub unlock_time: u64,
}

/// Time-locked pool shares held by the lock vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityLock {
    pub lock_id: LockId,
    pub token_id: TokenId,
    pub pair_id: PairId,
    pub category: BeneficiaryCategory,
    pub amount: u128,
    pub created_at: u64,
    pub unlock_time: u64,
    /// Flipped once by an unlock after `unlock_time`
    pub released: bool,
}

impl LiquidityLock {
    pub fn from_request(lock_id: LockId, request: LockRequest) -> Self {
        Self {
            lock_id,
            token_id: request.token_id,
            pair_id: request.pair_id,
            category: request.category,
            amount: request.amount,
            created_at: request.created_at,
            unlock_time: request.unlock_time,
            released: false,
        }
    }

    pub fn is_unlockable(&self, now: u64) -> bool {
        !self.released && now >= self.unlock_time
    }
}

/// Pool share split between vault and creator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSplit {
    pub vault: u128,
    pub creator: u128,
}

/// Vesting Locker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingLocker {
    pub vault_share_bps: u16,
    pub lock_duration_secs: u64,
}

impl VestingLocker {
    pub fn new(vault_share_bps: u16, lock_duration_secs: u64) -> Self {
        Self {
            vault_share_bps,
            lock_duration_secs,
        }
    }

    /// Split minted pool shares; the vault takes the floored percentage
    pub fn split(&self, shares: u128) -> LaunchpadResult<ShareSplit> {
        let vault = mul_div(shares, self.vault_share_bps as u128, BPS_DENOMINATOR)?;
        Ok(ShareSplit {
            vault,
            creator: shares - vault,
        })
    }

    /// Unlock time for a lock created at `now`
    pub fn unlock_time(&self, now: u64) -> u64 {
        now.saturating_add(self.lock_duration_secs)
    }

    /// Build the vault lock request for a graduated token
    pub fn vault_lock_request(
        &self,
        token_id: TokenId,
        pair_id: PairId,
        amount: u128,
        now: u64,
    ) -> LockRequest {
        LockRequest {
            token_id,
            pair_id,
            category: BeneficiaryCategory::Vault,
            amount,
            created_at: now,
            unlock_time: self.unlock_time(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LOCK_DURATION_SECS, VAULT_SHARE_BPS};

    fn locker() -> VestingLocker {
        VestingLocker::new(VAULT_SHARE_BPS, LOCK_DURATION_SECS)
    }

    #[test]
    fn test_split_80_20() {
        let split = locker().split(1_000).unwrap();
        assert_eq!(split.vault, 800);
        assert_eq!(split.creator, 200);
    }

    #[test]
    fn test_split_remainder_goes_to_creator() {
        let split = locker().split(7).unwrap();
        assert_eq!(split.vault, 5);
        assert_eq!(split.creator, 2);
        assert_eq!(locker().split(0).unwrap(), ShareSplit { vault: 0, creator: 0 });
    }

    #[test]
    fn test_unlock_time_is_one_year_out() {
        let now = 1_700_000_000;
        assert_eq!(locker().unlock_time(now), now + 365 * 24 * 60 * 60);

        let request = locker().vault_lock_request(TokenId([1; 32]), PairId([2; 32]), 800, now);
        let lock = LiquidityLock::from_request(LockId([3; 32]), request);
        assert_eq!(lock.category, BeneficiaryCategory::Vault);
        assert!(!lock.is_unlockable(now));
        assert!(lock.is_unlockable(now + LOCK_DURATION_SECS));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_split_exact(shares in 0u128..u128::MAX / 10_000) {
                let split = locker().split(shares).unwrap();
                prop_assert_eq!(split.vault + split.creator, shares);
                prop_assert_eq!(split.vault, shares * 80 / 100);
            }
        }
    }
}
