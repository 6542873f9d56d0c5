//! Liquidity Migrator
//!
//! Seeds the external market from a graduating token's curve state and hands
//! the minted pool shares to the vesting locker. Runs inside the triggering
//! trade on a staged copy of the token; every external effect goes through
//! the trade's [`Saga`] so a failure anywhere unwinds the whole trade.
//!
//! ## Steps
//! 1. Flip the staged phase to `Graduated`
//! 2. Base side = full reserve; token side = reserve / spot price
//! 3. Create the pair and add liquidity, minting shares to the locker
//! 4. Split shares 80 / 20; move the creator share to the creator and the
//!    vault share into the lock vault's custody, then lock it
//! 5. Record the graduation on the staged token
//!
//! Shares only ever move between AMM holders, so after step 4 the locker
//! holds nothing and creator plus custody account for every minted share.

use tracing::{debug, info};

use super::saga::{Compensation, Saga};
use super::vesting::{ShareSplit, VestingLocker};
use crate::bonding_curve::fixed_point::mul_div;
use crate::bonding_curve::token::Token;
use crate::bonding_curve::types::{GraduationRecord, Phase};
use crate::collaborators::calls;
use crate::errors::{
    CollaboratorError, CollaboratorResult, LaunchpadError, LaunchpadResult, MigrationStage,
};
use crate::primitives::{base_asset_id, Address, PairId, TxContext, WAD};

/// Liquidity Migrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityMigrator {
    /// Protocol address that receives minted pool shares
    pub locker: Address,
    pub vesting: VestingLocker,
}

/// Amounts seeded into the new pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedAmounts {
    pub base_side: u128,
    pub token_side: u128,
}

impl LiquidityMigrator {
    pub fn new(locker: Address, vesting: VestingLocker) -> Self {
        Self { locker, vesting }
    }

    /// Both pool sides from curve state: the full reserve and its value in
    /// tokens at the final spot price
    pub fn seed_amounts(&self, token: &Token) -> LaunchpadResult<SeedAmounts> {
        let base_side = token.reserve_balance;
        let price = token.current_price()?;
        let token_side = mul_div(base_side, WAD, price)?;
        Ok(SeedAmounts {
            base_side,
            token_side,
        })
    }

    /// Migrate a staged token's liquidity; returns the graduation record
    pub fn migrate(
        &self,
        saga: &mut Saga<'_>,
        staged: &mut Token,
        ctx: &TxContext,
        threshold: u128,
    ) -> LaunchpadResult<GraduationRecord> {
        // (1) the flip is the first effect; nothing below sees a trading token
        staged.phase = Phase::Graduated;

        // (2)
        let seed = self.seed_amounts(staged)?;
        debug!(
            "Migrating token {}: base_side={}, token_side={}",
            staged.token_id, seed.base_side, seed.token_side
        );

        // (3)
        let token_asset = *staged.token_id.as_bytes();
        let pair_id = saga
            .step(
                calls::CREATE_PAIR,
                |c| c.amm.create_pair(&token_asset, &base_asset_id()),
                // a pair that existed before this trade is left alone
                |handle| {
                    handle
                        .created
                        .then_some(Compensation::RemovePair { pair_id: handle.pair_id })
                },
            )
            .map_err(|e| failed(MigrationStage::CreatePair, e))?
            .pair_id;

        let locker = self.locker;
        let shares = saga
            .step(
                calls::ADD_LIQUIDITY,
                |c| c.amm.add_liquidity(&pair_id, seed.token_side, seed.base_side, &locker),
                |shares| {
                    Some(Compensation::RemoveLiquidity {
                        pair_id,
                        shares: *shares,
                        holder: locker,
                    })
                },
            )
            .map_err(|e| failed(MigrationStage::AddLiquidity, e))?;
        if shares == 0 {
            return Err(failed(
                MigrationStage::AddLiquidity,
                CollaboratorError::Rejected("no pool shares minted".to_string()),
            ));
        }

        // (4)
        let ShareSplit { vault, creator } = self.vesting.split(shares)?;
        let creator_address = staged.creator;
        if creator > 0 {
            move_shares(saga, pair_id, locker, creator_address, creator)
                .map_err(|e| failed(MigrationStage::CreatorShareTransfer, e))?;
        }

        let custody = saga.collaborators().lock_vault.custody_account();
        move_shares(saga, pair_id, locker, custody, vault)
            .map_err(|e| failed(MigrationStage::VaultCustody, e))?;

        let request = self
            .vesting
            .vault_lock_request(staged.token_id, pair_id, vault, ctx.timestamp);
        let unlock_time = request.unlock_time;
        let lock_id = saga
            .step(
                calls::LOCK,
                |c| c.lock_vault.lock(request),
                |lock_id| Some(Compensation::CancelLock { lock_id: *lock_id }),
            )
            .map_err(|e| failed(MigrationStage::VaultLock, e))?;

        // (5)
        let record = GraduationRecord {
            threshold,
            block_height: ctx.block_height,
            timestamp: ctx.timestamp,
            base_migrated: seed.base_side,
            tokens_migrated: seed.token_side,
            pair_id,
            lp_shares_minted: shares,
            vault_share: vault,
            creator_share: creator,
            lock_id,
            unlock_time,
        };
        staged.graduation = Some(record.clone());

        info!(
            "Token {} migrated to pair {}: {} shares ({} locked until {}, {} to creator)",
            staged.token_id, pair_id, shares, vault, unlock_time, creator
        );
        Ok(record)
    }
}

/// Transfer pool shares on the AMM, journaling the transfer back
fn move_shares(
    saga: &mut Saga<'_>,
    pair_id: PairId,
    from: Address,
    to: Address,
    amount: u128,
) -> CollaboratorResult<()> {
    saga.step(
        calls::TRANSFER_SHARES,
        |c| c.amm.transfer_shares(&pair_id, &from, &to, amount),
        |_| {
            Some(Compensation::ReturnShares {
                pair_id,
                from: to,
                to: from,
                amount,
            })
        },
    )
}

fn failed(stage: MigrationStage, source: CollaboratorError) -> LaunchpadError {
    LaunchpadError::MigrationFailed { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonding_curve::types::{CurveConstants, CurveKind, CurveParams, TokenMetadata};
    use crate::collaborators::memory::MINIMUM_LIQUIDITY;
    use crate::collaborators::{AmmGateway, InMemoryCollaborators, LockVault};
    use crate::config::{LOCK_DURATION_SECS, VAULT_SHARE_BPS};
    use crate::primitives::TokenId;
    use std::time::Duration;

    fn graduating_token() -> Token {
        let mut token = Token::new(
            TokenId([1u8; 32]),
            "Grad".to_string(),
            "GRAD".to_string(),
            TokenMetadata::default(),
            Address([9u8; 32]),
            CurveParams::new(CurveKind::Linear, WAD / 1000, CurveConstants::default()),
            200,
            1,
            1_000,
        )
        .unwrap();
        let buy = token.quote_buy(Address([2u8; 32]), 110 * WAD, 0).unwrap();
        token.apply_trade(&buy).unwrap();
        token
    }

    fn migrator() -> LiquidityMigrator {
        LiquidityMigrator::new(
            Address([7u8; 32]),
            VestingLocker::new(VAULT_SHARE_BPS, LOCK_DURATION_SECS),
        )
    }

    #[test]
    fn test_migrate_seeds_pool_and_locks_vault_share() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let mut staged = graduating_token();
        let reserve = staged.reserve_balance;
        let ctx = TxContext::new(Address([2u8; 32]), 50, 1_700_000_000);

        let mut saga = Saga::new(&collaborators, Duration::from_secs(2));
        let record = migrator().migrate(&mut saga, &mut staged, &ctx, 100 * WAD).unwrap();
        saga.commit();

        assert_eq!(staged.phase, Phase::Graduated);
        assert_eq!(staged.graduation.as_ref(), Some(&record));
        assert_eq!(record.base_migrated, reserve);
        assert_eq!(record.vault_share + record.creator_share, record.lp_shares_minted);
        assert_eq!(record.vault_share, record.lp_shares_minted * 80 / 100);
        assert_eq!(record.unlock_time, ctx.timestamp + LOCK_DURATION_SECS);

        let pool = memory.amm.pool(&record.pair_id).unwrap();
        assert_eq!(pool.reserve_b, reserve);
        let lock = memory.lock_vault.get_lock(&record.lock_id).unwrap();
        assert_eq!(lock.amount, record.vault_share);

        let pair = record.pair_id;
        let custody = memory.lock_vault.custody_account();
        assert_eq!(memory.amm.shares_of(&pair, &Address([7u8; 32])), 0);
        assert_eq!(memory.amm.shares_of(&pair, &staged.creator), record.creator_share);
        assert_eq!(memory.amm.shares_of(&pair, &custody), record.vault_share);
        assert_eq!(pool.total_shares, record.lp_shares_minted + MINIMUM_LIQUIDITY);
    }

    #[test]
    fn test_lock_failure_unwinds_migration() {
        let memory = InMemoryCollaborators::new();
        memory.plan.fail_always(calls::LOCK);
        let collaborators = memory.collaborators();
        let mut staged = graduating_token();
        let ctx = TxContext::new(Address([2u8; 32]), 50, 1_700_000_000);

        let mut saga = Saga::new(&collaborators, Duration::from_secs(2));
        let err = migrator()
            .migrate(&mut saga, &mut staged, &ctx, 100 * WAD)
            .unwrap_err();
        assert!(matches!(
            err,
            LaunchpadError::MigrationFailed { stage: MigrationStage::VaultLock, .. }
        ));
        assert!(saga.rollback().is_empty());

        let pair_id = PairId::derive(staged.token_id.as_bytes(), &base_asset_id());
        assert!(memory.amm.pool(&pair_id).is_none());
        assert_eq!(memory.amm.pool_count(), 0);
    }

    #[test]
    fn test_existing_pair_survives_rollback() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let mut staged = graduating_token();
        let pair_id = memory
            .amm
            .create_pair(staged.token_id.as_bytes(), &base_asset_id())
            .unwrap()
            .pair_id;
        memory.plan.fail_always(calls::ADD_LIQUIDITY);
        let ctx = TxContext::new(Address([2u8; 32]), 50, 1_700_000_000);

        let mut saga = Saga::new(&collaborators, Duration::from_secs(2));
        assert!(migrator().migrate(&mut saga, &mut staged, &ctx, 100 * WAD).is_err());
        assert!(saga.rollback().is_empty());
        assert!(memory.amm.pool(&pair_id).is_some());
    }
}
