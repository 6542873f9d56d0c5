//! Compensation journal for multi-step external effects
//!
//! Each successful collaborator call records the action that undoes it. On
//! commit the journal is discarded; on rollback it is replayed in reverse.
//! A call that returns after its time budget counts as failed, and its effect
//! is still journaled so rollback removes it.

use std::time::{Duration, Instant};
use tracing::{error, warn};

use crate::collaborators::{calls, Collaborators};
use crate::errors::{CollaboratorError, CollaboratorResult};
use crate::primitives::{Address, LockId, PairId, TokenId};

/// Action that reverses one committed external effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    RefundFee { token_id: TokenId, amount: u128 },
    ReclaimPayment { recipient: Address, amount: u128 },
    RemovePair { pair_id: PairId },
    RemoveLiquidity { pair_id: PairId, shares: u128, holder: Address },
    /// Move shares from `from` back to `to`
    ReturnShares { pair_id: PairId, from: Address, to: Address, amount: u128 },
    CancelLock { lock_id: LockId },
}

impl Compensation {
    fn call_name(&self) -> &'static str {
        match self {
            Compensation::RefundFee { .. } => calls::REFUND_FEE,
            Compensation::ReclaimPayment { .. } => calls::RECLAIM_PAYMENT,
            Compensation::RemovePair { .. } => calls::REMOVE_PAIR,
            Compensation::RemoveLiquidity { .. } => calls::REMOVE_LIQUIDITY,
            Compensation::ReturnShares { .. } => calls::TRANSFER_SHARES,
            Compensation::CancelLock { .. } => calls::CANCEL_LOCK,
        }
    }

    fn apply(&self, collaborators: &Collaborators) -> CollaboratorResult<()> {
        match self {
            Compensation::RefundFee { token_id, amount } => {
                collaborators.treasury.refund_fee(token_id, *amount)
            }
            Compensation::ReclaimPayment { recipient, amount } => {
                collaborators.payments.reclaim_payment(recipient, *amount)
            }
            Compensation::RemovePair { pair_id } => collaborators.amm.remove_pair(pair_id),
            Compensation::RemoveLiquidity {
                pair_id,
                shares,
                holder,
            } => collaborators
                .amm
                .remove_liquidity(pair_id, *shares, holder)
                .map(|_| ()),
            Compensation::ReturnShares {
                pair_id,
                from,
                to,
                amount,
            } => collaborators.amm.transfer_shares(pair_id, from, to, *amount),
            Compensation::CancelLock { lock_id } => collaborators.lock_vault.cancel_lock(lock_id),
        }
    }
}

/// Journal of external effects staged by one operation
pub struct Saga<'a> {
    collaborators: &'a Collaborators,
    budget: Duration,
    journal: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(collaborators: &'a Collaborators, budget: Duration) -> Self {
        Self {
            collaborators,
            budget,
            journal: Vec::new(),
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        self.collaborators
    }

    /// Run one collaborator call, journaling `undo` for its result on success
    pub fn step<T>(
        &mut self,
        call: &'static str,
        effect: impl FnOnce(&Collaborators) -> CollaboratorResult<T>,
        undo: impl FnOnce(&T) -> Option<Compensation>,
    ) -> CollaboratorResult<T> {
        let started = Instant::now();
        let result = effect(self.collaborators);
        let elapsed = started.elapsed();

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!("External call {} failed: {}", call, e);
                return Err(e);
            }
        };
        if let Some(compensation) = undo(&value) {
            self.journal.push(compensation);
        }
        if elapsed > self.budget {
            warn!(
                "External call {} exceeded its budget ({}ms > {}ms)",
                call,
                elapsed.as_millis(),
                self.budget.as_millis()
            );
            return Err(CollaboratorError::Timeout {
                call,
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            });
        }
        Ok(value)
    }

    /// Number of journaled effects
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Keep every staged effect
    pub fn commit(self) {}

    /// Undo every staged effect, newest first.
    ///
    /// Returns the compensations that failed; each is logged and never
    /// replaces the error that triggered the rollback.
    pub fn rollback(self) -> Vec<(Compensation, CollaboratorError)> {
        let mut failures = Vec::new();
        for compensation in self.journal.into_iter().rev() {
            if let Err(e) = compensation.apply(self.collaborators) {
                error!(
                    "Compensation {} failed: {} ({:?})",
                    compensation.call_name(),
                    e,
                    compensation
                );
                failures.push((compensation, e));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AmmGateway, InMemoryCollaborators};
    use crate::primitives::WAD;

    fn budget() -> Duration {
        Duration::from_millis(500)
    }

    #[test]
    fn test_rollback_reverses_effects() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let token = TokenId([1u8; 32]);
        let creator = Address([2u8; 32]);

        let mut saga = Saga::new(&collaborators, budget());
        saga.step(
            calls::RECEIVE_FEE,
            |c| c.treasury.receive_fee(&token, 10),
            |_| Some(Compensation::RefundFee { token_id: token, amount: 10 }),
        )
        .unwrap();
        saga.step(
            calls::PAY,
            |c| c.payments.pay(&creator, 5),
            |_| Some(Compensation::ReclaimPayment { recipient: creator, amount: 5 }),
        )
        .unwrap();
        assert_eq!(saga.len(), 2);

        assert!(saga.rollback().is_empty());
        assert_eq!(memory.treasury.balance(), 0);
        assert_eq!(memory.payments.balance_of(&creator), 0);
    }

    #[test]
    fn test_commit_keeps_effects() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let token = TokenId([1u8; 32]);

        let mut saga = Saga::new(&collaborators, budget());
        saga.step(
            calls::RECEIVE_FEE,
            |c| c.treasury.receive_fee(&token, 10),
            |_| Some(Compensation::RefundFee { token_id: token, amount: 10 }),
        )
        .unwrap();
        saga.commit();
        assert_eq!(memory.treasury.balance(), 10);
    }

    #[test]
    fn test_slow_call_times_out_and_is_compensated() {
        let memory = InMemoryCollaborators::new();
        memory.plan.delay(calls::RECEIVE_FEE, Duration::from_millis(50));
        let collaborators = memory.collaborators();
        let token = TokenId([1u8; 32]);

        let mut saga = Saga::new(&collaborators, Duration::from_millis(5));
        let result = saga.step(
            calls::RECEIVE_FEE,
            |c| c.treasury.receive_fee(&token, 10),
            |_| Some(Compensation::RefundFee { token_id: token, amount: 10 }),
        );
        assert!(matches!(result, Err(CollaboratorError::Timeout { call: "receive_fee", .. })));
        assert_eq!(memory.treasury.balance(), 10);

        saga.rollback();
        assert_eq!(memory.treasury.balance(), 0);
    }

    #[test]
    fn test_rollback_unwinds_pool_in_reverse() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let locker = Address([3u8; 32]);
        let creator = Address([4u8; 32]);

        let mut saga = Saga::new(&collaborators, budget());
        let pair = saga
            .step(
                calls::CREATE_PAIR,
                |c| c.amm.create_pair(&[1u8; 32], &[2u8; 32]),
                |handle| {
                    handle
                        .created
                        .then_some(Compensation::RemovePair { pair_id: handle.pair_id })
                },
            )
            .unwrap()
            .pair_id;
        let shares = saga
            .step(
                calls::ADD_LIQUIDITY,
                |c| c.amm.add_liquidity(&pair, 4 * WAD, WAD, &locker),
                |shares| {
                    Some(Compensation::RemoveLiquidity {
                        pair_id: pair,
                        shares: *shares,
                        holder: locker,
                    })
                },
            )
            .unwrap();
        saga.step(
            calls::TRANSFER_SHARES,
            |c| c.amm.transfer_shares(&pair, &locker, &creator, shares / 2),
            |_| {
                Some(Compensation::ReturnShares {
                    pair_id: pair,
                    from: creator,
                    to: locker,
                    amount: shares / 2,
                })
            },
        )
        .unwrap();
        assert_eq!(saga.len(), 3);

        assert!(saga.rollback().is_empty());
        assert!(memory.amm.pool(&pair).is_none());
    }

    #[test]
    fn test_existing_pair_is_not_removed() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let pair = memory.amm.create_pair(&[1u8; 32], &[2u8; 32]).unwrap().pair_id;

        let mut saga = Saga::new(&collaborators, budget());
        saga.step(
            calls::CREATE_PAIR,
            |c| c.amm.create_pair(&[1u8; 32], &[2u8; 32]),
            |handle| {
                handle
                    .created
                    .then_some(Compensation::RemovePair { pair_id: handle.pair_id })
            },
        )
        .unwrap();
        assert!(saga.is_empty());
        saga.rollback();
        assert!(memory.amm.pool(&pair).is_some());
    }

    #[test]
    fn test_failed_compensation_is_reported() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let token = TokenId([1u8; 32]);

        let mut saga = Saga::new(&collaborators, budget());
        saga.step(
            calls::RECEIVE_FEE,
            |c| c.treasury.receive_fee(&token, 10),
            |_| Some(Compensation::RefundFee { token_id: token, amount: 10 }),
        )
        .unwrap();
        memory.plan.fail_always(calls::REFUND_FEE);

        let failures = saga.rollback();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, Compensation::RefundFee { token_id: token, amount: 10 });
    }
}
