//! Trading Engine
//!
//! Executes buys and sells against a token's curve. The caller holds the
//! token's lock for the whole call; the engine works on a staged clone and
//! writes it back only after every external effect (fee routing, royalty,
//! seller payout and, when the threshold is crossed, migration) succeeded.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bonding_curve::token::Token;
use crate::bonding_curve::types::{GraduationRecord, Trade, TradeDirection};
use crate::collaborators::{calls, Collaborators};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::graduation::migrator::LiquidityMigrator;
use crate::graduation::monitor::GraduationMonitor;
use crate::graduation::saga::{Compensation, Saga};
use crate::primitives::TxContext;

/// Result of a committed trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub trade: Trade,
    /// Set when this trade graduated the token
    pub graduation: Option<GraduationRecord>,
}

impl TradeReceipt {
    /// Tokens minted by a buy or burned by a sell
    pub fn tokens(&self) -> u128 {
        self.trade.token_amount
    }

    /// Gross input of a buy or net payout of a sell
    pub fn base_amount(&self) -> u128 {
        self.trade.base_amount
    }
}

/// Trading Engine
#[derive(Debug, Clone)]
pub struct TradingEngine {
    trade_fee_bps: u16,
    monitor: GraduationMonitor,
    migrator: LiquidityMigrator,
    collaborators: Collaborators,
    call_budget: Duration,
}

impl TradingEngine {
    pub fn new(
        trade_fee_bps: u16,
        monitor: GraduationMonitor,
        migrator: LiquidityMigrator,
        collaborators: Collaborators,
        call_budget: Duration,
    ) -> Self {
        Self {
            trade_fee_bps,
            monitor,
            migrator,
            collaborators,
            call_budget,
        }
    }

    pub fn trade_fee_bps(&self) -> u16 {
        self.trade_fee_bps
    }

    pub fn monitor(&self) -> &GraduationMonitor {
        &self.monitor
    }

    /// Quote a buy without committing
    pub fn quote_buy(&self, token: &Token, ctx: &TxContext, base_in: u128) -> LaunchpadResult<Trade> {
        let quote = token.quote_buy(ctx.caller, base_in, self.trade_fee_bps)?;
        debug!(
            "Quote buy {}: {} base -> {} tokens",
            token.token_id, base_in, quote.token_amount
        );
        Ok(quote)
    }

    /// Quote a sell without committing
    pub fn quote_sell(&self, token: &Token, ctx: &TxContext, tokens_in: u128) -> LaunchpadResult<Trade> {
        let quote = token.quote_sell(ctx.caller, tokens_in, self.trade_fee_bps)?;
        debug!(
            "Quote sell {}: {} tokens -> {} base",
            token.token_id, tokens_in, quote.base_amount
        );
        Ok(quote)
    }

    /// Buy tokens with `base_in` gross base asset
    pub fn buy(
        &self,
        token: &mut Token,
        ctx: &TxContext,
        base_in: u128,
        min_tokens_out: u128,
    ) -> LaunchpadResult<TradeReceipt> {
        let trade = token.quote_buy(ctx.caller, base_in, self.trade_fee_bps)?;
        if trade.token_amount < min_tokens_out {
            warn!(
                "Buy on {} rejected: {} tokens below minimum {}",
                token.token_id, trade.token_amount, min_tokens_out
            );
            return Err(LaunchpadError::SlippageExceeded {
                expected_min: min_tokens_out,
                actual: trade.token_amount,
            });
        }
        self.execute(token, ctx, trade)
    }

    /// Sell `tokens_in` back to the curve
    pub fn sell(
        &self,
        token: &mut Token,
        ctx: &TxContext,
        tokens_in: u128,
        min_base_out: u128,
    ) -> LaunchpadResult<TradeReceipt> {
        let trade = token.quote_sell(ctx.caller, tokens_in, self.trade_fee_bps)?;
        if trade.base_amount < min_base_out {
            warn!(
                "Sell on {} rejected: {} base below minimum {}",
                token.token_id, trade.base_amount, min_base_out
            );
            return Err(LaunchpadError::SlippageExceeded {
                expected_min: min_base_out,
                actual: trade.base_amount,
            });
        }
        self.execute(token, ctx, trade)
    }

    fn execute(&self, token: &mut Token, ctx: &TxContext, trade: Trade) -> LaunchpadResult<TradeReceipt> {
        let mut staged = token.clone();
        staged.apply_trade(&trade)?;

        let mut saga = Saga::new(&self.collaborators, self.call_budget);
        if let Err(e) = self.route_proceeds(&mut saga, &staged, &trade) {
            saga.rollback();
            return Err(e);
        }

        let graduation = if self
            .monitor
            .should_graduate(staged.phase, staged.reserve_balance)
        {
            info!(
                "Token {} reached graduation threshold ({} >= {})",
                staged.token_id, staged.reserve_balance, self.monitor.threshold
            );
            match self
                .migrator
                .migrate(&mut saga, &mut staged, ctx, self.monitor.threshold)
            {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Graduation of {} aborted: {}", staged.token_id, e);
                    saga.rollback();
                    return Err(e);
                }
            }
        } else {
            None
        };

        saga.commit();
        *token = staged;

        debug!(
            "{} {} on {}: base={}, tokens={}, fee={}, royalty={}, supply={}, reserve={}",
            trade.direction,
            trade.trader,
            token.token_id,
            trade.base_amount,
            trade.token_amount,
            trade.fee,
            trade.royalty,
            trade.supply_after,
            trade.reserve_after
        );
        Ok(TradeReceipt { trade, graduation })
    }

    /// Route fee to the treasury, royalty to the creator and, on sells, the
    /// net payout to the seller
    fn route_proceeds(&self, saga: &mut Saga<'_>, token: &Token, trade: &Trade) -> LaunchpadResult<()> {
        let token_id = token.token_id;
        let creator = token.creator;

        if trade.fee > 0 {
            let fee = trade.fee;
            saga.step(
                calls::RECEIVE_FEE,
                |c| c.treasury.receive_fee(&token_id, fee),
                |_| Some(Compensation::RefundFee { token_id, amount: fee }),
            )
            .map_err(|source| LaunchpadError::ExternalCallFailed {
                call: calls::RECEIVE_FEE,
                source,
            })?;
        }

        let mut payouts = Vec::with_capacity(2);
        if trade.royalty > 0 {
            payouts.push((creator, trade.royalty));
        }
        if trade.direction == TradeDirection::Sell {
            payouts.push((trade.trader, trade.base_amount));
        }

        for (recipient, amount) in payouts {
            saga.step(
                calls::PAY,
                |c| c.payments.pay(&recipient, amount),
                |_| Some(Compensation::ReclaimPayment { recipient, amount }),
            )
            .map_err(|source| LaunchpadError::ExternalCallFailed {
                call: calls::PAY,
                source,
            })?;
        }

        Ok(())
    }
}
