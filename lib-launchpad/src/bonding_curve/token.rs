//! Bonding Curve Token
//!
//! Per-token record plus the pure quote logic of the trading engine.
//!
//! # Invariants
//! - `creator` is fixed at creation
//! - `total_supply` and `reserve_balance` change only through `apply_trade`
//!   while the phase is `Trading`, and are frozen once `Graduated`
//! - `reserve_balance >= F(total_supply) - F(0)`: buys credit the full net
//!   input, which is never less than the curve cost of the minted tokens

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fixed_point::mul_div;
use super::types::{
    CurveParams, CurveStats, GraduationRecord, Phase, TokenMetadata, Trade, TradeDirection,
};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{Address, TokenId, BPS_DENOMINATOR};

/// Maximum token name length
pub const MAX_NAME_LEN: usize = 32;

/// Maximum token symbol length
pub const MAX_SYMBOL_LEN: usize = 10;

/// Launched token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    // === Identity ===
    pub token_id: TokenId,
    pub name: String,
    pub symbol: String,
    pub metadata: TokenMetadata,
    pub creator: Address,

    // === Curve parameters ===
    pub curve: CurveParams,
    /// Creator royalty on trade volume, basis points
    pub royalty_bps: u16,

    // === Mutable state ===
    pub phase: Phase,
    pub total_supply: u128,
    pub reserve_balance: u128,
    /// Curve-minted token balances by holder
    pub balances: BTreeMap<Address, u128>,
    pub trade_count: u64,

    // === Lifecycle ===
    pub created_at_block: u64,
    pub created_at_timestamp: u64,
    /// Populated exactly once, when the token graduates
    pub graduation: Option<GraduationRecord>,
}

impl Token {
    /// Build a fresh token in the `Trading` phase with zero supply and reserve
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        token_id: TokenId,
        name: String,
        symbol: String,
        metadata: TokenMetadata,
        creator: Address,
        curve: CurveParams,
        royalty_bps: u16,
        created_at_block: u64,
        created_at_timestamp: u64,
    ) -> LaunchpadResult<Self> {
        validate_name_and_symbol(&name, &symbol)?;
        curve.validate()?;

        Ok(Self {
            token_id,
            name,
            symbol,
            metadata,
            creator,
            curve,
            royalty_bps,
            phase: Phase::Trading,
            total_supply: 0,
            reserve_balance: 0,
            balances: BTreeMap::new(),
            trade_count: 0,
            created_at_block,
            created_at_timestamp,
            graduation: None,
        })
    }

    /// Spot price at the current supply
    pub fn current_price(&self) -> LaunchpadResult<u128> {
        self.curve.price(self.total_supply)
    }

    /// Curve-minted balance held by `holder`
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Quote a buy of `gross_in` base asset.
    ///
    /// Fee and royalty are both taken from the gross input before the curve
    /// displacement is solved, so the tokens out reflect only net capital.
    pub fn quote_buy(
        &self,
        trader: Address,
        gross_in: u128,
        trade_fee_bps: u16,
    ) -> LaunchpadResult<Trade> {
        self.phase.require_trading()?;
        if gross_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let (fee, royalty, net) = self.split_gross(gross_in, trade_fee_bps)?;
        if net == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let tokens_out = self.curve.tokens_for_cost(self.total_supply, net)?;
        if tokens_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let supply_after = self
            .total_supply
            .checked_add(tokens_out)
            .ok_or(LaunchpadError::Overflow)?;
        let reserve_after = self
            .reserve_balance
            .checked_add(net)
            .ok_or(LaunchpadError::Overflow)?;

        Ok(Trade {
            direction: TradeDirection::Buy,
            trader,
            base_amount: gross_in,
            token_amount: tokens_out,
            fee,
            royalty,
            reserve_delta: net,
            supply_after,
            reserve_after,
            price_after: self.curve.price(supply_after)?,
        })
    }

    /// Quote a sell of `tokens_in` back to the curve.
    ///
    /// The curve pays `cost(s0 - tokens_in, s0)`; fee and royalty come out of
    /// that gross payout and the seller receives the remainder.
    pub fn quote_sell(
        &self,
        trader: Address,
        tokens_in: u128,
        trade_fee_bps: u16,
    ) -> LaunchpadResult<Trade> {
        self.phase.require_trading()?;
        if tokens_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let held = self.balance_of(&trader);
        if tokens_in > held {
            return Err(LaunchpadError::InsufficientBalance {
                required: tokens_in,
                available: held,
            });
        }

        let supply_after = self
            .total_supply
            .checked_sub(tokens_in)
            .ok_or(LaunchpadError::Overflow)?;
        let gross_out = self.curve.curve_cost(supply_after, self.total_supply)?;
        if gross_out > self.reserve_balance {
            return Err(LaunchpadError::InsufficientReserve {
                required: gross_out,
                available: self.reserve_balance,
            });
        }

        let (fee, royalty, net) = self.split_gross(gross_out, trade_fee_bps)?;
        if net == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        Ok(Trade {
            direction: TradeDirection::Sell,
            trader,
            base_amount: net,
            token_amount: tokens_in,
            fee,
            royalty,
            reserve_delta: gross_out,
            supply_after,
            reserve_after: self.reserve_balance - gross_out,
            price_after: self.curve.price(supply_after)?,
        })
    }

    /// Apply a quoted trade to supply, reserve and holder balances
    pub fn apply_trade(&mut self, trade: &Trade) -> LaunchpadResult<()> {
        self.phase.require_trading()?;

        match trade.direction {
            TradeDirection::Buy => {
                let balance = self.balances.entry(trade.trader).or_insert(0);
                *balance = balance
                    .checked_add(trade.token_amount)
                    .ok_or(LaunchpadError::Overflow)?;
            }
            TradeDirection::Sell => {
                let held = self.balance_of(&trade.trader);
                let remaining = held.checked_sub(trade.token_amount).ok_or(
                    LaunchpadError::InsufficientBalance {
                        required: trade.token_amount,
                        available: held,
                    },
                )?;
                if remaining == 0 {
                    self.balances.remove(&trade.trader);
                } else {
                    self.balances.insert(trade.trader, remaining);
                }
            }
        }

        self.total_supply = trade.supply_after;
        self.reserve_balance = trade.reserve_after;
        self.trade_count += 1;
        Ok(())
    }

    /// Get current statistics against a graduation threshold
    pub fn stats(&self, graduation_threshold: u128) -> LaunchpadResult<CurveStats> {
        let progress = if graduation_threshold == 0 {
            BPS_DENOMINATOR
        } else {
            mul_div(self.reserve_balance, BPS_DENOMINATOR, graduation_threshold)?
                .min(BPS_DENOMINATOR)
        };

        Ok(CurveStats {
            total_supply: self.total_supply,
            reserve_balance: self.reserve_balance,
            current_price: self.current_price()?,
            graduation_progress_bps: progress as u16,
            phase: self.phase,
        })
    }

    /// (fee, royalty, net) of a gross amount; both deductions use the gross base
    fn split_gross(&self, gross: u128, trade_fee_bps: u16) -> LaunchpadResult<(u128, u128, u128)> {
        let fee = mul_div(gross, trade_fee_bps as u128, BPS_DENOMINATOR)?;
        let royalty = mul_div(gross, self.royalty_bps as u128, BPS_DENOMINATOR)?;
        let net = gross
            .checked_sub(fee)
            .and_then(|v| v.checked_sub(royalty))
            .ok_or(LaunchpadError::InvalidParameters(
                "fee and royalty exceed the trade amount".to_string(),
            ))?;
        Ok((fee, royalty, net))
    }
}

fn validate_name_and_symbol(name: &str, symbol: &str) -> LaunchpadResult<()> {
    if name.trim().is_empty() {
        return Err(LaunchpadError::InvalidParameters("Name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(LaunchpadError::InvalidParameters(format!(
            "Name too long (max {})",
            MAX_NAME_LEN
        )));
    }
    if symbol.is_empty() {
        return Err(LaunchpadError::InvalidParameters("Symbol cannot be empty".to_string()));
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(LaunchpadError::InvalidParameters(format!(
            "Symbol too long (max {})",
            MAX_SYMBOL_LEN
        )));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LaunchpadError::InvalidParameters(
            "Symbol must be ASCII alphanumeric".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonding_curve::types::{CurveConstants, CurveKind};
    use crate::primitives::WAD;

    const FEE_BPS: u16 = 100;

    fn addr(id: u8) -> Address {
        Address([id; 32])
    }

    fn test_token(kind: CurveKind, royalty_bps: u16) -> Token {
        Token::new(
            TokenId([1u8; 32]),
            "Test Token".to_string(),
            "TEST".to_string(),
            TokenMetadata::default(),
            addr(1),
            CurveParams::new(kind, WAD / 1000, CurveConstants::default()),
            royalty_bps,
            100,
            1_600_000_000,
        )
        .unwrap()
    }

    #[test]
    fn test_new_token() {
        let token = test_token(CurveKind::Linear, 200);
        assert_eq!(token.phase, Phase::Trading);
        assert_eq!(token.total_supply, 0);
        assert_eq!(token.reserve_balance, 0);
        assert!(token.graduation.is_none());
    }

    #[test]
    fn test_name_and_symbol_validation() {
        let curve = CurveParams::new(CurveKind::Linear, WAD, CurveConstants::default());
        let make = |name: &str, symbol: &str| {
            Token::new(
                TokenId([1u8; 32]),
                name.to_string(),
                symbol.to_string(),
                TokenMetadata::default(),
                addr(1),
                curve,
                0,
                0,
                0,
            )
        };
        assert!(make("", "TEST").is_err());
        assert!(make("Test", "").is_err());
        assert!(make("Test", "WAYTOOLONGSYM").is_err());
        assert!(make("Test", "T-1").is_err());
        assert!(make(&"x".repeat(33), "TEST").is_err());
        assert!(make("Test", "TEST1").is_ok());
    }

    #[test]
    fn test_buy_deducts_fee_and_royalty_from_gross() {
        let mut token = test_token(CurveKind::Linear, 200);
        let trade = token.quote_buy(addr(2), 50 * WAD, FEE_BPS).unwrap();

        assert_eq!(trade.fee, WAD / 2);
        assert_eq!(trade.royalty, WAD);
        assert_eq!(trade.reserve_delta, 48 * WAD + WAD / 2);
        assert!(trade.token_amount > 0);
        assert!(token.curve.curve_cost(0, trade.token_amount).unwrap() <= trade.reserve_delta);

        token.apply_trade(&trade).unwrap();
        assert_eq!(token.total_supply, trade.token_amount);
        assert_eq!(token.reserve_balance, 48 * WAD + WAD / 2);
        assert_eq!(token.balance_of(&addr(2)), trade.token_amount);
        assert_eq!(token.trade_count, 1);
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let token = test_token(CurveKind::Linear, 0);
        assert_eq!(
            token.quote_buy(addr(2), 0, FEE_BPS),
            Err(LaunchpadError::ZeroAmount)
        );
        assert_eq!(
            token.quote_sell(addr(2), 0, FEE_BPS),
            Err(LaunchpadError::ZeroAmount)
        );
    }

    #[test]
    fn test_sell_requires_balance() {
        let mut token = test_token(CurveKind::Linear, 0);
        let buy = token.quote_buy(addr(2), 10 * WAD, FEE_BPS).unwrap();
        token.apply_trade(&buy).unwrap();

        let result = token.quote_sell(addr(3), 1, FEE_BPS);
        assert!(matches!(result, Err(LaunchpadError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_round_trip_never_profits() {
        for kind in [CurveKind::Linear, CurveKind::Exponential, CurveKind::Sigmoid] {
            let mut token = test_token(kind, 200);
            let spent = 20 * WAD;
            let buy = token.quote_buy(addr(2), spent, FEE_BPS).unwrap();
            token.apply_trade(&buy).unwrap();

            let sell = token.quote_sell(addr(2), buy.token_amount, FEE_BPS).unwrap();
            assert!(sell.base_amount < spent, "{}: {} >= {}", kind, sell.base_amount, spent);
            token.apply_trade(&sell).unwrap();

            assert_eq!(token.total_supply, 0);
            assert_eq!(token.balance_of(&addr(2)), 0);
        }
    }

    #[test]
    fn test_graduated_token_rejects_trades() {
        let mut token = test_token(CurveKind::Linear, 0);
        let buy = token.quote_buy(addr(2), 10 * WAD, FEE_BPS).unwrap();
        token.apply_trade(&buy).unwrap();
        token.phase = Phase::Graduated;

        assert_eq!(
            token.quote_buy(addr(2), WAD, FEE_BPS),
            Err(LaunchpadError::AlreadyGraduated)
        );
        assert_eq!(
            token.quote_sell(addr(2), 1, FEE_BPS),
            Err(LaunchpadError::AlreadyGraduated)
        );
        assert_eq!(token.apply_trade(&buy), Err(LaunchpadError::AlreadyGraduated));
    }

    #[test]
    fn test_stats_progress() {
        let mut token = test_token(CurveKind::Linear, 0);
        let buy = token.quote_buy(addr(2), 50 * WAD, 0).unwrap();
        token.apply_trade(&buy).unwrap();

        let stats = token.stats(100 * WAD).unwrap();
        assert_eq!(stats.graduation_progress_bps, 5_000);
        assert_eq!(stats.phase, Phase::Trading);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_buy_then_sell_loses_value(amount in 1_000_000_000_000_000u128..90 * WAD,
                                              royalty in 0u16..=500u16) {
                let mut token = test_token(CurveKind::Linear, royalty);
                let buy = token.quote_buy(addr(2), amount, FEE_BPS).unwrap();
                token.apply_trade(&buy).unwrap();
                let sell = token.quote_sell(addr(2), buy.token_amount, FEE_BPS).unwrap();
                prop_assert!(sell.base_amount <= amount);
                prop_assert!(sell.reserve_delta <= token.reserve_balance);
            }
        }
    }
}
