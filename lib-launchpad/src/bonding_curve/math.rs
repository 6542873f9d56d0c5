//! Curve pricing and cost integrals
//!
//! Every cost is the difference of one antiderivative `F` evaluated at two
//! supply points, so `cost(a, b) + cost(b, c) == cost(a, c)` and
//! `cost(a, b) == -cost(b, a)` hold exactly, not just within rounding.
//!
//! | Kind        | price(s)                      | F(s)                          |
//! |-------------|-------------------------------|-------------------------------|
//! | Linear      | p0 + slope·s                  | p0·s + slope·s²/2             |
//! | Exponential | p0·e^(c·s), c = ln g          | p0·e^(c·s) / c                |
//! | Sigmoid     | 2·p0 / (1 + e^(-k·(s-m)))     | (2·p0/k)·ln(1 + e^(k·(s-m)))  |

use super::fixed_point::{exp_wad, mul_wad, mul_wad_signed, narrow, softplus_wad};
use super::types::{CurveKind, CurveParams};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{U256, WAD};

impl CurveParams {
    /// Spot price at `supply`, in base-asset WAD per whole token
    pub fn price(&self, supply: u128) -> LaunchpadResult<u128> {
        let p0 = self.initial_price;
        match self.kind {
            CurveKind::Linear => p0
                .checked_add(mul_wad(self.constants.linear_slope, supply)?)
                .ok_or(LaunchpadError::Overflow),
            CurveKind::Exponential => {
                let growth = self.exponential_exponent(supply)?;
                narrow(U256::from(p0) * growth / U256::from(WAD))
            }
            CurveKind::Sigmoid => {
                let t = self.sigmoid_exponent(supply)?;
                let decay = exp_wad(-t)?;
                let numerator = U256::from(p0) * U256::from(2 * WAD);
                narrow(numerator / (U256::from(WAD) + decay))
            }
        }
    }

    /// Antiderivative of `price` evaluated at `supply`
    pub fn primitive(&self, supply: u128) -> LaunchpadResult<U256> {
        let p0 = U256::from(self.initial_price);
        let s = U256::from(supply);
        let wad = U256::from(WAD);
        match self.kind {
            CurveKind::Linear => {
                // (2·p0·s·WAD + slope·s²) / (2·WAD²), floored once
                let two = U256::from(2u8);
                let slope = U256::from(self.constants.linear_slope);
                let flat = p0
                    .checked_mul(s)
                    .and_then(|v| v.checked_mul(wad))
                    .and_then(|v| v.checked_mul(two));
                let ramp = slope.checked_mul(s).and_then(|v| v.checked_mul(s));
                let numerator = flat
                    .zip(ramp)
                    .and_then(|(flat, ramp)| flat.checked_add(ramp))
                    .ok_or(LaunchpadError::Overflow)?;
                Ok(numerator / (wad * wad * two))
            }
            CurveKind::Exponential => {
                let growth = self.exponential_exponent(supply)?;
                let log_growth = U256::from(self.constants.exponential_log_growth);
                Ok(p0.checked_mul(growth).ok_or(LaunchpadError::Overflow)? / log_growth)
            }
            CurveKind::Sigmoid => {
                let t = self.sigmoid_exponent(supply)?;
                let area = softplus_wad(t)?;
                let steepness = U256::from(self.constants.sigmoid_steepness);
                Ok((p0 * U256::from(2u8))
                    .checked_mul(area)
                    .ok_or(LaunchpadError::Overflow)?
                    / steepness)
            }
        }
    }

    /// Signed definite integral of `price` from `from` to `to`.
    ///
    /// Positive when `to > from`; `cost(a, b) == -cost(b, a)`.
    pub fn cost(&self, from: u128, to: u128) -> LaunchpadResult<i128> {
        let f_from = to_i128(narrow(self.primitive(from)?)?)?;
        let f_to = to_i128(narrow(self.primitive(to)?)?)?;
        f_to.checked_sub(f_from).ok_or(LaunchpadError::Overflow)
    }

    /// Base asset needed to move supply from `from` up to `to` (`from <= to`)
    pub fn curve_cost(&self, from: u128, to: u128) -> LaunchpadResult<u128> {
        if from > to {
            return Err(LaunchpadError::InvalidParameters(
                "curve_cost requires from <= to".to_string(),
            ));
        }
        let f_from = self.primitive(from)?;
        let f_to = self.primitive(to)?;
        if f_to <= f_from {
            return Ok(0);
        }
        narrow(f_to - f_from)
    }

    /// Largest token amount Δ with `curve_cost(supply, supply + Δ) <= budget`
    ///
    /// Price is non-decreasing, so Δ never exceeds `budget / price(supply)`;
    /// the search runs over `[0, budget / price(supply) + 1]`.
    pub fn tokens_for_cost(&self, supply: u128, budget: u128) -> LaunchpadResult<u128> {
        if budget == 0 {
            return Ok(0);
        }
        let spot = self.price(supply)?;
        if spot == 0 {
            return Err(LaunchpadError::InvalidParameters(
                "curve price is zero".to_string(),
            ));
        }

        let base = self.primitive(supply)?;
        let budget_u256 = U256::from(budget);
        let affordable = |delta: u128| -> bool {
            let Some(end) = supply.checked_add(delta) else {
                return false;
            };
            match self.primitive(end) {
                Ok(f_end) => f_end <= base || f_end - base <= budget_u256,
                Err(_) => false,
            }
        };

        let mut lo: u128 = 0;
        let mut hi = super::fixed_point::mul_div(budget, WAD, spot)?
            .checked_add(1)
            .ok_or(LaunchpadError::Overflow)?;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if affordable(mid) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(lo)
    }

    /// ln(g)·s as a signed WAD exponent
    fn exponential_exponent(&self, supply: u128) -> LaunchpadResult<U256> {
        let x = mul_wad(self.constants.exponential_log_growth, supply)?;
        exp_wad(to_i128(x)?)
    }

    /// k·(s - m) as a signed WAD exponent
    fn sigmoid_exponent(&self, supply: u128) -> LaunchpadResult<i128> {
        let offset = to_i128(supply)?
            .checked_sub(to_i128(self.constants.sigmoid_midpoint)?)
            .ok_or(LaunchpadError::Overflow)?;
        mul_wad_signed(self.constants.sigmoid_steepness, offset)
    }
}

fn to_i128(value: u128) -> LaunchpadResult<i128> {
    i128::try_from(value).map_err(|_| LaunchpadError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonding_curve::types::CurveConstants;

    const MILLI: u128 = WAD / 1000;

    fn params(kind: CurveKind) -> CurveParams {
        CurveParams::new(kind, MILLI, CurveConstants::default())
    }

    #[test]
    fn test_linear_curve_pricing() {
        let curve = params(CurveKind::Linear);
        assert_eq!(curve.price(0).unwrap(), MILLI);
        // 0.001 + 1e-8 × 1000 = 0.00101
        assert_eq!(curve.price(1_000 * WAD).unwrap(), 1_010_000_000_000_000);
        // ∫0..1000 = 0.001×1000 + 1e-8×1000²/2 = 1.005
        assert_eq!(curve.curve_cost(0, 1_000 * WAD).unwrap(), 1_005_000_000_000_000_000);
    }

    #[test]
    fn test_linear_primitive_floors_once() {
        // p0·s/WAD and slope·s²/(2·WAD²) are each just over / exactly one half
        let curve = CurveParams::new(
            CurveKind::Linear,
            WAD / 2 + 1,
            CurveConstants {
                linear_slope: WAD * WAD,
                ..CurveConstants::default()
            },
        );
        assert_eq!(curve.primitive(1).unwrap(), U256::from(1u8));
        assert_eq!(curve.cost(0, 1).unwrap(), 1);
    }

    #[test]
    fn test_exponential_starts_at_initial_price() {
        let curve = params(CurveKind::Exponential);
        assert_eq!(curve.price(0).unwrap(), MILLI);
        // 1.001^1000 ≈ 2.7169
        let p = curve.price(1_000 * WAD).unwrap();
        assert!(p > 2_716 * MILLI / 1000 && p < 2_718 * MILLI / 1000, "price {}", p);
    }

    #[test]
    fn test_sigmoid_midpoint_price_equals_initial_price() {
        let curve = params(CurveKind::Sigmoid);
        let midpoint = curve.constants.sigmoid_midpoint;
        assert_eq!(curve.price(midpoint).unwrap(), MILLI);
        assert!(curve.price(0).unwrap() < MILLI);
        assert!(curve.price(3 * midpoint).unwrap() < 2 * MILLI);
    }

    #[test]
    fn test_cost_sign_convention() {
        for kind in [CurveKind::Linear, CurveKind::Exponential, CurveKind::Sigmoid] {
            let curve = params(kind);
            let forward = curve.cost(10 * WAD, 500 * WAD).unwrap();
            let backward = curve.cost(500 * WAD, 10 * WAD).unwrap();
            assert!(forward > 0);
            assert_eq!(forward, -backward);
            assert_eq!(curve.cost(42 * WAD, 42 * WAD).unwrap(), 0);
        }
    }

    #[test]
    fn test_curve_cost_rejects_reversed_interval() {
        let curve = params(CurveKind::Linear);
        assert!(curve.curve_cost(2 * WAD, WAD).is_err());
    }

    #[test]
    fn test_tokens_for_cost_inverts_linear_integral() {
        let curve = params(CurveKind::Linear);
        let tokens = curve.tokens_for_cost(0, 1_005_000_000_000_000_000).unwrap();
        assert!(tokens >= 1_000 * WAD && tokens <= 1_000 * WAD + 1_000, "tokens {}", tokens);
        assert!(curve.curve_cost(0, tokens).unwrap() <= 1_005_000_000_000_000_000);
    }

    #[test]
    fn test_tokens_for_cost_never_overspends() {
        for kind in [CurveKind::Linear, CurveKind::Exponential, CurveKind::Sigmoid] {
            let curve = params(kind);
            let budget = 48 * WAD + WAD / 2;
            let start = 7_777 * WAD;
            let tokens = curve.tokens_for_cost(start, budget).unwrap();
            assert!(tokens > 0);
            assert!(curve.curve_cost(start, start + tokens).unwrap() <= budget);
            assert!(curve.curve_cost(start, start + tokens + WAD).unwrap() > budget);
        }
    }

    #[test]
    fn test_exponential_overflow_is_reported() {
        let curve = params(CurveKind::Exponential);
        // ln(1.001) × 100_000 ≈ 99.95 > exp input bound
        assert_eq!(curve.price(100_000 * WAD), Err(LaunchpadError::Overflow));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn kind_strategy() -> impl Strategy<Value = CurveKind> {
            prop_oneof![
                Just(CurveKind::Linear),
                Just(CurveKind::Exponential),
                Just(CurveKind::Sigmoid),
            ]
        }

        proptest! {
            #[test]
            fn prop_price_monotonic(kind in kind_strategy(),
                                    s in 0u128..50_000 * WAD,
                                    eps in 1u128..1_000 * WAD) {
                let curve = params(kind);
                prop_assert!(curve.price(s + eps).unwrap() >= curve.price(s).unwrap());
            }

            #[test]
            fn prop_cost_additive(kind in kind_strategy(),
                                  a in 0u128..20_000 * WAD,
                                  b in 0u128..20_000 * WAD,
                                  c in 0u128..20_000 * WAD) {
                let curve = params(kind);
                let mut pts = [a, b, c];
                pts.sort();
                let [s0, s1, s2] = pts;
                let left = curve.cost(s0, s1).unwrap() + curve.cost(s1, s2).unwrap();
                prop_assert_eq!(left, curve.cost(s0, s2).unwrap());
            }

            #[test]
            fn prop_cost_increasing_in_target(kind in kind_strategy(),
                                              from in 0u128..20_000 * WAD,
                                              to in 0u128..20_000 * WAD,
                                              step in 1u128..500u128) {
                let curve = params(kind);
                let to = from + to;
                let further = to + step * WAD;
                prop_assert!(curve.cost(from, further).unwrap() > curve.cost(from, to).unwrap());
            }
        }
    }
}
