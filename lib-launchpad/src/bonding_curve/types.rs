//! Bonding Curve Types
//!
//! Lifecycle phase, curve parameters and the trade / graduation records.
//!
//! # State Machine
//! ```text
//!   ┌─────────┐   reserve >= threshold, on a successful trade   ┌───────────┐
//!   │ Trading │ ──────────────────────────────────────────────▶ │ Graduated │
//!   └─────────┘               (irreversible)                     └───────────┘
//! ```
//!
//! There is no transition out of `Graduated`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{Address, LockId, PairId, WAD};

/// Token lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Priced by the bonding curve; buys and sells accepted
    Trading,
    /// Liquidity migrated to the external market; curve frozen
    Graduated,
}

impl Phase {
    /// Check if the token can be traded against its curve
    pub fn is_trading(&self) -> bool {
        matches!(self, Phase::Trading)
    }

    /// Check if token has graduated
    pub fn is_graduated(&self) -> bool {
        matches!(self, Phase::Graduated)
    }

    /// Fail with `AlreadyGraduated` unless the curve is still live
    pub fn require_trading(&self) -> LaunchpadResult<()> {
        match self {
            Phase::Trading => Ok(()),
            Phase::Graduated => Err(LaunchpadError::AlreadyGraduated),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Trading => write!(f, "trading"),
            Phase::Graduated => write!(f, "graduated"),
        }
    }
}

/// Bonding curve pricing formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveKind {
    /// price = p0 + slope × s
    Linear,
    /// price = p0 × g^s
    Exponential,
    /// price = 2·p0 / (1 + e^(-k·(s - m)))
    Sigmoid,
}

impl CurveKind {
    /// Get display name for the curve kind
    pub fn name(&self) -> &'static str {
        match self {
            CurveKind::Linear => "linear",
            CurveKind::Exponential => "exponential",
            CurveKind::Sigmoid => "sigmoid",
        }
    }
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveKind {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(CurveKind::Linear),
            "exponential" | "exp" => Ok(CurveKind::Exponential),
            "sigmoid" => Ok(CurveKind::Sigmoid),
            other => Err(LaunchpadError::InvalidParameters(format!(
                "unknown curve kind '{}'",
                other
            ))),
        }
    }
}

/// ln(1.001) in WAD, the default exponential growth per whole token
pub const DEFAULT_EXPONENTIAL_LOG_GROWTH: u128 = 999_500_333_083_533;

/// Default linear slope: 1e-8 base units per whole token
pub const DEFAULT_LINEAR_SLOPE: u128 = 10_000_000_000;

/// Default sigmoid midpoint: 100,000 tokens
pub const DEFAULT_SIGMOID_MIDPOINT: u128 = 100_000 * WAD;

/// Default sigmoid steepness: 1e-5 per whole token
pub const DEFAULT_SIGMOID_STEEPNESS: u128 = 10_000_000_000_000;

/// Deployment-wide curve shape constants
///
/// Snapshotted into each token at creation; changing the deployment config
/// never re-prices an existing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConstants {
    /// Linear price increase per whole token (WAD)
    pub linear_slope: u128,
    /// ln(growth factor) per whole token (WAD)
    pub exponential_log_growth: u128,
    /// Supply at which the sigmoid price equals the initial price (token WAD)
    pub sigmoid_midpoint: u128,
    /// Sigmoid steepness k per whole token (WAD)
    pub sigmoid_steepness: u128,
}

impl Default for CurveConstants {
    fn default() -> Self {
        Self {
            linear_slope: DEFAULT_LINEAR_SLOPE,
            exponential_log_growth: DEFAULT_EXPONENTIAL_LOG_GROWTH,
            sigmoid_midpoint: DEFAULT_SIGMOID_MIDPOINT,
            sigmoid_steepness: DEFAULT_SIGMOID_STEEPNESS,
        }
    }
}

/// Full pricing parameters of one token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    pub kind: CurveKind,
    /// Price at zero supply (linear, exponential) or at the midpoint (sigmoid), WAD
    pub initial_price: u128,
    pub constants: CurveConstants,
}

impl CurveParams {
    pub fn new(kind: CurveKind, initial_price: u128, constants: CurveConstants) -> Self {
        Self {
            kind,
            initial_price,
            constants,
        }
    }

    /// Check that the parameters describe a positive, representable curve
    pub fn validate(&self) -> LaunchpadResult<()> {
        if self.initial_price == 0 {
            return Err(LaunchpadError::InvalidParameters(
                "initial price must be positive".to_string(),
            ));
        }
        match self.kind {
            CurveKind::Linear => Ok(()),
            CurveKind::Exponential => {
                if self.constants.exponential_log_growth == 0 {
                    return Err(LaunchpadError::InvalidParameters(
                        "exponential growth must be above 1.0".to_string(),
                    ));
                }
                Ok(())
            }
            CurveKind::Sigmoid => {
                let c = &self.constants;
                if c.sigmoid_steepness == 0 || c.sigmoid_midpoint == 0 {
                    return Err(LaunchpadError::InvalidParameters(
                        "sigmoid steepness and midpoint must be positive".to_string(),
                    ));
                }
                // price(0) = 2·p0 / (1 + e^(k·m)) must stay representable and non-zero
                let km = c
                    .sigmoid_steepness
                    .checked_mul(c.sigmoid_midpoint / WAD)
                    .ok_or(LaunchpadError::Overflow)?;
                if km >= 40 * WAD {
                    return Err(LaunchpadError::InvalidParameters(
                        "sigmoid steepness × midpoint too large".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Opaque creator-supplied metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub description: String,
    pub image_uri: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// Direction of a curve trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

/// One executed (or quoted) curve trade
///
/// For buys `base_amount` is the gross input and `token_amount` the tokens minted.
/// For sells `token_amount` is burned and `base_amount` is the net payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: TradeDirection,
    pub trader: Address,
    pub base_amount: u128,
    pub token_amount: u128,
    /// Protocol fee routed to the treasury
    pub fee: u128,
    /// Royalty routed to the creator
    pub royalty: u128,
    /// Base asset entering (buy) or leaving (sell) the curve reserve
    pub reserve_delta: u128,
    pub supply_after: u128,
    pub reserve_after: u128,
    pub price_after: u128,
}

/// One-shot record written when a token graduates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationRecord {
    pub threshold: u128,
    pub block_height: u64,
    pub timestamp: u64,
    /// Base asset seeded into the pair (the full curve reserve)
    pub base_migrated: u128,
    /// Tokens minted into the pair at the final curve price
    pub tokens_migrated: u128,
    pub pair_id: PairId,
    pub lp_shares_minted: u128,
    pub vault_share: u128,
    pub creator_share: u128,
    pub lock_id: LockId,
    pub unlock_time: u64,
}

/// Bonding curve token statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveStats {
    pub total_supply: u128,
    pub reserve_balance: u128,
    pub current_price: u128,
    /// Graduation progress in basis points (0-10_000)
    pub graduation_progress_bps: u16,
    pub phase: Phase,
}
