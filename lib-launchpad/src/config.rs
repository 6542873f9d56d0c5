//! Launchpad Configuration
//!
//! Protocol constants plus a TOML loader. Every section and field is optional
//! so a minimal file only needs the values it changes:
//! ```toml
//! [protocol]
//! trade_fee_bps = 50
//!
//! [curve]
//! exponential_growth_factor = "1.002"
//! ```
//! Base-asset amounts are decimal strings (`"0.01"`) since TOML integers are
//! limited to 64 bits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bonding_curve::fixed_point::{ln1p_wad, narrow};
use crate::bonding_curve::types::{
    CurveConstants, DEFAULT_LINEAR_SLOPE, DEFAULT_SIGMOID_MIDPOINT, DEFAULT_SIGMOID_STEEPNESS,
};
use crate::errors::ConfigError;
use crate::primitives::{Address, BPS_DENOMINATOR, WAD};

/// Creation fee: 0.01 base-asset units
pub const CREATION_FEE: u128 = WAD / 100;

/// Maximum creator royalty: 5%
pub const MAX_CREATOR_ROYALTY_BPS: u16 = 500;

/// Protocol trade fee: 1%
pub const DEFAULT_TRADE_FEE_BPS: u16 = 100;

/// Reserve at which a token graduates: 100 base-asset units
pub const GRADUATION_THRESHOLD: u128 = 100 * WAD;

/// Vault lock duration: 365 days
pub const LOCK_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Share of minted pool shares locked in the vault: 80%
pub const VAULT_SHARE_BPS: u16 = 8_000;

/// Share of minted pool shares sent to the creator: 20%
pub const CREATOR_SHARE_BPS: u16 = 2_000;

/// Default growth factor of the exponential curve: 1.001 per token
pub const DEFAULT_EXPONENTIAL_GROWTH_FACTOR: u128 = WAD + WAD / 1000;

/// Default budget for one collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 2_000;

/// Complete launchpad configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadConfig {
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub curve: CurveConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// `[protocol]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    #[serde(with = "wad_string")]
    pub creation_fee: u128,
    pub max_royalty_bps: u16,
    pub trade_fee_bps: u16,
    #[serde(with = "wad_string")]
    pub graduation_threshold: u128,
    pub lock_duration_secs: u64,
    pub vault_share_bps: u16,
    /// Protocol account receiving pool shares at migration
    pub locker: Address,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            creation_fee: CREATION_FEE,
            max_royalty_bps: MAX_CREATOR_ROYALTY_BPS,
            trade_fee_bps: DEFAULT_TRADE_FEE_BPS,
            graduation_threshold: GRADUATION_THRESHOLD,
            lock_duration_secs: LOCK_DURATION_SECS,
            vault_share_bps: VAULT_SHARE_BPS,
            locker: protocol_address("locker"),
        }
    }
}

/// `[curve]` section: deployment-wide curve shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    #[serde(with = "wad_string")]
    pub linear_slope: u128,
    /// Per-token price multiplier, in (1, 2]
    #[serde(with = "wad_string")]
    pub exponential_growth_factor: u128,
    #[serde(with = "wad_string")]
    pub sigmoid_midpoint: u128,
    #[serde(with = "wad_string")]
    pub sigmoid_steepness: u128,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            linear_slope: DEFAULT_LINEAR_SLOPE,
            exponential_growth_factor: DEFAULT_EXPONENTIAL_GROWTH_FACTOR,
            sigmoid_midpoint: DEFAULT_SIGMOID_MIDPOINT,
            sigmoid_steepness: DEFAULT_SIGMOID_STEEPNESS,
        }
    }
}

impl CurveConfig {
    /// Curve constants snapshotted into each new token
    pub fn constants(&self) -> Result<CurveConstants, ConfigError> {
        if self.exponential_growth_factor <= WAD || self.exponential_growth_factor > 2 * WAD {
            return Err(ConfigError::Invalid(
                "exponential_growth_factor must be in (1, 2]".to_string(),
            ));
        }
        let log_growth = ln1p_wad(self.exponential_growth_factor - WAD)
            .and_then(narrow)
            .map_err(|e| ConfigError::Invalid(format!("exponential_growth_factor: {}", e)))?;

        Ok(CurveConstants {
            linear_slope: self.linear_slope,
            exponential_log_growth: log_growth,
            sigmoid_midpoint: self.sigmoid_midpoint,
            sigmoid_steepness: self.sigmoid_steepness,
        })
    }
}

/// `[runtime]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub collaborator_timeout_ms: u64,
    /// Persist events to a sled database at this path
    pub event_store_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT_MS,
            event_store_path: None,
        }
    }
}

impl RuntimeConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

impl LaunchpadConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LaunchpadConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.protocol;
        if p.creation_fee == 0 {
            return Err(ConfigError::Invalid("creation_fee must be positive".to_string()));
        }
        if p.graduation_threshold == 0 {
            return Err(ConfigError::Invalid(
                "graduation_threshold must be positive".to_string(),
            ));
        }
        let bps_limit = BPS_DENOMINATOR as u16;
        if p.max_royalty_bps > bps_limit || p.vault_share_bps > bps_limit {
            return Err(ConfigError::Invalid(format!(
                "basis point values must not exceed {}",
                bps_limit
            )));
        }
        if p.trade_fee_bps as u32 + p.max_royalty_bps as u32 >= BPS_DENOMINATOR as u32 {
            return Err(ConfigError::Invalid(
                "trade_fee_bps + max_royalty_bps must stay below 100%".to_string(),
            ));
        }
        if self.runtime.collaborator_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "collaborator_timeout_ms must be positive".to_string(),
            ));
        }
        self.curve.constants()?;
        Ok(())
    }
}

/// Deterministic protocol account derived from a role name
pub fn protocol_address(role: &str) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"LAUNCHPAD_PROTOCOL_V1");
    hasher.update(role.as_bytes());
    Address(*hasher.finalize().as_bytes())
}

/// Serde adapter storing WAD amounts as decimal strings
mod wad_string {
    use crate::primitives::{format_wad, parse_wad};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_wad(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_wad(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount: {}", raw)))
    }
}
