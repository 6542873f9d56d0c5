//! Identifiers and fixed-point units shared by every launchpad module.
//!
//! All amounts are `u128` values scaled by [`WAD`] (18 decimals). Prices are
//! base-asset WAD per one whole token.

use serde::{Deserialize, Serialize};
use std::fmt;

uint::construct_uint! {
    /// 256-bit unsigned integer for intermediate products.
    pub struct U256(4);
}

/// Fixed-point scale: 1.0 == 10^18
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis point denominator (100% == 10_000 bps)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Symbol of the base asset that graduated pools are paired against
pub const BASE_ASSET_SYMBOL: &str = "BASE";

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Parse from a 64-char hex string, with or without `0x`
            pub fn from_hex(value: &str) -> Option<Self> {
                let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value)).ok()?;
                let arr: [u8; 32] = bytes.try_into().ok()?;
                Some(Self(arr))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0[..8]))
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Self::from_hex(&value).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid {} hex: {}", stringify!($name), value))
                })
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..8]))
            }
        }
    };
}

id_type!(
    /// Account address (trader, creator, treasury, locker)
    Address
);
id_type!(
    /// Stable identifier of a launched token
    TokenId
);
id_type!(
    /// Identifier of a pair created on the external AMM
    PairId
);
id_type!(
    /// Identifier of a liquidity lock held by the lock vault
    LockId
);

impl TokenId {
    /// Derive a token id from creator, per-creator nonce, name and symbol.
    pub fn derive(creator: &Address, nonce: u64, name: &str, symbol: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"LAUNCHPAD_TOKEN_V1");
        hasher.update(creator.as_bytes());
        hasher.update(&nonce.to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(symbol.as_bytes());
        TokenId(*hasher.finalize().as_bytes())
    }
}

impl PairId {
    /// Deterministic pair id for an unordered token pair.
    pub fn derive(token_a: &[u8; 32], token_b: &[u8; 32]) -> Self {
        let (lo, hi) = if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"LAUNCHPAD_PAIR_V1");
        hasher.update(lo);
        hasher.update(hi);
        PairId(*hasher.finalize().as_bytes())
    }
}

/// 32-byte id of the base asset used as the quote side of every pair
pub fn base_asset_id() -> [u8; 32] {
    *blake3::hash(BASE_ASSET_SYMBOL.as_bytes()).as_bytes()
}

/// Block height and wall-clock time of the enclosing operation, plus its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub caller: Address,
    pub block_height: u64,
    pub timestamp: u64,
}

impl TxContext {
    pub fn new(caller: Address, block_height: u64, timestamp: u64) -> Self {
        Self {
            caller,
            block_height,
            timestamp,
        }
    }
}

/// Render a WAD amount as a decimal string (e.g. `1.5`).
pub fn format_wad(amount: u128) -> String {
    let whole = amount / WAD;
    let frac = amount % WAD;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse a decimal string (up to 18 fractional digits) into WAD units.
pub fn parse_wad(value: &str) -> Option<u128> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if frac.len() > 18 || (whole.is_empty() && frac.is_empty()) {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_scaled: u128 = if frac.is_empty() {
        0
    } else {
        format!("{:0<18}", frac).parse().ok()?
    };
    whole.checked_mul(WAD)?.checked_add(frac_scaled)
}
