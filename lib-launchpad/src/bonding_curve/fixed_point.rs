//! Deterministic fixed-point arithmetic for curve pricing
//!
//! Integer math only. Transcendental functions are evaluated at 36-decimal
//! internal precision in 256-bit integers and floored to WAD, which keeps
//! every result monotone in its input and identical across platforms.

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{U256, WAD};

/// Internal precision for series evaluation (10^36)
const SCALE_36: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

/// ln(2) at 36-decimal precision
const LN2_36: u128 = 693_147_180_559_945_309_417_232_121_458_176_568;

/// |x| bound for `exp_wad`; e^80 · WAD still fits comfortably in 256 bits
pub const MAX_EXP_INPUT: i128 = 80 * WAD as i128;

/// Narrow a 256-bit intermediate back to u128
pub fn narrow(value: U256) -> LaunchpadResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(LaunchpadError::Overflow);
    }
    Ok(value.low_u128())
}

/// floor(a · b / d)
pub fn mul_div(a: u128, b: u128, d: u128) -> LaunchpadResult<u128> {
    if d == 0 {
        return Err(LaunchpadError::Overflow);
    }
    narrow(U256::from(a) * U256::from(b) / U256::from(d))
}

/// floor(a · b / WAD)
pub fn mul_wad(a: u128, b: u128) -> LaunchpadResult<u128> {
    mul_div(a, b, WAD)
}

/// Signed WAD product, floored toward negative infinity.
pub fn mul_wad_signed(a: u128, b: i128) -> LaunchpadResult<i128> {
    let magnitude = U256::from(a) * U256::from(b.unsigned_abs());
    let (q, rem) = magnitude.div_mod(U256::from(WAD));
    let q = narrow(q)?;
    let q = i128::try_from(q).map_err(|_| LaunchpadError::Overflow)?;
    if b >= 0 {
        Ok(q)
    } else if rem.is_zero() {
        Ok(-q)
    } else {
        Ok(-q - 1)
    }
}

/// e^(x / WAD) scaled by WAD.
///
/// Returns `Overflow` for `x >= MAX_EXP_INPUT` and zero for `x <= -MAX_EXP_INPUT`.
pub fn exp_wad(x: i128) -> LaunchpadResult<U256> {
    if x >= MAX_EXP_INPUT {
        return Err(LaunchpadError::Overflow);
    }
    if x <= -MAX_EXP_INPUT {
        return Ok(U256::zero());
    }
    if x == 0 {
        return Ok(U256::from(WAD));
    }

    let e36 = exp_positive_36(x.unsigned_abs());
    if x > 0 {
        Ok(e36 / U256::from(WAD))
    } else {
        // e^-y = 1 / e^y, rescaled from 36 decimals to WAD
        Ok(U256::from(SCALE_36) * U256::from(WAD) / e36)
    }
}

/// e^(x / WAD) at 36-decimal precision for 0 <= x < MAX_EXP_INPUT
fn exp_positive_36(x: u128) -> U256 {
    let scale = U256::from(SCALE_36);
    let ln2 = U256::from(LN2_36);
    let x36 = U256::from(x) * U256::from(WAD);

    // x = n·ln2 + r, 0 <= r < ln2
    let n = x36 / ln2;
    let r = x36 - n * ln2;

    let mut sum = scale;
    let mut term = scale;
    let mut i: u64 = 1;
    loop {
        term = term * r / (scale * U256::from(i));
        if term.is_zero() {
            break;
        }
        sum = sum + term;
        i += 1;
    }

    sum << (n.low_u64() as usize)
}

/// ln(1 + u / WAD) scaled by WAD, for 0 <= u <= WAD.
///
/// Uses ln(y) = 2·atanh((y-1)/(y+1)); with y in [1, 2] the series ratio is at most 1/9.
pub fn ln1p_wad(u: u128) -> LaunchpadResult<U256> {
    if u > WAD {
        return Err(LaunchpadError::InvalidParameters(
            "ln1p_wad argument above 1.0".to_string(),
        ));
    }
    if u == 0 {
        return Ok(U256::zero());
    }

    let scale = U256::from(SCALE_36);
    let z = U256::from(u) * scale / U256::from(2 * WAD + u);
    let z2 = z * z / scale;

    let mut sum = U256::zero();
    let mut power = z;
    let mut k: u64 = 1;
    loop {
        let term = power / U256::from(k);
        if term.is_zero() {
            break;
        }
        sum = sum + term;
        power = power * z2 / scale;
        k += 2;
    }

    Ok((sum << 1) / U256::from(WAD))
}

/// softplus(t) = ln(1 + e^t), t and result in WAD.
pub fn softplus_wad(t: i128) -> LaunchpadResult<U256> {
    if t >= 0 {
        // t + ln(1 + e^-t) keeps the exponent argument non-positive
        let tail = exp_wad(-t)?;
        let tail = ln1p_wad(narrow(tail)?)?;
        Ok(U256::from(t as u128) + tail)
    } else {
        let e = exp_wad(t)?;
        ln1p_wad(narrow(e)?)
    }
}

/// Integer square root (floor)
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let mut x = n;
    let mut y = (x >> 1) + U256::one();
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}
