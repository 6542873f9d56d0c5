//! Graduation Monitor
//!
//! Stateless threshold check run after every trade. Migration flips the
//! phase first, so a second evaluation of the same token sees `Graduated`
//! and never fires again.

use crate::bonding_curve::types::Phase;

/// Graduation Monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraduationMonitor {
    /// Reserve (base WAD) at which a token graduates
    pub threshold: u128,
}

impl GraduationMonitor {
    pub fn new(threshold: u128) -> Self {
        Self { threshold }
    }

    /// True when a still-trading token has reached the threshold
    pub fn should_graduate(&self, phase: Phase, reserve: u128) -> bool {
        phase.is_trading() && reserve >= self.threshold
    }

    /// Base asset still needed before graduation
    pub fn remaining(&self, reserve: u128) -> u128 {
        self.threshold.saturating_sub(reserve)
    }
}
