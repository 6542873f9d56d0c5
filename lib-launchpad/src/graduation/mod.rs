//! Graduation
//!
//! One-time transition of a token from curve trading to an external
//! constant-product market:
//! - `monitor`: threshold check after every trade
//! - `migrator`: pair creation and liquidity seeding
//! - `vesting`: 80 / 20 share split and the vault lock
//! - `saga`: compensation journal that makes the sequence all-or-nothing

pub mod migrator;
pub mod monitor;
pub mod saga;
pub mod vesting;

pub use migrator::{LiquidityMigrator, SeedAmounts};
pub use monitor::GraduationMonitor;
pub use saga::{Compensation, Saga};
pub use vesting::{BeneficiaryCategory, LiquidityLock, LockRequest, ShareSplit, VestingLocker};
