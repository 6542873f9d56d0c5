//! Launchpad Errors

use crate::primitives::TokenId;
use thiserror::Error;

/// Error surfaced to the caller of a launchpad operation
///
/// Every variant except `ExternalCallFailed` and `MigrationFailed` is raised
/// before any state is committed. The two external variants are raised after
/// all staged effects have been compensated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Insufficient creation fee: required {required}, paid {paid}")]
    InsufficientFee { required: u128, paid: u128 },

    #[error("Token has already graduated")]
    AlreadyGraduated,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Slippage exceeded: expected at least {expected_min}, got {actual}")]
    SlippageExceeded { expected_min: u128, actual: u128 },

    #[error("Insufficient reserve: required {required}, available {available}")]
    InsufficientReserve { required: u128, available: u128 },

    #[error("Insufficient token balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("External call {call} failed: {source}")]
    ExternalCallFailed {
        call: &'static str,
        source: CollaboratorError,
    },

    #[error("Migration failed at {stage}: {source}")]
    MigrationFailed {
        stage: MigrationStage,
        source: CollaboratorError,
    },
}

impl LaunchpadError {
    /// True for failures the caller may retry by re-submitting the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LaunchpadError::ExternalCallFailed { .. } | LaunchpadError::MigrationFailed { .. }
        )
    }
}

/// Step of the graduation sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    CreatePair,
    AddLiquidity,
    CreatorShareTransfer,
    VaultCustody,
    VaultLock,
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStage::CreatePair => write!(f, "create_pair"),
            MigrationStage::AddLiquidity => write!(f, "add_liquidity"),
            MigrationStage::CreatorShareTransfer => write!(f, "creator_share_transfer"),
            MigrationStage::VaultCustody => write!(f, "vault_custody"),
            MigrationStage::VaultLock => write!(f, "vault_lock"),
        }
    }
}

/// Failure reported by an external collaborator (treasury, payments, AMM, lock vault)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("{call} timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout {
        call: &'static str,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lock has not reached its unlock time")]
    LockNotMatured,

    #[error("lock already released")]
    LockAlreadyReleased,
}

/// Event log write failure
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("event storage failed: {0}")]
    Storage(#[from] sled::Error),

    #[error("event encoding failed: {0}")]
    Encode(#[from] bincode::Error),
}

/// Configuration loading / validation error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for launchpad operations
pub type LaunchpadResult<T> = Result<T, LaunchpadError>;

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
