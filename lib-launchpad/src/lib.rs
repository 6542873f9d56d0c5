//! Bonding-curve token launchpad
//!
//! Tokens are priced by a deterministic fixed-point bonding curve until their
//! reserve reaches the graduation threshold. The trade that crosses it
//! migrates the reserve into an external constant-product pair, locks 80% of
//! the minted pool shares for a year and sends the rest to the creator, all
//! or nothing.
//!
//! ```no_run
//! use lib_launchpad::{
//!     collaborators::InMemoryCollaborators, config::{LaunchpadConfig, CREATION_FEE},
//!     primitives::{Address, TxContext, WAD}, CreateTokenRequest, CurveKind, Launchpad,
//! };
//!
//! let memory = InMemoryCollaborators::new();
//! let launchpad = Launchpad::new(LaunchpadConfig::default(), memory.collaborators())?;
//! let ctx = TxContext::new(Address([1u8; 32]), 1, 1_700_000_000);
//! let token_id = launchpad.create_token(
//!     &ctx,
//!     CreateTokenRequest {
//!         name: "Example".to_string(),
//!         symbol: "EXM".to_string(),
//!         curve_kind: CurveKind::Linear,
//!         initial_price: WAD / 1000,
//!         royalty_bps: 200,
//!         metadata: Default::default(),
//!     },
//!     CREATION_FEE,
//! )?;
//! let receipt = launchpad.buy(&ctx, &token_id, 10 * WAD, 0)?;
//! println!("minted {}", receipt.tokens());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bonding_curve;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod graduation;
pub mod launchpad;
pub mod primitives;
pub mod trading;

pub use bonding_curve::{
    CurveKind, CurveParams, EventIndexer, InMemoryEventIndexer, LaunchpadEvent, Phase,
    SledEventIndexer, Token, TokenMetadata, Trade, TradeDirection,
};
pub use config::LaunchpadConfig;
pub use errors::{
    CollaboratorError, ConfigError, IndexerError, LaunchpadError, LaunchpadResult, MigrationStage,
};
pub use launchpad::{CreateTokenRequest, Launchpad};
pub use primitives::{Address, TokenId, TxContext, WAD};
pub use trading::{TradeReceipt, TradingEngine};
