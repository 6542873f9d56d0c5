//! Bonding Curve Token System
//!
//! Curve-priced phase of a launched token's life:
//!
//! # State Machine
//! ```text
//!   ┌─────────┐     Threshold Met      ┌───────────┐
//!   │ Trading │ ─────────────────────▶ │ Graduated │
//!   └─────────┘    (irreversible)      └───────────┘
//! ```
//!
//! # Architecture
//! - `fixed_point` / `math`: deterministic pricing and cost integrals
//! - `Token`: per-token record and quote logic
//! - `TokenRegistry`: index of all tokens, one lock per token
//! - `events`: event types for indexing

pub mod event_indexer;
pub mod events;
pub mod fixed_point;
pub mod math;
pub mod registry;
pub mod token;
pub mod types;

pub use event_indexer::SledEventIndexer;
pub use events::{EventIndexer, InMemoryEventIndexer, LaunchpadEvent};
pub use registry::{RegistryStats, TokenHandle, TokenRegistry};
pub use token::Token;
pub use types::{
    CurveConstants, CurveKind, CurveParams, CurveStats, GraduationRecord, Phase, TokenMetadata,
    Trade, TradeDirection,
};

/// Token decimals
pub const TOKEN_DECIMALS: u8 = 18;
