//! Launchpad simulator
//!
//! Creates one token against in-memory collaborators, runs a series of buys
//! and prints each outcome followed by the event log.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lib_launchpad::bonding_curve::{EventIndexer, InMemoryEventIndexer, SledEventIndexer};
use lib_launchpad::collaborators::InMemoryCollaborators;
use lib_launchpad::primitives::{format_wad, parse_wad};
use lib_launchpad::{
    Address, CreateTokenRequest, CurveKind, Launchpad, LaunchpadConfig, LaunchpadEvent, TxContext,
};

/// Bonding-curve launchpad simulator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "launchpad-sim")]
struct SimArgs {
    /// Configuration file path
    #[arg(short, long, env = "LAUNCHPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Curve kind (linear, exponential, sigmoid)
    #[arg(long, default_value = "linear")]
    curve: CurveKind,

    /// Initial price in base-asset units per token
    #[arg(long, default_value = "0.001")]
    initial_price: String,

    /// Creator royalty in basis points
    #[arg(long, default_value_t = 200)]
    royalty_bps: u16,

    /// Number of buys to run
    #[arg(long, default_value_t = 9)]
    buys: u32,

    /// Gross base-asset amount per buy
    #[arg(long, default_value = "50")]
    amount: String,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, env = "LAUNCHPAD_VERBOSE")]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct BuyOutcome {
    index: u32,
    ok: bool,
    tokens_out: Option<String>,
    reserve_after: Option<String>,
    graduated: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SimReport {
    token_id: String,
    buys: Vec<BuyOutcome>,
    events: Vec<LaunchpadEvent>,
}

fn main() -> Result<()> {
    let args = SimArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => LaunchpadConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LaunchpadConfig::default(),
    };
    let initial_price = parse_wad(&args.initial_price)
        .with_context(|| format!("invalid --initial-price '{}'", args.initial_price))?;
    let amount =
        parse_wad(&args.amount).with_context(|| format!("invalid --amount '{}'", args.amount))?;

    let indexer: Box<dyn EventIndexer> = match &config.runtime.event_store_path {
        Some(path) => Box::new(
            SledEventIndexer::open(path)
                .with_context(|| format!("opening event store {}", path.display()))?,
        ),
        None => Box::new(InMemoryEventIndexer::new()),
    };

    let memory = InMemoryCollaborators::new();
    let creation_fee = config.protocol.creation_fee;
    let launchpad = Launchpad::with_indexer(config, memory.collaborators(), indexer)?;

    let creator = Address([1u8; 32]);
    let trader = Address([2u8; 32]);
    let start = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let token_id = launchpad.create_token(
        &TxContext::new(creator, 1, start),
        CreateTokenRequest {
            name: "Simulated Token".to_string(),
            symbol: "SIM".to_string(),
            curve_kind: args.curve,
            initial_price,
            royalty_bps: args.royalty_bps,
            metadata: Default::default(),
        },
        creation_fee,
    )?;

    let mut outcomes = Vec::with_capacity(args.buys as usize);
    for index in 1..=args.buys {
        let ctx = TxContext::new(trader, 1 + index as u64, start + index as u64);
        let outcome = match launchpad.buy(&ctx, &token_id, amount, 0) {
            Ok(receipt) => BuyOutcome {
                index,
                ok: true,
                tokens_out: Some(format_wad(receipt.tokens())),
                reserve_after: Some(format_wad(receipt.trade.reserve_after)),
                graduated: receipt.graduation.is_some(),
                error: None,
            },
            Err(e) => BuyOutcome {
                index,
                ok: false,
                tokens_out: None,
                reserve_after: None,
                graduated: false,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }

    let report = SimReport {
        token_id: token_id.to_hex(),
        buys: outcomes,
        events: launchpad.token_events(&token_id),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }
    Ok(())
}

fn print_table(report: &SimReport) {
    println!("token {}", report.token_id);
    println!("{:>4}  {:>28}  {:>24}  {}", "buy", "tokens out", "reserve", "result");
    for buy in &report.buys {
        let result = match (&buy.error, buy.graduated) {
            (Some(e), _) => e.clone(),
            (None, true) => "graduated".to_string(),
            (None, false) => "ok".to_string(),
        };
        println!(
            "{:>4}  {:>28}  {:>24}  {}",
            buy.index,
            buy.tokens_out.as_deref().unwrap_or("-"),
            buy.reserve_after.as_deref().unwrap_or("-"),
            result
        );
    }

    println!();
    println!("events:");
    for event in &report.events {
        println!("  [{}] {}", event.block_height(), event.event_type());
    }
}
