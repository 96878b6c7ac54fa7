use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catcher::core::SwapOverrides;
use catcher::{EngineConfig, TradingEngine};

/// Operator CLI for the catcher trading engine
#[derive(Parser)]
#[command(name = "catcher")]
#[command(about = "Solana wallet and token trading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Force simulated execution regardless of config
    #[arg(long, global = true)]
    simulate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show (creating if needed) an owner's wallet
    Wallet { owner: String },

    /// Export an owner's secret key
    Export { owner: String },

    /// Native balance for an owner
    Balance {
        owner: String,

        /// Skip the balance cache
        #[arg(long)]
        refresh: bool,
    },

    /// Run one discovery cycle
    Discover,

    /// Resolve token metadata
    Metadata { address: String },

    /// Resolve metadata and check it against the scan criteria
    Scan { address: String },

    /// Buy a token with SOL
    Buy {
        owner: String,
        token: String,
        /// Amount of SOL to spend
        amount: f64,

        #[arg(long)]
        slippage_bps: Option<u16>,

        /// Priority fee in SOL
        #[arg(long)]
        priority_fee: Option<f64>,

        /// Submit through the MEV-protected endpoint
        #[arg(long)]
        mev: bool,
    },

    /// Sell a share of a token holding for SOL
    Sell {
        owner: String,
        token: String,

        #[arg(short, long, default_value_t = 100.0)]
        percentage: f64,
    },
}

#[derive(Serialize)]
struct WalletView {
    owner_id: String,
    public_key: String,
}

#[derive(Serialize)]
struct BalanceView {
    owner_id: String,
    public_key: String,
    balance_sol: f64,
}

fn init_tracing() -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "catcher.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // stdout is reserved for command output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Keep the file writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[instrument(skip(engine, command))]
async fn run(engine: &TradingEngine, command: Commands) -> Result<()> {
    match command {
        Commands::Wallet { owner } => {
            let wallet = engine.wallets().get_or_create(&owner)?;
            print_json(&WalletView {
                owner_id: wallet.owner_id.clone(),
                public_key: wallet.public_key.clone(),
            })
        }
        Commands::Export { owner } => {
            let export = engine
                .wallets()
                .export(&owner)
                .with_context(|| format!("Failed to export wallet for {}", owner))?;
            print_json(&export)
        }
        Commands::Balance { owner, refresh } => {
            let balance_sol = engine.balances().get_balance(&owner, refresh).await;
            print_json(&BalanceView {
                public_key: engine.wallets().get_public_key(&owner),
                owner_id: owner,
                balance_sol,
            })
        }
        Commands::Discover => print_json(&engine.discovery().discover().await),
        Commands::Metadata { address } => print_json(&engine.metadata().resolve(&address).await),
        Commands::Scan { address } => print_json(&engine.scanner().scan(&address).await),
        Commands::Buy {
            owner,
            token,
            amount,
            slippage_bps,
            priority_fee,
            mev,
        } => {
            let overrides = SwapOverrides {
                slippage_bps,
                priority_fee_sol: priority_fee,
                mev_protection: mev.then_some(true),
            };
            print_json(&engine.buy(&owner, &token, amount, Some(overrides)).await)
        }
        Commands::Sell {
            owner,
            token,
            percentage,
        } => print_json(&engine.sell(&owner, &token, percentage, None).await),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if cli.simulate {
        config.trading.simulated = true;
    }

    info!("🎣 Catcher starting (simulated: {})", config.trading.simulated);
    let engine = TradingEngine::new(config).context("Failed to build trading engine")?;

    run(&engine, cli.command).await
}
