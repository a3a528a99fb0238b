//! Command line entry point.

use clap::{Parser, Subcommand};
use eyre::Result;
use log::info;

use sluice::bootstrap::{discover_markets, group_by_token, summarize};
use sluice::bot::Bot;
use sluice::config::Config;
use sluice::executor::{Arbitrage, FlashbotsRelay, RpcGasEstimator};
use sluice::utils::constants::{BLACKLISTED_TOKENS, FACTORIES, WETH};
use sluice::utils::logger::setup_logger;
use sluice::utils::providers::create_http_provider;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand, `start` when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Discover markets and submit arbitrage bundles every block
    Start {
        /// Evaluate and log opportunities without submitting
        #[arg(long)]
        dry_run: bool,
    },
    /// Discover markets and print them as JSON, token by token
    Markets,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger()?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let provider = create_http_provider(config.rpc_url.as_str())?;

    info!("Searcher Wallet Address: {}", config.signer.address());
    info!(
        "Relay Signing Wallet Address: {}",
        config.relay_signer.address()
    );

    let markets = discover_markets(&provider, &FACTORIES, WETH, &BLACKLISTED_TOKENS).await?;

    match cli.command.unwrap_or(Commands::Start { dry_run: false }) {
        Commands::Markets => {
            let summary = summarize(&group_by_token(&markets, WETH));
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Start { dry_run } => {
            let relay = FlashbotsRelay::new(
                provider.clone(),
                config.signer.clone(),
                config.relay_signer.clone(),
                config.relay_url.clone(),
            )?;
            let arbitrage = Arbitrage::new(
                relay.account(),
                config.bundle_executor,
                WETH,
                relay,
                RpcGasEstimator::new(provider.clone()),
            );
            Bot::new(provider, arbitrage, markets, WETH)
                .with_config(&config)?
                .dry_run(dry_run)
                .run()
                .await?;
        }
    }

    Ok(())
}
