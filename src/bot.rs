//! Block-driven main loop: refresh reserves, evaluate, submit.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::Provider;
use eyre::Result;
use log::{error, info};

use crate::arb::evaluate::evaluate_markets;
use crate::arb::types::{to_decimal, MarketsByToken};
use crate::arb::uniswap_v2::UniswapV2Pair;
use crate::bootstrap::group_by_token;
use crate::config::{Config, DEFAULT_MINER_REWARD_PERCENTAGE, DEFAULT_POLL_INTERVAL_MS};
use crate::executor::arbitrage::{Arbitrage, BundleSubmission, TakeError};
use crate::executor::relay::{GasEstimator, Relay};
use crate::notify::Healthcheck;
use crate::sync::refresh_reserves;

/// Watches the chain and acts on one block at a time
pub struct Bot<P, R, G> {
    /// Node connection
    provider: P,
    /// Submission state machine
    arbitrage: Arbitrage<R, G>,
    /// Latest market snapshots
    markets: Vec<UniswapV2Pair>,
    /// Base asset
    base: Address,
    /// Share of profit paid to the block producer
    miner_reward_percentage: u8,
    /// Pause between block number polls
    poll_interval: Duration,
    /// Pinged after every submission
    healthcheck: Option<Healthcheck>,
    /// Evaluate and print, never submit
    dry_run: bool,
}

impl<P: Provider, R: Relay, G: GasEstimator> Bot<P, R, G> {
    /// Creates a bot with default settings
    pub fn new(
        provider: P,
        arbitrage: Arbitrage<R, G>,
        markets: Vec<UniswapV2Pair>,
        base: Address,
    ) -> Self {
        Self {
            provider,
            arbitrage,
            markets,
            base,
            miner_reward_percentage: DEFAULT_MINER_REWARD_PERCENTAGE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            healthcheck: None,
            dry_run: false,
        }
    }

    /// Applies the reward share, poll interval and health check of `config`
    ///
    /// # Errors
    /// * If the health check client cannot be built
    pub fn with_config(mut self, config: &Config) -> Result<Self> {
        self.miner_reward_percentage = config.miner_reward_percentage;
        self.poll_interval = config.poll_interval;
        self.healthcheck = config
            .healthcheck_url
            .clone()
            .map(Healthcheck::new)
            .transpose()?;
        Ok(self)
    }

    /// Evaluate and print opportunities without submitting anything
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs until Ctrl-C. Errors inside a block are logged and the next block
    /// is processed as usual.
    ///
    /// # Errors
    /// * If the shutdown signal handler cannot be installed
    pub async fn run(mut self) -> Result<()> {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut last_block = None;

        loop {
            tokio::select! {
                signal = &mut shutdown => {
                    signal?;
                    info!("Received shutdown signal, stopping");
                    return Ok(());
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }

            let block_number = match self.provider.get_block_number().await {
                Ok(block_number) => block_number,
                Err(e) => {
                    error!("Failed to fetch block number: {e}");
                    continue;
                }
            };
            if last_block.is_some_and(|last| block_number <= last) {
                continue;
            }
            last_block = Some(block_number);

            info!("New block detected: {block_number}");
            if let Err(e) = self.on_block(block_number).await {
                error!("Error during block processing: {e:#}");
            }
        }
    }

    /// Refreshes every market then acts on the new snapshot
    async fn on_block(&mut self, block_number: u64) -> Result<Option<BundleSubmission>> {
        self.markets = refresh_reserves(&self.provider, &self.markets).await?;
        let markets_by_token = group_by_token(&self.markets, self.base);
        self.act(&markets_by_token, block_number).await
    }

    /// Evaluates `markets_by_token` and submits the best opportunity that
    /// passes simulation
    ///
    /// # Returns
    /// The submission, or `None` if there was nothing to submit
    ///
    /// # Errors
    /// * If submission failed for a reason other than every candidate being skipped
    pub async fn act(
        &self,
        markets_by_token: &MarketsByToken,
        block_number: u64,
    ) -> Result<Option<BundleSubmission>> {
        let opportunities = evaluate_markets(markets_by_token, self.base);
        if opportunities.is_empty() {
            info!("No crossed markets");
            return Ok(None);
        }
        for opportunity in &opportunities {
            info!("Crossed market\n{opportunity}");
        }
        if self.dry_run {
            info!("Dry run, {} opportunities not submitted", opportunities.len());
            return Ok(None);
        }

        match self
            .arbitrage
            .take(&opportunities, block_number, self.miner_reward_percentage)
            .await
        {
            Ok(submission) => {
                info!(
                    "Submitted arbitrage on token {} for blocks {} and {}, miner reward {}",
                    submission.token,
                    submission.receipts[0].target_block,
                    submission.receipts[1].target_block,
                    to_decimal(submission.miner_reward)
                );
                if let Some(healthcheck) = &self.healthcheck {
                    healthcheck.ping_in_background();
                }
                Ok(Some(submission))
            }
            Err(TakeError::Exhausted) => {
                info!("{}", TakeError::Exhausted);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
