//! Turns ranked opportunities into a relay submission.
//!
//! Candidates are tried in rank order. The first one that estimates, signs and
//! simulates cleanly is submitted for the next two blocks and ends the call.

use alloy::network::TransactionBuilder;
use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use log::{debug, info, warn};
use thiserror::Error;

use super::relay::{BundleReceipt, GasEstimator, Relay};
use crate::abi::{BundleExecutor, IERC20};
use crate::arb::market::{CallBatch, MarketError};
use crate::arb::types::{to_decimal, Opportunity};

/// Gas limit the call is populated with before estimation
pub const GAS_LIMIT_PROVISIONAL: u64 = 1_000_000;

/// Estimates above this are treated as a sign the call will not do what we think
pub const MAX_GAS_ESTIMATE: u64 = 1_400_000;

/// Why nothing was submitted
#[derive(Debug, Error)]
pub enum TakeError {
    /// Every candidate was skipped. Expected on most blocks.
    #[error("No arbitrage submitted to relay")]
    Exhausted,
    /// The miner reward is a percentage of profit
    #[error("miner reward percentage must be within 0..=100, got {0}")]
    InvalidRewardPercentage(u8),
    /// A market could not build its leg of the trade
    #[error(transparent)]
    Market(#[from] MarketError),
    /// Signing, simulation or submission failed outside of the recoverable cases
    #[error("{0:#}")]
    Relay(eyre::Report),
}

impl From<eyre::Report> for TakeError {
    fn from(report: eyre::Report) -> Self {
        Self::Relay(report)
    }
}

/// A bundle accepted by the relay for two consecutive blocks
#[derive(Debug, Clone)]
pub struct BundleSubmission {
    /// Token the opportunity trades
    pub token: Address,
    /// Base asset sent into the first market
    pub volume: U256,
    /// Expected profit before the miner reward
    pub profit: U256,
    /// Payment to the block producer
    pub miner_reward: U256,
    /// Gas limit the bundle was signed with
    pub gas_limit: u64,
    /// One receipt per target block, `block_number + 1` first
    pub receipts: [BundleReceipt; 2],
}

/// Executes opportunities through the bundle executor contract.
///
/// `R` submits bundles, `G` estimates gas. Neither is consulted before
/// [`Arbitrage::take`] runs.
#[derive(Debug)]
pub struct Arbitrage<R, G> {
    /// Account signing the bundle
    account: Address,
    /// Executor contract holding the base asset
    executor: Address,
    /// Base asset, WETH on mainnet
    base: Address,
    /// Bundle relay
    relay: R,
    /// Gas estimation
    gas: G,
}

impl<R: Relay, G: GasEstimator> Arbitrage<R, G> {
    /// # Arguments
    /// * `account` - Address of the account signing transactions
    /// * `executor` - Address of the deployed bundle executor contract
    /// * `base` - Base asset the executor holds
    /// * `relay` - Bundle relay client
    /// * `gas` - Gas estimator
    pub const fn new(account: Address, executor: Address, base: Address, relay: R, gas: G) -> Self {
        Self {
            account,
            executor,
            base,
            relay,
            gas,
        }
    }

    /// The bundle relay
    #[cfg(test)]
    pub(crate) const fn relay(&self) -> &R {
        &self.relay
    }

    /// Submits the first opportunity that survives gas estimation and simulation
    ///
    /// # Arguments
    /// * `opportunities` - Candidates, best first
    /// * `block_number` - Latest block; bundles target the two blocks after it
    /// * `miner_reward_percentage` - Share of profit paid to the block producer
    ///
    /// # Returns
    /// The accepted submission
    ///
    /// # Errors
    /// * [`TakeError::Exhausted`] if every candidate was skipped
    /// * [`TakeError::InvalidRewardPercentage`] if the percentage is above 100
    /// * [`TakeError::Market`] if a market cannot build its leg
    /// * [`TakeError::Relay`] if signing, simulation transport or submission fails
    pub async fn take(
        &self,
        opportunities: &[Opportunity],
        block_number: u64,
        miner_reward_percentage: u8,
    ) -> Result<BundleSubmission, TakeError> {
        if miner_reward_percentage > 100 {
            return Err(TakeError::InvalidRewardPercentage(miner_reward_percentage));
        }

        for opportunity in opportunities {
            info!(
                "Send this much WETH {} get this much profit {}",
                to_decimal(opportunity.volume),
                to_decimal(opportunity.profit)
            );
            let miner_reward = miner_reward(opportunity, miner_reward_percentage);
            let calls = self.build_calls(opportunity)?;
            let transaction = self.populate(opportunity.volume, miner_reward, calls);

            let estimate = match self.gas.estimate_gas(&transaction).await {
                Ok(estimate) => estimate,
                Err(e) => {
                    warn!("Estimate gas failure for token {}: {e}", opportunity.token);
                    continue;
                }
            };
            if estimate > MAX_GAS_ESTIMATE {
                info!("EstimateGas succeeded, but suspiciously large: {estimate}");
                continue;
            }
            let gas_limit = estimate * 2;
            let transaction = transaction.with_gas_limit(gas_limit);

            let bundle = self.relay.sign_bundle(vec![transaction]).await?;
            let simulation = self.relay.simulate(&bundle, block_number + 1).await?;
            if !simulation.succeeded() {
                info!(
                    "Simulation Error on token {}, skipping: {}",
                    opportunity.token,
                    simulation
                        .error
                        .as_deref()
                        .or(simulation.first_revert.as_deref())
                        .unwrap_or_default()
                );
                continue;
            }

            info!(
                "Submitting bundle, profit sent to miner: {}, effective gas price: {} GWEI",
                to_decimal(simulation.coinbase_diff),
                format_units(simulation.effective_gas_price(), "gwei")
                    .unwrap_or_else(|_| simulation.effective_gas_price().to_string())
            );
            // Both sends run to completion, a refusal for one block never cancels the other
            let (first, second) = futures::join!(
                self.relay.send_raw_bundle(&bundle, block_number + 1),
                self.relay.send_raw_bundle(&bundle, block_number + 2),
            );
            let (first, second) = (first?, second?);

            return Ok(BundleSubmission {
                token: opportunity.token,
                volume: opportunity.volume,
                profit: opportunity.profit_wei(),
                miner_reward,
                gas_limit,
                receipts: [first, second],
            });
        }

        Err(TakeError::Exhausted)
    }

    /// Calls executed by the executor contract: the buy leg then the sell leg
    fn build_calls(&self, opportunity: &Opportunity) -> Result<CallBatch, MarketError> {
        let Opportunity {
            token,
            volume,
            buy_from,
            sell_to,
            ..
        } = opportunity;

        let intermediate = buy_from.quote_out(self.base, *token, *volume)?;
        let mut calls = if sell_to.receives_directly(*token) {
            buy_from.build_sell_to_next(self.base, *volume, sell_to.as_ref())?
        } else {
            debug!(
                "Market {} cannot receive {token} directly, routing through the executor",
                sell_to.address()
            );
            let buy = buy_from.build_sell(self.base, *volume, self.executor)?;
            let mut calls = CallBatch::single(buy_from.address(), buy);
            let transfer = IERC20::transferCall {
                to: sell_to.address(),
                amount: intermediate,
            };
            calls.push(*token, Bytes::from(transfer.abi_encode()));
            calls
        };

        let sell = sell_to.build_sell(*token, intermediate, self.executor)?;
        calls.push(sell_to.address(), sell);
        Ok(calls)
    }

    /// Unsigned `uniswapWeth` call, priced at zero so the producer is paid
    /// only through the reward
    fn populate(&self, volume: U256, miner_reward: U256, calls: CallBatch) -> TransactionRequest {
        let call = BundleExecutor::uniswapWethCall {
            wethAmountToFirstMarket: volume,
            ethAmountToCoinbase: miner_reward,
            targets: calls.targets,
            payloads: calls.payloads,
        };
        TransactionRequest::default()
            .with_from(self.account)
            .with_to(self.executor)
            .with_input(call.abi_encode())
            .with_gas_price(0)
            .with_gas_limit(GAS_LIMIT_PROVISIONAL)
    }
}

/// `profit * percentage / 100`, rounded down
fn miner_reward(opportunity: &Opportunity, percentage: u8) -> U256 {
    opportunity.profit_wei() * U256::from(percentage) / U256::from(100)
}
