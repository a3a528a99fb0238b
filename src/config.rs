//! Configuration loaded from the environment (and `.env`, when present).

use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use eyre::{eyre, Result, WrapErr};
use url::Url;

use crate::executor::flashbots::DEFAULT_RELAY_URL;

/// Default share of profit paid to the block producer
pub const DEFAULT_MINER_REWARD_PERCENTAGE: u8 = 80;

/// Default pause between block number polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Runtime settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Node HTTP endpoint
    pub rpc_url: Url,
    /// Account that signs and pays for the bundle transactions
    pub signer: PrivateKeySigner,
    /// Deployed bundle executor contract
    pub bundle_executor: Address,
    /// Key authenticating requests to the relay, never funded
    pub relay_signer: PrivateKeySigner,
    /// Relay endpoint
    pub relay_url: Url,
    /// Share of profit paid to the block producer, `0..=100`
    pub miner_reward_percentage: u8,
    /// Pinged after every submitted bundle
    pub healthcheck_url: Option<Url>,
    /// Pause between block number polls
    pub poll_interval: Duration,
}

impl Config {
    /// Reads the configuration from the process environment after loading `.env`
    ///
    /// # Errors
    /// * If a required variable is missing
    /// * If a variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    ///
    /// # Errors
    /// * If a required variable is missing
    /// * If a variable cannot be parsed
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| eyre!("{name} not set"))
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let rpc_url = parse_url("ETHEREUM_RPC_URL", &required("ETHEREUM_RPC_URL")?)?;
        let signer = parse_key("PRIVATE_KEY", &required("PRIVATE_KEY")?)?;
        let bundle_executor = required("BUNDLE_EXECUTOR_ADDRESS")?
            .trim()
            .parse::<Address>()
            .wrap_err("BUNDLE_EXECUTOR_ADDRESS is not an address")?;
        let relay_signer = parse_key(
            "FLASHBOTS_RELAY_SIGNING_KEY",
            &required("FLASHBOTS_RELAY_SIGNING_KEY")?,
        )?;

        let relay_url = parse_url(
            "FLASHBOTS_RELAY_URL",
            &optional("FLASHBOTS_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
        )?;
        let miner_reward_percentage = match optional("MINER_REWARD_PERCENTAGE") {
            Some(value) => parse_percentage(&value)?,
            None => DEFAULT_MINER_REWARD_PERCENTAGE,
        };
        let healthcheck_url = optional("HEALTHCHECK_URL")
            .map(|value| parse_url("HEALTHCHECK_URL", &value))
            .transpose()?;
        let poll_interval_ms = match optional("POLL_INTERVAL_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .wrap_err_with(|| format!("POLL_INTERVAL_MS is not a number: {value}"))?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            rpc_url,
            signer,
            bundle_executor,
            relay_signer,
            relay_url,
            miner_reward_percentage,
            healthcheck_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

/// Parses a URL, naming the variable on failure
fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).wrap_err_with(|| format!("{name} is not a valid URL"))
}

/// Parses a hex private key without echoing it back
fn parse_key(name: &str, value: &str) -> Result<PrivateKeySigner> {
    value
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(|_| eyre!("{name} is not a valid private key"))
}

/// Parses a miner reward percentage within `0..=100`
fn parse_percentage(value: &str) -> Result<u8> {
    let percentage = value
        .trim()
        .parse::<u8>()
        .wrap_err_with(|| format!("MINER_REWARD_PERCENTAGE is not a number: {value}"))?;
    if percentage > 100 {
        return Err(eyre!(
            "MINER_REWARD_PERCENTAGE must be within 0..=100, got {percentage}"
        ));
    }
    Ok(percentage)
}
