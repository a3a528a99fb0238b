//! What the executor needs from the outside world: a private bundle relay and
//! a gas estimator. Both are traits so the submission state machine can be
//! driven by an in-memory double in tests.

use alloy::primitives::{Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use eyre::Result;

/// Signed, EIP-2718 encoded transactions submitted together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedBundle {
    /// Raw transactions in execution order
    pub transactions: Vec<Bytes>,
}

impl SignedBundle {
    /// Raw transactions as `0x` prefixed hex strings, the relay's wire form
    #[must_use]
    pub fn raw_hex(&self) -> Vec<String> {
        self.transactions.iter().map(ToString::to_string).collect()
    }
}

/// Outcome of simulating a bundle on top of a block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simulation {
    /// Relay-side error, the bundle was not simulated
    pub error: Option<String>,
    /// Error or revert reason of the first failing transaction
    pub first_revert: Option<String>,
    /// Payment to the block producer
    pub coinbase_diff: U256,
    /// Gas used by the whole bundle
    pub total_gas_used: u64,
}

impl Simulation {
    /// Whether the bundle ran to completion
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none() && self.first_revert.is_none()
    }

    /// Producer payment per unit of gas
    #[must_use]
    pub fn effective_gas_price(&self) -> U256 {
        if self.total_gas_used == 0 {
            return U256::ZERO;
        }
        self.coinbase_diff / U256::from(self.total_gas_used)
    }
}

/// Relay acknowledgement of a submitted bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReceipt {
    /// Block the bundle targets
    pub target_block: u64,
    /// Bundle hash, when the relay returns one
    pub bundle_hash: Option<String>,
}

/// A private transaction relay accepting bundles for a specific block
#[async_trait]
pub trait Relay: Send + Sync {
    /// Signs `transactions` with the executing account
    ///
    /// # Errors
    /// * If nonce or chain id lookup fails
    /// * If signing fails
    async fn sign_bundle(&self, transactions: Vec<TransactionRequest>) -> Result<SignedBundle>;

    /// Simulates `bundle` as if included in `target_block`.
    /// A bundle the relay rejects is still `Ok`, see [`Simulation::succeeded`].
    ///
    /// # Errors
    /// * If the relay cannot be reached or answers garbage
    async fn simulate(&self, bundle: &SignedBundle, target_block: u64) -> Result<Simulation>;

    /// Submits `bundle` for inclusion in `target_block`
    ///
    /// # Errors
    /// * If the relay cannot be reached or refuses the bundle
    async fn send_raw_bundle(&self, bundle: &SignedBundle, target_block: u64)
        -> Result<BundleReceipt>;
}

/// Gas needed by a transaction against the latest state
#[async_trait]
pub trait GasEstimator: Send + Sync {
    /// # Errors
    /// * If the node cannot execute the transaction
    async fn estimate_gas(&self, transaction: &TransactionRequest) -> Result<u64>;
}

/// [`GasEstimator`] backed by a node connection
#[derive(Debug, Clone)]
pub struct RpcGasEstimator<P> {
    /// Node connection
    provider: P,
}

impl<P> RpcGasEstimator<P> {
    /// Wraps `provider`
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync> GasEstimator for RpcGasEstimator<P> {
    async fn estimate_gas(&self, transaction: &TransactionRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(transaction).await?)
    }
}
