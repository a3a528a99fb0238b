#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use eyre::{eyre, Result};

use super::relay::{BundleReceipt, GasEstimator, Relay, SignedBundle, Simulation};

/// Relay double. A "signed" bundle carries the calldata of each transaction,
/// simulations answer from a script and default to success once it runs out.
#[derive(Default)]
pub struct MockRelay {
    /// Scripted simulation outcomes, in order
    pub simulations: Mutex<VecDeque<Result<Simulation>>>,
    /// Every transaction handed to `sign_bundle`
    pub signed: Mutex<Vec<TransactionRequest>>,
    /// Target block of every simulation
    pub simulated_blocks: Mutex<Vec<u64>>,
    /// Every submitted bundle with its target block
    pub sent: Mutex<Vec<(SignedBundle, u64)>>,
    /// Target blocks whose submission is refused at once
    pub refused_blocks: Vec<u64>,
}

impl MockRelay {
    /// Relay answering simulations from `simulations`
    pub fn with_simulations(simulations: Vec<Result<Simulation>>) -> Self {
        Self {
            simulations: Mutex::new(simulations.into()),
            ..Default::default()
        }
    }

    /// Refuses submissions for `block` without recording them
    pub fn refusing(mut self, block: u64) -> Self {
        self.refused_blocks.push(block);
        self
    }

    /// Target blocks of the submitted bundles, ascending
    pub fn sent_blocks(&self) -> Vec<u64> {
        let mut blocks: Vec<u64> = self.sent.lock().unwrap().iter().map(|(_, b)| *b).collect();
        blocks.sort_unstable();
        blocks
    }
}

#[async_trait]
impl Relay for MockRelay {
    async fn sign_bundle(&self, transactions: Vec<TransactionRequest>) -> Result<SignedBundle> {
        let raw = transactions
            .iter()
            .map(|tx| tx.input().cloned().unwrap_or_default())
            .collect();
        self.signed.lock().unwrap().extend(transactions);
        Ok(SignedBundle { transactions: raw })
    }

    async fn simulate(&self, _bundle: &SignedBundle, target_block: u64) -> Result<Simulation> {
        self.simulated_blocks.lock().unwrap().push(target_block);
        self.simulations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Simulation::default()))
    }

    async fn send_raw_bundle(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> Result<BundleReceipt> {
        if self.refused_blocks.contains(&target_block) {
            return Err(eyre!("rate limited for block {target_block}"));
        }
        // let a sibling submission get polled before this one lands
        tokio::task::yield_now().await;
        self.sent.lock().unwrap().push((bundle.clone(), target_block));
        Ok(BundleReceipt {
            target_block,
            bundle_hash: Some(format!("0x{target_block:x}")),
        })
    }
}

/// Gas estimator double answering from a script, in order
pub struct MockGas {
    /// Scripted estimates
    pub estimates: Mutex<VecDeque<Result<u64>>>,
}

impl MockGas {
    /// Estimator answering from `estimates`, failing once it runs out
    pub fn new(estimates: Vec<Result<u64>>) -> Self {
        Self {
            estimates: Mutex::new(estimates.into()),
        }
    }
}

#[async_trait]
impl GasEstimator for MockGas {
    async fn estimate_gas(&self, _transaction: &TransactionRequest) -> Result<u64> {
        self.estimates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(eyre!("no estimate scripted")))
    }
}
