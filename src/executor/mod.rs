//! # Executor Module
//!
//! Bundle construction, gas estimation, relay simulation and submission.

/// Bundle building and the submission state machine
pub mod arbitrage;
/// JSON-RPC bundle relay client
pub mod flashbots;
/// Relay and gas estimation capabilities
pub mod relay;
/// Relay and gas estimation doubles
#[cfg(test)]
pub(crate) mod test_helpers;

pub use arbitrage::{Arbitrage, BundleSubmission, TakeError};
pub use flashbots::FlashbotsRelay;
pub use relay::{BundleReceipt, GasEstimator, Relay, RpcGasEstimator, SignedBundle, Simulation};
