//! # Arbitrage Module
//!
//! Crossed-market detection between pools that trade the same token against
//! the base asset. Markets are priced at a small probe volume, every pair
//! where one market sells above what another charges is searched over a
//! ladder of volumes, and the winners are ranked by profit.

/// Best-volume search over crossed market pairs
pub mod crossed;
/// Per-token evaluation and ranking
pub mod evaluate;
/// The pool capability shared by every protocol adapter
pub mod market;
/// Test helpers and utilities
#[cfg(test)]
pub(crate) mod test_helpers;
/// Common type definitions
pub mod types;
/// Uniswap V2 style pairs
pub mod uniswap_v2;

pub use evaluate::evaluate_markets;
pub use market::{CallBatch, Market, MarketError};
pub use types::{MarketsByToken, Opportunity};
pub use uniswap_v2::UniswapV2Pair;
