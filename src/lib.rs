/*!
 * # Sluice - Crossed Market Arbitrage over a Private Relay
 *
 * Sluice watches many constant-product pools that trade the same token
 * against WETH, finds pairs of pools whose prices have crossed, sizes the
 * trade across them and submits it as a private bundle for the next blocks.
 *
 * ## Module Structure
 *
 * - `abi`: Contract bindings for the query helper, pairs and the bundle executor
 * - `arb`: Market model, crossed-market finder and evaluator
 * - `bootstrap`: Market discovery across the configured factories
 * - `bot`: Block-driven main loop
 * - `config`: Environment configuration
 * - `executor`: Bundle construction, simulation and relay submission
 * - `notify`: Health check pings
 * - `sync`: Reserve refresh
 * - `utils`: Logging, providers and constants
 */

/// Contract bindings
pub mod abi;
/// Market model and opportunity search
pub mod arb;
/// Market discovery
pub mod bootstrap;
/// Block-driven main loop
pub mod bot;
/// Environment configuration
pub mod config;
/// Bundle construction and relay submission
pub mod executor;
/// Health check pings
pub mod notify;
/// Reserve refresh
pub mod sync;
/// Utility functions and helpers
pub mod utils;
