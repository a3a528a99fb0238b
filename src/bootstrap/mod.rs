//! Market discovery: pages every configured factory through the on-chain
//! `UniswapQuery` helper and keeps the base-asset pairs worth watching.

/// Rows returned by the batch query helper
pub mod types;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use eyre::Report;
use log::info;
use serde::Serialize;

use crate::abi::UniswapQuery;
use crate::arb::market::Market;
use crate::arb::types::MarketsByToken;
use crate::arb::uniswap_v2::UniswapV2Pair;
use crate::bootstrap::types::PairRow;
use crate::utils::constants::UNISWAP_QUERY_ADDRESS;

/// Pairs requested per `getPairsByIndexRange` call
pub const BATCH_SIZE: u64 = 1000;

/// Gas allowance for the read-only batch calls
pub const QUERY_GAS: u64 = 30_000_000;

/// Retrieves pairs within a specified index range from a factory contract
///
/// # Arguments
/// * `provider` - Node connection
/// * `factory` - The address of the factory contract
/// * `from` - Starting index
/// * `to` - Ending index, exclusive
///
/// # Returns
/// One `PairRow` per pair in the range
///
/// # Errors
/// * If the contract call fails
pub async fn fetch_pairs_by_range<P: Provider>(
    provider: &P,
    factory: Address,
    from: U256,
    to: U256,
) -> Result<Vec<PairRow>, Report> {
    let query = UniswapQuery::new(UNISWAP_QUERY_ADDRESS, provider);

    Ok(query
        .getPairsByIndexRange(factory, from, to)
        .gas(QUERY_GAS)
        .call()
        .await?
        ._0
        .into_iter()
        .map(PairRow::from)
        .collect())
}

/// Retrieves all pairs of a factory, one batch after another until a short batch
///
/// # Errors
/// * If a contract call fails
pub async fn fetch_all_pairs_by_factory<P: Provider>(
    provider: &P,
    factory: Address,
    batch_size: u64,
) -> Result<Vec<PairRow>, Report> {
    let mut pairs = Vec::new();
    let mut start = U256::ZERO;
    let step = U256::from(batch_size);

    loop {
        let end = start + step;
        let batch = fetch_pairs_by_range(provider, factory, start, end).await?;
        let fetched = batch.len();
        pairs.extend(batch);
        if (fetched as u64) < batch_size {
            break;
        }
        start = end;
    }

    info!("Fetched {} pairs from factory {factory}", pairs.len());
    Ok(pairs)
}

/// Keeps pairs that trade `base` against a token outside `blacklist`, and only
/// for tokens with at least two such pairs.
///
/// # Arguments
/// * `rows` - Pairs found per protocol label
/// * `base` - Base asset
/// * `blacklist` - Tokens never traded
///
/// # Returns
/// Fresh pairs with empty reserves, grouped token by token
#[must_use]
pub fn select_markets(
    rows: &[(&str, Vec<PairRow>)],
    base: Address,
    blacklist: &[Address],
) -> Vec<UniswapV2Pair> {
    let mut by_token: BTreeMap<Address, Vec<UniswapV2Pair>> = BTreeMap::new();
    let mut seen = HashSet::new();

    for (protocol, pairs) in rows {
        for row in pairs {
            let Some(token) = row.other_token(base) else {
                continue;
            };
            if blacklist.contains(&token) || !seen.insert(row.address) {
                continue;
            }
            by_token.entry(token).or_default().push(UniswapV2Pair::new(
                row.address,
                [row.token0, row.token1],
                *protocol,
            ));
        }
    }

    by_token
        .into_values()
        .filter(|markets| markets.len() > 1)
        .flatten()
        .collect()
}

/// Groups pair snapshots by the token they trade against `base`
#[must_use]
pub fn group_by_token(pairs: &[UniswapV2Pair], base: Address) -> MarketsByToken {
    let mut markets_by_token = MarketsByToken::new();
    for pair in pairs {
        let [token0, token1] = pair.tokens();
        let token = if token0 == base { token1 } else { token0 };
        markets_by_token
            .entry(token)
            .or_default()
            .push(Arc::new(pair.clone()) as Arc<dyn Market>);
    }
    markets_by_token
}

/// A watched market, as printed by the `markets` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    /// Protocol label
    pub protocol: String,
    /// Pool address
    pub address: Address,
}

/// The markets watched for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMarkets {
    /// The token traded against the base asset
    pub token: Address,
    /// Its markets
    pub markets: Vec<MarketSummary>,
}

/// Token by token listing of `markets_by_token`
#[must_use]
pub fn summarize(markets_by_token: &MarketsByToken) -> Vec<TokenMarkets> {
    markets_by_token
        .iter()
        .map(|(token, markets)| TokenMarkets {
            token: *token,
            markets: markets
                .iter()
                .map(|market| MarketSummary {
                    protocol: market.protocol().to_string(),
                    address: market.address(),
                })
                .collect(),
        })
        .collect()
}

/// Discovers the markets to watch across `factories`
///
/// # Arguments
/// * `provider` - Node connection
/// * `factories` - `(protocol label, factory address)` pairs
/// * `base` - Base asset
/// * `blacklist` - Tokens never traded
///
/// # Errors
/// * If any factory cannot be paged
pub async fn discover_markets<P: Provider>(
    provider: &P,
    factories: &[(&str, Address)],
    base: Address,
    blacklist: &[Address],
) -> Result<Vec<UniswapV2Pair>, Report> {
    let mut rows = Vec::with_capacity(factories.len());
    for (protocol, factory) in factories {
        let pairs = fetch_all_pairs_by_factory(provider, *factory, BATCH_SIZE).await?;
        rows.push((*protocol, pairs));
    }

    let markets = select_markets(&rows, base, blacklist);
    info!(
        "Watching {} markets across {} tokens",
        markets.len(),
        group_by_token(&markets, base).len()
    );
    Ok(markets)
}
