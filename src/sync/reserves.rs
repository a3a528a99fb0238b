use alloy::primitives::Address;
use alloy::providers::Provider;
use eyre::{eyre, Result};
use futures::future::try_join_all;

use crate::abi::UniswapQuery;
use crate::arb::market::Market;
use crate::arb::uniswap_v2::UniswapV2Pair;
use crate::bootstrap::types::Reserves;
use crate::bootstrap::QUERY_GAS;
use crate::utils::constants::UNISWAP_QUERY_ADDRESS;

/// Pairs per `getReservesByPairs` call
pub const RESERVES_BATCH_SIZE: usize = 1000;

/// Retrieves reserves for a list of pairs
///
/// # Arguments
/// * `provider` - Node connection
/// * `pairs` - Pair addresses
///
/// # Returns
/// One `Reserves` per pair, in the same order
///
/// # Errors
/// * If the contract call fails
pub async fn fetch_reserves<P: Provider>(provider: &P, pairs: Vec<Address>) -> Result<Vec<Reserves>> {
    let query = UniswapQuery::new(UNISWAP_QUERY_ADDRESS, provider);

    Ok(query
        .getReservesByPairs(pairs)
        .gas(QUERY_GAS)
        .call()
        .await?
        ._0
        .into_iter()
        .map(Reserves::from)
        .collect())
}

/// New snapshots of `pairs` carrying `reserves`
///
/// # Errors
/// * If there is not exactly one `Reserves` per pair
pub fn apply_reserves(pairs: &[UniswapV2Pair], reserves: &[Reserves]) -> Result<Vec<UniswapV2Pair>> {
    if pairs.len() != reserves.len() {
        return Err(eyre!(
            "sync::reserves: got {} reserves for {} pairs",
            reserves.len(),
            pairs.len()
        ));
    }
    Ok(pairs
        .iter()
        .zip(reserves)
        .map(|(pair, reserves)| pair.with_reserves(reserves.reserve0, reserves.reserve1))
        .collect())
}

/// Fresh reserve snapshots for every pair, fetched in concurrent batches
///
/// # Errors
/// * If any batch fails, in which case no snapshot is replaced
pub async fn refresh_reserves<P: Provider>(
    provider: &P,
    pairs: &[UniswapV2Pair],
) -> Result<Vec<UniswapV2Pair>> {
    let batches = pairs.chunks(RESERVES_BATCH_SIZE).map(|chunk| async move {
        let addresses = chunk.iter().map(Market::address).collect();
        let reserves = fetch_reserves(provider, addresses).await?;
        apply_reserves(chunk, &reserves)
    });

    let refreshed: Vec<UniswapV2Pair> = try_join_all(batches).await?.into_iter().flatten().collect();
    log::debug!("sync::reserves: refreshed {} pairs", refreshed.len());
    Ok(refreshed)
}
