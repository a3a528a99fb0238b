//! Sampled-volume search for the most profitable crossing between markets
//! of the same token.
//!
//! Profit is assumed to rise then fall with volume: the ladder is walked
//! upwards and the first downturn ends the walk for that pair, after a single
//! probe halfway back towards the best volume seen so far.

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use log::debug;

use super::market::{Market, MarketError};
use super::types::{CrossedPair, Opportunity};

/// Trial volumes in base-asset wei: 1/100, 1/10, 1/6, 1/4, 1/2, 1, 2, 5 and 10 ether
pub const TEST_VOLUMES: [U256; 9] = [
    U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([166_666_666_666_666_666, 0, 0, 0]),
    U256::from_limbs([250_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([2_000_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([5_000_000_000_000_000_000, 0, 0, 0]),
    U256::from_limbs([10_000_000_000_000_000_000, 0, 0, 0]),
];

/// Base asset left over after buying `token` with `volume` on `buy_from` and
/// selling all of it on `sell_to`
///
/// # Errors
/// * If either market cannot quote its leg
pub fn profit_at(
    sell_to: &dyn Market,
    buy_from: &dyn Market,
    token: Address,
    base: Address,
    volume: U256,
) -> Result<I256, MarketError> {
    let tokens_out = buy_from.quote_out(base, token, volume)?;
    let proceeds = sell_to.quote_out(token, base, tokens_out)?;
    Ok(I256::from_raw(proceeds).saturating_sub(I256::from_raw(volume)))
}

/// The best crossing over all `crossed_markets`, or `None` if there were none
/// to quote.
///
/// A single best is kept across every pair and sample and only a strictly
/// larger profit replaces it, so equal profits keep the earliest candidate.
/// A pair whose quotes fail is skipped as if it was never there.
#[must_use]
pub fn best_crossed_market(
    crossed_markets: &[CrossedPair],
    token: Address,
    base: Address,
) -> Option<Opportunity> {
    let mut best = None;
    for (sell_to, buy_from) in crossed_markets {
        match scan_pair(best.clone(), sell_to, buy_from, token, base) {
            Ok(scanned) => best = scanned,
            Err(e) => debug!(
                "Skipping crossed market {} -> {} for token {token}: {e}",
                buy_from.address(),
                sell_to.address()
            ),
        }
    }
    best
}

/// Walks the volume ladder for one pair, starting from the running best
fn scan_pair(
    mut best: Option<Opportunity>,
    sell_to: &Arc<dyn Market>,
    buy_from: &Arc<dyn Market>,
    token: Address,
    base: Address,
) -> Result<Option<Opportunity>, MarketError> {
    let opportunity = |volume: U256, profit: I256| Opportunity {
        profit,
        volume,
        token,
        buy_from: buy_from.clone(),
        sell_to: sell_to.clone(),
    };

    for size in TEST_VOLUMES {
        let profit = profit_at(sell_to.as_ref(), buy_from.as_ref(), token, base, size)?;

        match &best {
            Some(current) if profit < current.profit => {
                // Past the peak: meet halfway once, then give up on this pair
                let try_size = (size + current.volume) / U256::from(2);
                let try_profit =
                    profit_at(sell_to.as_ref(), buy_from.as_ref(), token, base, try_size)?;
                if try_profit > current.profit {
                    best = Some(opportunity(try_size, try_profit));
                }
                break;
            }
            Some(current) if profit == current.profit => {}
            _ => best = Some(opportunity(size, profit)),
        }
    }
    Ok(best)
}
