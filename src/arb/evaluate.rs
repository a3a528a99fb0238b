//! Turns the market map into a ranked list of crossed-market opportunities.

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};
use itertools::Itertools;
use log::{debug, trace};

use super::crossed::best_crossed_market;
use super::market::Market;
use super::types::{CrossedPair, MarketsByToken, Opportunity};

/// Token amount each market is priced at when looking for crossings
pub const PROBE_VOLUME: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Minimum profit, in base-asset wei, for an opportunity to be reported
pub const MIN_PROFIT: U256 = U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);

/// Base asset paid for, and received for, [`PROBE_VOLUME`] of a token on one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProbePrice {
    /// Base in to receive the probe volume of token
    buy: U256,
    /// Base out for selling the probe volume of token
    sell: U256,
}

/// Prices every market of `token` at the probe volume.
/// Markets that cannot quote the probe are left out.
fn probe_prices(
    markets: &[Arc<dyn Market>],
    token: Address,
    base: Address,
) -> Vec<(Arc<dyn Market>, ProbePrice)> {
    markets
        .iter()
        .filter_map(|market| {
            let buy = market.quote_in(base, token, PROBE_VOLUME);
            let sell = market.quote_out(token, base, PROBE_VOLUME);
            match (buy, sell) {
                (Ok(buy), Ok(sell)) => Some((market.clone(), ProbePrice { buy, sell })),
                (Err(e), _) | (_, Err(e)) => {
                    trace!("Market {} left out of token {token}: {e}", market.address());
                    None
                }
            }
        })
        .collect()
}

/// Ordered pairs of distinct markets where one sells the token for more than
/// the other charges for it, as `(sell_to, buy_from)`
fn crossed_pairs(priced: &[(Arc<dyn Market>, ProbePrice)]) -> Vec<CrossedPair> {
    priced
        .iter()
        .cartesian_product(priced.iter())
        .filter(|((buy_from, _), (sell_to, _))| buy_from.address() != sell_to.address())
        .filter(|((_, buy_price), (_, sell_price))| sell_price.sell > buy_price.buy)
        .map(|((buy_from, _), (sell_to, _))| (sell_to.clone(), buy_from.clone()))
        .collect()
}

/// Finds, for every token, the best crossing between its markets, keeps those
/// clearing [`MIN_PROFIT`] and returns them most profitable first.
///
/// Evaluation is a pure function of the reserve snapshots in `markets_by_token`.
/// Tokens are visited in key order and the sort is stable, so equal profits
/// keep that order.
#[must_use]
pub fn evaluate_markets(markets_by_token: &MarketsByToken, base: Address) -> Vec<Opportunity> {
    let threshold = I256::from_raw(MIN_PROFIT);
    let mut opportunities: Vec<Opportunity> = markets_by_token
        .iter()
        .filter_map(|(token, markets)| {
            let priced = probe_prices(markets, *token, base);
            let crossed = crossed_pairs(&priced);
            if crossed.is_empty() {
                return None;
            }
            debug!("{} crossed markets for token {token}", crossed.len());
            best_crossed_market(&crossed, *token, base)
        })
        .filter(|opportunity| opportunity.profit > threshold)
        .collect();

    opportunities.sort_by(|a, b| b.profit.cmp(&a.profit));
    opportunities
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::*;
    use crate::utils::constants::{ETHER, WETH};

    #[test]
    fn test_constants() {
        assert_eq!(PROBE_VOLUME, ETHER / U256::from(100));
        assert_eq!(MIN_PROFIT, ETHER / U256::from(1000));
    }

    #[test]
    fn test_empty_map() {
        assert!(evaluate_markets(&MarketsByToken::new(), WETH).is_empty());
    }

    /// Two markets for `token`, the second selling above what the first charges,
    /// with a constant `profit` at every volume
    fn crossing(prefix: &str, on: Address, profit: i128) -> (Address, Vec<Arc<dyn Market>>) {
        let cheap = StubMarket::new(&format!("{prefix}-buy"))
            .on(on)
            .buy_price(PROBE_VOLUME)
            .sell(|t| t.checked_sub(U256::from(1)))
            .build();
        let dear = StubMarket::new(&format!("{prefix}-sell"))
            .on(on)
            .buy_price(PROBE_VOLUME + U256::from(2))
            .sell_with_profit(move |_| profit)
            .build();
        (on, vec![cheap, dear])
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let at_threshold = address_from_str("AT");
        let above = address_from_str("ABOVE");
        let map = markets_by_token(vec![
            crossing("a", at_threshold, 1_000_000_000_000_000),
            crossing("b", above, 1_000_000_000_000_001),
        ]);

        let opportunities = evaluate_markets(&map, WETH);
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].token, above);
        assert_eq!(
            opportunities[0].profit,
            I256::from_raw(MIN_PROFIT + U256::from(1))
        );
    }

    #[test]
    fn test_ranked_by_profit() {
        let ether = 1_000_000_000_000_000_000_i128;
        let map = markets_by_token(vec![
            crossing("five", address_from_str("T5"), 5 * ether),
            crossing("one", address_from_str("T1"), ether),
            crossing("three", address_from_str("T3"), 3 * ether),
        ]);

        let profits: Vec<I256> = evaluate_markets(&map, WETH)
            .iter()
            .map(|o| o.profit)
            .collect();
        assert_eq!(
            profits,
            vec![
                I256::try_from(5 * ether).unwrap(),
                I256::try_from(3 * ether).unwrap(),
                I256::try_from(ether).unwrap(),
            ]
        );
    }

    #[test]
    fn test_equal_profits_keep_token_order() {
        let finney = 1_000_000_000_000_000_i128;
        let first = address_from_str("T-first");
        let second = address_from_str("T-second");
        let map = markets_by_token(vec![
            crossing("x", first, 2 * finney),
            crossing("y", second, 2 * finney),
        ]);
        let expected: Vec<Address> = map.keys().copied().collect();

        let tokens: Vec<Address> = evaluate_markets(&map, WETH)
            .iter()
            .map(|o| o.token)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let map = markets_by_token(vec![
            crossing("a", address_from_str("A"), 4_000_000_000_000_000),
            crossing("b", address_from_str("B"), 7_000_000_000_000_000),
        ]);
        let summary = |opportunities: Vec<Opportunity>| {
            opportunities
                .iter()
                .map(|o| (o.token, o.profit, o.volume, o.buy_from.address(), o.sell_to.address()))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            summary(evaluate_markets(&map, WETH)),
            summary(evaluate_markets(&map, WETH))
        );
    }

    #[test]
    fn test_two_market_crossing() {
        // M1 charges 100 for the probe and pays 99, M2 charges 102 and pays 101
        let m1 = StubMarket::new("M1")
            .buy_price(U256::from(100))
            .sell(|t| {
                if t == PROBE_VOLUME {
                    Some(U256::from(99))
                } else {
                    Some(t)
                }
            })
            .build();
        let m2 = StubMarket::new("M2")
            .buy_price(U256::from(102))
            .sell(|t| {
                if t == PROBE_VOLUME {
                    Some(U256::from(101))
                } else if t <= ETHER {
                    // profit t / 2 up to one ether, falling afterwards
                    Some(t + t / U256::from(2))
                } else {
                    Some(t + ETHER - t / U256::from(2))
                }
            })
            .build();
        let map = markets_by_token(vec![(token(), vec![m1.clone(), m2.clone()])]);

        let opportunities = evaluate_markets(&map, WETH);
        assert_eq!(opportunities.len(), 1);
        let best = &opportunities[0];
        assert_eq!(best.buy_from.address(), m1.address());
        assert_eq!(best.sell_to.address(), m2.address());
        assert_eq!(best.volume, ETHER);
        assert_eq!(best.profit, I256::from_raw(ETHER / U256::from(2)));
    }

    #[test]
    fn test_unpriceable_market_is_left_out() {
        let priced = StubMarket::new("M1").buy_price(U256::from(100)).build();
        let broken = StubMarket::new("M2")
            .without_buy_price()
            .sell(|t| Some(t * U256::from(2)))
            .build();
        let map = markets_by_token(vec![(token(), vec![priced, broken])]);

        assert!(evaluate_markets(&map, WETH).is_empty());
    }

    #[test]
    fn test_single_market_never_crosses_itself() {
        let generous = StubMarket::new("M1")
            .buy_price(U256::from(1))
            .sell(|t| Some(t * U256::from(2)))
            .build();
        let map = markets_by_token(vec![(token(), vec![generous])]);

        assert!(evaluate_markets(&map, WETH).is_empty());
    }

    #[test]
    fn test_uniswap_v2_crossing() {
        let buy_from = v2_pair("P1", 100 * 10_u128.pow(18), 200 * 10_u128.pow(18));
        let sell_to = v2_pair("P2", 100 * 10_u128.pow(18), 180 * 10_u128.pow(18));
        let map = markets_by_token(vec![(token(), vec![buy_from.clone(), sell_to.clone()])]);

        let opportunities = evaluate_markets(&map, WETH);
        assert_eq!(opportunities.len(), 1);
        let best = &opportunities[0];
        assert_eq!(best.buy_from.address(), buy_from.address());
        assert_eq!(best.sell_to.address(), sell_to.address());
        assert_eq!(best.volume, ETHER * U256::from(2));
        assert_eq!(
            best.profit,
            I256::from_raw(U256::from(119_814_995_994_247_036_u128))
        );
    }
}
