#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, U256};

use super::market::{CallBatch, Market, MarketError};
use super::types::MarketsByToken;
use super::uniswap_v2::UniswapV2Pair;
use crate::utils::constants::{ETHER, WETH};

/// Deterministic address for a short label
pub fn address_from_str(label: &str) -> Address {
    Address::from_word(keccak256(label.as_bytes()))
}

/// The traded token used throughout the tests
pub fn token() -> Address {
    address_from_str("TKN")
}

/// `units` ether expressed in wei
pub fn ether(units: u64) -> U256 {
    ETHER * U256::from(units)
}

/// Ether fraction `numerator / denominator` in wei
pub fn ether_frac(numerator: u64, denominator: u64) -> U256 {
    ETHER * U256::from(numerator) / U256::from(denominator)
}

/// A WETH/token Uniswap V2 pair with raw reserves
pub fn v2_pair(label: &str, reserve_weth: u128, reserve_token: u128) -> Arc<dyn Market> {
    Arc::new(
        UniswapV2Pair::new(address_from_str(label), [WETH, token()], "UniswapV2")
            .with_reserves(U256::from(reserve_weth), U256::from(reserve_token)),
    )
}

/// `MarketsByToken` from `(token, markets)` entries
pub fn markets_by_token(entries: Vec<(Address, Vec<Arc<dyn Market>>)>) -> MarketsByToken {
    entries.into_iter().collect()
}

/// Quote curve of a stub market; `None` means the reserves cannot serve the amount
pub type Curve = Arc<dyn Fn(U256) -> Option<U256> + Send + Sync>;

/// In-memory market with scripted quotes.
///
/// `buy` maps base in to token out, `sell` maps token in to base out and
/// `buy_price` answers every `quote_in(base, token, _)`.
#[derive(Clone)]
pub struct StubMarket {
    /// Pool address
    pub address: Address,
    /// Traded token
    pub token: Address,
    /// Base in -> token out
    pub buy: Curve,
    /// Token in -> base out
    pub sell: Curve,
    /// Answer to `quote_in(base, token, _)`
    pub buy_price: Option<U256>,
    /// Whether the token may be sent straight in
    pub direct: bool,
    /// Counts `sell` quotes
    pub sell_quotes: Arc<AtomicUsize>,
}

impl Debug for StubMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StubMarket({:?})", self.address)
    }
}

impl StubMarket {
    /// 1:1 buy curve, 1:1 sell curve, buy price of one probe
    pub fn new(label: &str) -> Self {
        Self {
            address: address_from_str(label),
            token: token(),
            buy: Arc::new(|amount: U256| Some(amount)),
            sell: Arc::new(|amount: U256| Some(amount)),
            buy_price: Some(ETHER / U256::from(100)),
            direct: true,
            sell_quotes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Trades another token
    pub fn on(mut self, token: Address) -> Self {
        self.token = token;
        self
    }

    /// Scripted base-in -> token-out curve
    pub fn buy(mut self, curve: impl Fn(U256) -> Option<U256> + Send + Sync + 'static) -> Self {
        self.buy = Arc::new(curve);
        self
    }

    /// Scripted token-in -> base-out curve
    pub fn sell(mut self, curve: impl Fn(U256) -> Option<U256> + Send + Sync + 'static) -> Self {
        self.sell = Arc::new(curve);
        self
    }

    /// Sell curve with a fixed gain (or loss) over a 1:1 price
    pub fn sell_with_profit(self, profit: impl Fn(U256) -> i128 + Send + Sync + 'static) -> Self {
        self.sell(move |amount| {
            let delta = profit(amount);
            if delta >= 0 {
                Some(amount + U256::from(delta.unsigned_abs()))
            } else {
                amount.checked_sub(U256::from(delta.unsigned_abs()))
            }
        })
    }

    /// Scripted `quote_in(base, token, _)` answer
    pub fn buy_price(mut self, price: U256) -> Self {
        self.buy_price = Some(price);
        self
    }

    /// `quote_in` fails
    pub fn without_buy_price(mut self) -> Self {
        self.buy_price = None;
        self
    }

    /// The token can only arrive through an explicit transfer
    pub fn indirect(mut self) -> Self {
        self.direct = false;
        self
    }

    /// Shares the stub as a trait object
    pub fn build(self) -> Arc<dyn Market> {
        Arc::new(self)
    }

    /// Liquidity error for this stub
    fn dry(&self, requested: U256) -> MarketError {
        MarketError::InsufficientLiquidity {
            market: self.address,
            requested,
            available: U256::ZERO,
        }
    }
}

impl Market for StubMarket {
    fn protocol(&self) -> &str {
        "Stub"
    }

    fn address(&self) -> Address {
        self.address
    }

    fn tokens(&self) -> [Address; 2] {
        [WETH, self.token]
    }

    fn quote_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, MarketError> {
        if token_in == WETH && token_out == self.token {
            (self.buy)(amount_in).ok_or_else(|| self.dry(amount_in))
        } else if token_in == self.token && token_out == WETH {
            self.sell_quotes.fetch_add(1, Ordering::SeqCst);
            (self.sell)(amount_in).ok_or_else(|| self.dry(amount_in))
        } else {
            Err(MarketError::UnsupportedToken {
                market: self.address,
                token: token_in,
            })
        }
    }

    fn quote_in(
        &self,
        _token_in: Address,
        _token_out: Address,
        amount_out: U256,
    ) -> Result<U256, MarketError> {
        self.buy_price.ok_or_else(|| self.dry(amount_out))
    }

    fn receives_directly(&self, token: Address) -> bool {
        self.direct && token == self.token
    }

    fn build_sell_to_next(
        &self,
        token_in: Address,
        amount_in: U256,
        next: &dyn Market,
    ) -> Result<CallBatch, MarketError> {
        let payload = self.build_sell(token_in, amount_in, next.address())?;
        Ok(CallBatch::single(self.address, payload))
    }

    /// Payload is `recipient ++ amount_in` so tests can read it back
    fn build_sell(
        &self,
        _token_in: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes, MarketError> {
        let mut payload = recipient.to_vec();
        payload.extend_from_slice(&amount_in.to_be_bytes::<32>());
        Ok(Bytes::from(payload))
    }
}
