//! The capability every pool adapter implements.
//!
//! The finder, the evaluator and the executor only talk to pools through
//! [`Market`]; each AMM protocol gets its own implementation.

use std::fmt::Debug;

use alloy::primitives::{Address, Bytes, U256};
use thiserror::Error;

/// Why a market could not quote or build a call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// The reserves cannot support the requested amount
    #[error("insufficient liquidity in market {market}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        /// The market that refused the quote
        market: Address,
        /// The amount asked for
        requested: U256,
        /// The relevant reserve
        available: U256,
    },
    /// The token is not one of the market's two tokens
    #[error("token {token} is not traded by market {market}")]
    UnsupportedToken {
        /// The market that was asked
        market: Address,
        /// The foreign token
        token: Address,
    },
}

/// An ordered list of contract calls, executed one after another by the executor contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallBatch {
    /// Call targets
    pub targets: Vec<Address>,
    /// Calldata, one entry per target
    pub payloads: Vec<Bytes>,
}

impl CallBatch {
    /// A batch holding a single call
    #[must_use]
    pub fn single(target: Address, payload: Bytes) -> Self {
        Self {
            targets: vec![target],
            payloads: vec![payload],
        }
    }

    /// Appends a call
    pub fn push(&mut self, target: Address, payload: Bytes) {
        self.targets.push(target);
        self.payloads.push(payload);
    }

    /// Appends every call of `other`, keeping order
    pub fn extend(&mut self, other: Self) {
        self.targets.extend(other.targets);
        self.payloads.extend(other.payloads);
    }
}

/// A liquidity pool trading exactly two tokens.
///
/// Quotes are pure functions of the reserve snapshot the market was built
/// with. They must fail with [`MarketError::InsufficientLiquidity`] rather
/// than return a misleading amount.
pub trait Market: Debug + Send + Sync {
    /// Protocol label, e.g. `"UniswapV2"`
    fn protocol(&self) -> &str;

    /// On-chain address of the pool
    fn address(&self) -> Address;

    /// The pool's two tokens in on-chain order
    fn tokens(&self) -> [Address; 2];

    /// Amount of `token_out` received for `amount_in` of `token_in`
    ///
    /// # Errors
    /// * If the token pair is not this market's
    /// * If the reserves cannot support the swap
    fn quote_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, MarketError>;

    /// Amount of `token_in` required to receive `amount_out` of `token_out`
    ///
    /// # Errors
    /// * If the token pair is not this market's
    /// * If `amount_out` cannot be paid out of the reserves
    fn quote_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> Result<U256, MarketError>;

    /// Whether `token` can be sent straight into this market ahead of a sell,
    /// with no explicit transfer step in between
    fn receives_directly(&self, token: Address) -> bool;

    /// Calls that sell `amount_in` of `token_in` here and deliver the output
    /// into `next`. Only valid when `next.receives_directly(token_out)`.
    ///
    /// # Errors
    /// * If `token_in` is not traded here or the swap cannot be quoted
    fn build_sell_to_next(
        &self,
        token_in: Address,
        amount_in: U256,
        next: &dyn Market,
    ) -> Result<CallBatch, MarketError>;

    /// Calldata that sells `amount_in` of `token_in` on this market, sending
    /// the proceeds to `recipient`. The call target is [`Market::address`].
    ///
    /// # Errors
    /// * If `token_in` is not traded here or the swap cannot be quoted
    fn build_sell(
        &self,
        token_in: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes, MarketError>;
}
