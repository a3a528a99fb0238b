//! Constant-product pool adapter for Uniswap V2 and its forks ("Uniswappy" pairs).
//! Quotes follow the pair contract's integer math with the 0.3% fee.
use std::fmt::{self, Debug};

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use super::market::{CallBatch, Market, MarketError};
use crate::abi::IUniswapV2Pair;

/// Fee numerator, out of [`FEE_DENOMINATOR`]
const FEE_NUMERATOR: u64 = 997;
/// Fee denominator
const FEE_DENOMINATOR: u64 = 1000;

/// A Uniswap V2 style pair with an immutable reserve snapshot.
///
/// Reserves are refreshed by building a new snapshot with
/// [`UniswapV2Pair::with_reserves`], so a pair shared between the evaluator
/// and the executor never changes under them.
#[derive(Clone, PartialEq, Eq)]
pub struct UniswapV2Pair {
    /// The address of the pair
    address: Address,
    /// `token0` and `token1` as ordered on-chain
    tokens: [Address; 2],
    /// Reserves, same order as `tokens`
    reserves: [U256; 2],
    /// Protocol label, e.g. "UniswapV2" or the fork name
    protocol: String,
}

impl Debug for UniswapV2Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UniswapV2Pair({:?}, {} {:?} / {} {:?})",
            self.address, self.reserves[0], self.tokens[0], self.reserves[1], self.tokens[1]
        )
    }
}

impl UniswapV2Pair {
    /// Creates a pair with zero reserves; refresh it before quoting.
    #[must_use]
    pub fn new(address: Address, tokens: [Address; 2], protocol: impl Into<String>) -> Self {
        Self {
            address,
            tokens,
            reserves: [U256::ZERO; 2],
            protocol: protocol.into(),
        }
    }

    /// A copy of this pair with a new reserve snapshot
    #[must_use]
    pub fn with_reserves(&self, reserve0: U256, reserve1: U256) -> Self {
        Self {
            reserves: [reserve0, reserve1],
            ..self.clone()
        }
    }

    /// Current reserves, in `tokens` order
    #[must_use]
    pub const fn reserves(&self) -> [U256; 2] {
        self.reserves
    }

    /// Position of `token` in the pair
    fn index_of(&self, token: Address) -> Result<usize, MarketError> {
        self.tokens
            .iter()
            .position(|t| *t == token)
            .ok_or(MarketError::UnsupportedToken {
                market: self.address,
                token,
            })
    }

    /// `(reserve_in, reserve_out)` for a swap direction
    fn reserves_for(&self, token_in: Address, token_out: Address) -> Result<(U256, U256), MarketError> {
        let index_in = self.index_of(token_in)?;
        let index_out = self.index_of(token_out)?;
        if index_in == index_out {
            return Err(MarketError::UnsupportedToken {
                market: self.address,
                token: token_out,
            });
        }
        Ok((self.reserves[index_in], self.reserves[index_out]))
    }

    /// `getAmountOut` of the Uniswap V2 library
    fn amount_out(&self, reserve_in: U256, reserve_out: U256, amount_in: U256) -> Result<U256, MarketError> {
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(MarketError::InsufficientLiquidity {
                market: self.address,
                requested: amount_in,
                available: U256::ZERO,
            });
        }
        let amount_in_with_fee = amount_in * U256::from(FEE_NUMERATOR);
        let numerator = amount_in_with_fee * reserve_out;
        let denominator = reserve_in * U256::from(FEE_DENOMINATOR) + amount_in_with_fee;
        Ok(numerator / denominator)
    }

    /// `getAmountIn` of the Uniswap V2 library
    fn amount_in(&self, reserve_in: U256, reserve_out: U256, amount_out: U256) -> Result<U256, MarketError> {
        if reserve_in.is_zero() || amount_out >= reserve_out {
            return Err(MarketError::InsufficientLiquidity {
                market: self.address,
                requested: amount_out,
                available: reserve_out,
            });
        }
        let numerator = reserve_in * amount_out * U256::from(FEE_DENOMINATOR);
        let denominator = (reserve_out - amount_out) * U256::from(FEE_NUMERATOR);
        Ok(numerator / denominator + U256::from(1))
    }
}

impl Market for UniswapV2Pair {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn address(&self) -> Address {
        self.address
    }

    fn tokens(&self) -> [Address; 2] {
        self.tokens
    }

    fn quote_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, MarketError> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in, token_out)?;
        self.amount_out(reserve_in, reserve_out, amount_in)
    }

    fn quote_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> Result<U256, MarketError> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in, token_out)?;
        self.amount_in(reserve_in, reserve_out, amount_out)
    }

    /// A pair settles against its balance, so tokens sent ahead of `swap` count as input.
    fn receives_directly(&self, token: Address) -> bool {
        self.tokens.contains(&token)
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

    fn build_sell(
        &self,
        token_in: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes, MarketError> {
        let index_in = self.index_of(token_in)?;
        let token_out = self.tokens[1 - index_in];
        let amount_out = self.quote_out(token_in, token_out, amount_in)?;

        let (amount0_out, amount1_out) = if index_in == 0 {
            (U256::ZERO, amount_out)
        } else {
            (amount_out, U256::ZERO)
        };
        let call = IUniswapV2Pair::swapCall {
            amount0Out: amount0_out,
            amount1Out: amount1_out,
            to: recipient,
            data: Bytes::new(),
        };
        Ok(Bytes::from(call.abi_encode()))
    }
}
