use alloy::primitives::{Address, U256};

/// One pair as returned by `UniswapQuery.getPairsByIndexRange`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRow {
    /// Token 0
    pub token0: Address,
    /// Token 1
    pub token1: Address,
    /// Address of the pair
    pub address: Address,
}

impl PairRow {
    /// The token traded against `base`, if the pair trades `base` at all
    #[must_use]
    pub fn other_token(&self, base: Address) -> Option<Address> {
        if self.token0 == base {
            Some(self.token1)
        } else if self.token1 == base {
            Some(self.token0)
        } else {
            None
        }
    }
}

impl From<[Address; 3]> for PairRow {
    fn from(row: [Address; 3]) -> Self {
        Self {
            token0: row[0],
            token1: row[1],
            address: row[2],
        }
    }
}

/// Reserves of one pair. The helper's third column, the last update
/// timestamp, is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    /// Reserve 0
    pub reserve0: U256,
    /// Reserve 1
    pub reserve1: U256,
}

impl From<[U256; 3]> for Reserves {
    fn from([reserve0, reserve1, _]: [U256; 3]) -> Self {
        Self { reserve0, reserve1 }
    }
}
