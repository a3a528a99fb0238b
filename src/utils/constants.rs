use alloy::primitives::{address, Address, U256};

/// One ether in wei, the reference unit for quote probes and thresholds
pub const ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// WETH address (Ethereum mainnet)
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// Batch query helper deployed next to the bundle executor; pages factory pairs and reserves
pub const UNISWAP_QUERY_ADDRESS: Address =
    address!("0x5EF1009b9FCD4fec3094a5564047e190D72Bd511");

/// Uniswap V2 style factories scanned for WETH pairs, with the protocol label
/// their pairs are reported under
pub const FACTORIES: [(&str, Address); 5] = [
    ("UniswapV2", address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f")),
    ("Sushiswap", address!("0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac")),
    ("CroDefiSwap", address!("0x9DEB29c9a4c7A88a3C0257393b7f3335338D9A9D")),
    ("Zeus", address!("0xbdda21dd8da31d5bee0c9bb886c044ebb9b8906a")),
    ("Luaswap", address!("0x0388c1e0f210abae597b7de712b9510c6c36c857")),
];

/// Tokens whose pairs are never traded (fee-on-transfer or otherwise broken)
pub const BLACKLISTED_TOKENS: [Address; 1] =
    [address!("0xD75EA151a61d06868E31F8988D28DFE5E9df57B4")];
