//! Solidity interfaces used by the adapters, the bootstrap and the executor.

#![allow(missing_docs)]

use alloy::sol;

// Uniswap V2 style pair. Output tokens must already sit in the pair when `swap` runs.
sol! {
    interface IUniswapV2Pair {
        function swap(uint256 amount0Out, uint256 amount1Out, address to, bytes data) external;
    }
}

// Minimal ERC20 surface for the explicit-transfer fallback.
sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

// Executor contract. Sends `wethAmountToFirstMarket` WETH to `targets[0]`, runs every
// call, checks the WETH balance grew and pays `ethAmountToCoinbase` to the block producer.
sol! {
    interface BundleExecutor {
        function uniswapWeth(
            uint256 wethAmountToFirstMarket,
            uint256 ethAmountToCoinbase,
            address[] targets,
            bytes[] payloads
        ) external payable;
    }
}

// Read-only batch helper for factory paging and reserve refresh.
sol! {
    #[sol(rpc)]
    contract UniswapQuery {
        function getReservesByPairs(address[] pairs) external view returns (uint256[3][] memory);
        function getPairsByIndexRange(address factory, uint256 start, uint256 stop) external view returns (address[3][] memory);
    }
}
