/// Sync reserves
///
/// Rebuilds market snapshots from the latest on-chain reserves.
pub mod reserves;

pub use reserves::refresh_reserves;
