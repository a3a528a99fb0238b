/// Constants
pub mod constants;
/// Logger
pub mod logger;
/// Providers
pub mod providers;
