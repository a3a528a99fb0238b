/// Health check pings
pub mod healthcheck;

pub use healthcheck::Healthcheck;
