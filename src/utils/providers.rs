use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use eyre::{Result, WrapErr};
use url::Url;

/// Creates a new HTTP provider for Ethereum network communication
///
/// No fillers are attached: the relay client fills nonce and chain id itself
/// so the bundle is signed exactly as simulated.
///
/// # Errors
/// * If the RPC URL cannot be parsed
pub fn create_http_provider(rpc_url: &str) -> Result<RootProvider<Ethereum>> {
    let url = Url::parse(rpc_url).wrap_err_with(|| format!("invalid RPC url {rpc_url}"))?;
    Ok(RootProvider::new_http(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_http_provider_rejects_garbage() {
        let message = create_http_provider("not a url")
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(message.contains("invalid RPC url"));
    }

    #[test]
    fn test_create_http_provider() {
        assert!(create_http_provider("http://localhost:8545").is_ok());
    }
}
