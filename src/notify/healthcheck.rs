use eyre::{eyre, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Dead-man's-switch pinger, hit after every submitted bundle
#[derive(Debug, Clone)]
pub struct Healthcheck {
    /// The ping URL
    url: Url,
    /// The HTTP client
    client: Client,
}

impl Healthcheck {
    /// Create a new pinger for `url`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(url: Url) -> Result<Self> {
        // Create a client with a timeout
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { url, client })
    }

    /// Send one ping
    ///
    /// # Errors
    /// * If the request fails or the endpoint answers with an error status
    pub async fn ping(&self) -> Result<()> {
        let status = self.client.get(self.url.clone()).send().await?.status();
        if !status.is_success() {
            return Err(eyre!("Healthcheck {} answered {status}", self.url));
        }
        Ok(())
    }

    /// Ping without waiting for the answer; failures are only logged
    pub fn ping_in_background(&self) {
        let healthcheck = self.clone();
        tokio::spawn(async move {
            log::info!("Sending healthcheck request to: {}", healthcheck.url);
            if let Err(e) = healthcheck.ping().await {
                log::error!("Healthcheck failed: {e}");
            }
        });
    }
}
