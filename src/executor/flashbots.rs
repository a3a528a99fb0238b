//! JSON-RPC client for a Flashbots-compatible bundle relay.
//!
//! Every request is authenticated with the `X-Flashbots-Signature` header: the
//! relay-signing key's personal-message signature over the hex keccak-256 of
//! the request body. The relay-signing key only builds reputation, it never
//! holds funds.

use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use eyre::{bail, eyre, Result, WrapErr};
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::relay::{BundleReceipt, Relay, SignedBundle, Simulation};

/// Authentication header expected by the relay
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Default public relay endpoint
pub const DEFAULT_RELAY_URL: &str = "https://relay.flashbots.net";

/// Timeout applied to every relay request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bundle relay client.
///
/// `P` is only used to fill nonces and the chain id when signing.
#[derive(Debug, Clone)]
pub struct FlashbotsRelay<P> {
    /// Node connection used while signing
    provider: P,
    /// Executing account, signs the transactions
    wallet: EthereumWallet,
    /// Address of the executing account
    account: Address,
    /// Key authenticating requests to the relay
    auth: PrivateKeySigner,
    /// Relay endpoint
    url: Url,
    /// HTTP client
    client: Client,
}

impl<P> FlashbotsRelay<P> {
    /// Creates a relay client
    ///
    /// # Arguments
    /// * `provider` - Node connection for nonce and chain id lookups
    /// * `signer` - Executing account
    /// * `auth` - Relay-signing key
    /// * `url` - Relay endpoint
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(provider: P, signer: PrivateKeySigner, auth: PrivateKeySigner, url: Url) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            provider,
            account: signer.address(),
            wallet: EthereumWallet::from(signer),
            auth,
            url,
            client,
        })
    }

    /// Address of the executing account
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Sends a signed JSON-RPC request and returns the raw response object
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": [params],
        })
        .to_string();
        let signature = signature_header(&self.auth, &body)?;

        debug!("relay {method} -> {}", self.url);
        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .wrap_err_with(|| format!("relay {method} request failed"))?
            .json::<Value>()
            .await
            .wrap_err_with(|| format!("relay {method} returned a non-JSON body"))?;
        Ok(response)
    }
}

/// `<address>:<signature>` over the hex keccak-256 of `body`
///
/// # Errors
/// * If signing fails
pub fn signature_header(auth: &PrivateKeySigner, body: &str) -> Result<String> {
    let digest = format!("0x{}", hex::encode(keccak256(body.as_bytes())));
    let signature = auth.sign_message_sync(digest.as_bytes())?;
    Ok(format!(
        "{}:0x{}",
        auth.address(),
        hex::encode(signature.as_bytes())
    ))
}

/// Message of a JSON-RPC error object, if the response carries one
fn rpc_error(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToString::to_string),
    )
}

/// Reads an `eth_callBundle` response
///
/// # Errors
/// * If the response has neither an error nor a well-formed result
pub fn parse_simulation(response: &Value) -> Result<Simulation> {
    if let Some(error) = rpc_error(response) {
        return Ok(Simulation {
            error: Some(error),
            ..Default::default()
        });
    }
    let result = response
        .get("result")
        .ok_or_else(|| eyre!("eth_callBundle response has no result: {response}"))?;

    let first_revert = result
        .get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|tx| {
            tx.get("error")
                .or_else(|| tx.get("revert"))
                .map(|reason| reason.as_str().map_or_else(|| reason.to_string(), ToString::to_string))
        });

    let coinbase_diff = match result.get("coinbaseDiff") {
        Some(Value::String(diff)) => diff
            .parse::<U256>()
            .wrap_err_with(|| format!("invalid coinbaseDiff {diff}"))?,
        Some(Value::Number(diff)) => U256::from(diff.as_u64().unwrap_or_default()),
        _ => U256::ZERO,
    };
    let total_gas_used = result
        .get("totalGasUsed")
        .and_then(Value::as_u64)
        .unwrap_or_default();

    Ok(Simulation {
        error: None,
        first_revert,
        coinbase_diff,
        total_gas_used,
    })
}

/// Reads an `eth_sendBundle` response
///
/// # Errors
/// * If the relay refused the bundle
pub fn parse_receipt(response: &Value, target_block: u64) -> Result<BundleReceipt> {
    if let Some(error) = rpc_error(response) {
        bail!("relay refused bundle for block {target_block}: {error}");
    }
    let bundle_hash = response
        .get("result")
        .and_then(|result| result.get("bundleHash"))
        .and_then(Value::as_str)
        .map(ToString::to_string);
    Ok(BundleReceipt {
        target_block,
        bundle_hash,
    })
}

#[async_trait]
impl<P: Provider + Send + Sync> Relay for FlashbotsRelay<P> {
    async fn sign_bundle(&self, transactions: Vec<TransactionRequest>) -> Result<SignedBundle> {
        let mut nonce = self
            .provider
            .get_transaction_count(self.account)
            .pending()
            .await?;
        let chain_id = self.provider.get_chain_id().await?;

        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let envelope = transaction
                .with_from(self.account)
                .with_nonce(nonce)
                .with_chain_id(chain_id)
                .build(&self.wallet)
                .await
                .map_err(|e| eyre!("bundle signing failed: {e}"))?;
            signed.push(Bytes::from(envelope.encoded_2718()));
            nonce += 1;
        }
        Ok(SignedBundle {
            transactions: signed,
        })
    }

    async fn simulate(&self, bundle: &SignedBundle, target_block: u64) -> Result<Simulation> {
        let params = json!({
            "txs": bundle.raw_hex(),
            "blockNumber": format!("0x{target_block:x}"),
            "stateBlockNumber": "latest",
        });
        parse_simulation(&self.request("eth_callBundle", params).await?)
    }

    async fn send_raw_bundle(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> Result<BundleReceipt> {
        let params = json!({
            "txs": bundle.raw_hex(),
            "blockNumber": format!("0x{target_block:x}"),
        });
        parse_receipt(&self.request("eth_sendBundle", params).await?, target_block)
    }
}
