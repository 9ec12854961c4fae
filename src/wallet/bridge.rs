//! HTTP JSON-RPC bridge to a wallet
//!
//! Each EIP-1193 request is posted as a JSON-RPC 2.0 call. Pointing the bridge
//! at a node (e.g. Hardhat's unlocked accounts) works for reads and sends;
//! the wallet-only methods need a bridge in front of a real wallet.

use super::Eip1193Provider;
use crate::constants::BRIDGE_TIMEOUT;
use crate::error::{bail, Context, ProviderRpcError, Report, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<ProviderRpcError>,
}

/// EIP-1193 provider that forwards requests over HTTP
#[derive(Debug)]
pub struct JsonRpcBridge {
    url: String,
    client: Client,
    next_id: AtomicU64,
    metamask: bool,
}

impl JsonRpcBridge {
    /// Create a bridge to `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, BRIDGE_TIMEOUT)
    }

    /// Create a bridge with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
            metamask: false,
        })
    }

    /// Mark the wallet behind the bridge as MetaMask
    pub fn with_metamask(mut self, metamask: bool) -> Self {
        self.metamask = metamask;
        self
    }

    /// Bridge endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Eip1193Provider for JsonRpcBridge {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("bridge request #{} {}", id, method);

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to send {} to wallet bridge", method))?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read bridge response")?;

        let body: JsonRpcResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                bail!("Wallet bridge returned {} for {}: {}", status, method, text)
            }
            Err(e) => {
                return Err(Report::new(e).wrap_err(format!(
                    "Failed to parse bridge response: {}",
                    text.chars().take(200).collect::<String>()
                )))
            }
        };

        if let Some(error) = body.error {
            tracing::debug!("bridge request #{} {} failed: {}", id, method, error);
            return Err(Report::new(error).wrap_err(format!("{} rejected by wallet", method)));
        }

        if !status.is_success() {
            bail!("Wallet bridge returned {} for {}", status, method);
        }

        Ok(body.result)
    }

    fn is_metamask(&self) -> bool {
        self.metamask
    }
}
