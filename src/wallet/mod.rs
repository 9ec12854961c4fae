//! EIP-1193 wallet provider abstraction
//!
//! The dashboard talks to wallets only through the EIP-1193 `request`
//! surface (`wallet_addEthereumChain`, `eth_requestAccounts`,
//! `eth_sendTransaction`, ...). Two providers ship with the crate:
//! - `JsonRpcBridge`: forwards requests over HTTP to a wallet bridge or node
//! - `LocalWallet`: an in-process development wallet backed by a private key

mod bridge;
mod local;
#[cfg(test)]
pub(crate) mod scripted;

pub use bridge::JsonRpcBridge;
pub use local::LocalWallet;

use crate::config::{ChainId, NativeCurrency};
use crate::error::{eyre, Context, Result};
use alloy::primitives::{Address, Bytes, TxHash, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Events a wallet emits after connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// `accountsChanged`: the first entry is the selected account, empty when locked
    AccountsChanged(Vec<Address>),
    /// `chainChanged`
    ChainChanged(ChainId),
}

/// `wallet_addEthereumChain` parameters (EIP-3085)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub block_explorer_urls: Option<Vec<String>>,
}

/// `eth_sendTransaction` parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    /// Sending account
    pub from: Address,
    /// Target contract address
    pub to: Address,
    /// Encoded calldata
    #[serde(default)]
    pub data: Bytes,
    /// Transaction value in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Optional gas limit override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
}

impl TxRequest {
    /// Create a new transaction request
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            data: data.into(),
            value: None,
            gas: None,
        }
    }

    /// Set transaction value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Set gas limit
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas = Some(U64::from(gas_limit));
        self
    }
}

/// The parts of `eth_getTransactionReceipt` the dashboard reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` success, `0x0` reverted; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<U64>,
}

impl ReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }
}

/// An EIP-1193 provider
///
/// Errors carrying a wallet error code are reported as
/// [`ProviderRpcError`](crate::error::ProviderRpcError) inside the `eyre` report.
pub trait Eip1193Provider: Send + Sync {
    /// Send a request, returning the raw JSON result
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;

    /// Whether this provider identifies itself as MetaMask
    fn is_metamask(&self) -> bool {
        false
    }

    /// Subscribe to `accountsChanged` / `chainChanged`, if the provider emits them
    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        None
    }
}

/// Typed wrappers over the raw EIP-1193 methods the dashboard uses
pub trait WalletRequests {
    /// `wallet_addEthereumChain`; returns whatever the wallet answers (MetaMask: `null`)
    fn add_chain(
        &self,
        params: &AddChainParams,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;

    /// `wallet_switchEthereumChain`
    fn switch_chain(&self, chain_id: ChainId)
        -> impl std::future::Future<Output = Result<()>> + Send;

    /// `eth_chainId`
    fn chain_id(&self) -> impl std::future::Future<Output = Result<ChainId>> + Send;

    /// `eth_requestAccounts`
    fn request_accounts(&self) -> impl std::future::Future<Output = Result<Vec<Address>>> + Send;

    /// `eth_sendTransaction`
    fn send_transaction(
        &self,
        tx: &TxRequest,
    ) -> impl std::future::Future<Output = Result<TxHash>> + Send;

    /// `eth_call` against the latest block
    fn call(
        &self,
        to: Address,
        data: Bytes,
    ) -> impl std::future::Future<Output = Result<Bytes>> + Send;

    /// `eth_getTransactionReceipt`; `None` while pending
    fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl std::future::Future<Output = Result<Option<ReceiptSummary>>> + Send;
}

impl<P: Eip1193Provider> WalletRequests for P {
    async fn add_chain(&self, params: &AddChainParams) -> Result<Value> {
        let params = serde_json::to_value(params).context("Failed to encode chain params")?;
        self.request("wallet_addEthereumChain", json!([params])).await
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await?;
        Ok(())
    }

    async fn chain_id(&self) -> Result<ChainId> {
        let result = self.request("eth_chainId", json!([])).await?;
        parse_chain_id(&result)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let result = self.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(&result)
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<TxHash> {
        let params = serde_json::to_value(tx).context("Failed to encode transaction")?;
        let result = self.request("eth_sendTransaction", json!([params])).await?;
        serde_json::from_value(result).context("eth_sendTransaction must return a tx hash")
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        serde_json::from_value(result).context("eth_call must return hex data")
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        serde_json::from_value(result).context("Failed to decode transaction receipt")
    }
}

/// Parse an `eth_chainId` style value (hex string, decimal string or number)
pub fn parse_chain_id(value: &Value) -> Result<ChainId> {
    match value {
        Value::String(s) => s.parse(),
        Value::Number(n) => n
            .as_u64()
            .map(ChainId)
            .ok_or_else(|| eyre!("Invalid chain ID: {}", n)),
        other => Err(eyre!("Invalid chain ID: {}", other)),
    }
}

/// Parse an `eth_requestAccounts` / `accountsChanged` payload
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>> {
    let items = value
        .as_array()
        .ok_or_else(|| eyre!("Accounts result must be an array, got {}", value))?;
    items
        .iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| eyre!("Account must be a string, got {}", item))?;
            raw.parse::<Address>()
                .with_context(|| format!("Invalid account {}", raw))
        })
        .collect()
}

/// Injected wallet(s), as found on `window.ethereum`
///
/// When several extensions are installed, `providers` lists each of them and
/// `primary` is whichever one won the injection race.
#[derive(Debug, Clone)]
pub struct InjectedProviders<P> {
    pub primary: P,
    pub providers: Vec<P>,
}

impl<P> InjectedProviders<P> {
    pub fn single(primary: P) -> Self {
        Self {
            primary,
            providers: Vec::new(),
        }
    }
}

/// Pick the MetaMask provider out of the injected wallets
///
/// With a multi-wallet list the first MetaMask entry wins, falling back to the
/// primary provider. A lone provider is used only if it is MetaMask.
pub fn select_provider<P: Eip1193Provider>(injected: Option<InjectedProviders<P>>) -> Option<P> {
    let InjectedProviders { primary, providers } = injected?;

    if !providers.is_empty() {
        return Some(
            providers
                .into_iter()
                .find(|p| p.is_metamask())
                .unwrap_or(primary),
        );
    }

    if primary.is_metamask() {
        Some(primary)
    } else {
        None
    }
}
