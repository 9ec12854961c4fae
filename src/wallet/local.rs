//! In-process development wallet backed by a private key

use super::{AddChainParams, Eip1193Provider, TxRequest, WalletEvent};
use crate::config::{ChainConfig, ChainId};
use crate::error::{eyre, Context, ProviderRpcError, Report, Result};
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// EIP-1193 provider that signs locally
///
/// Behaves like a browser wallet with a single unlocked account: it keeps a
/// list of known chains, switches between them on request, and answers
/// `wallet_switchEthereumChain` for unknown chains with error 4902. Methods
/// it does not handle itself are forwarded to the active chain's RPC.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    state: Mutex<WalletState>,
    events: broadcast::Sender<WalletEvent>,
}

#[derive(Debug)]
struct WalletState {
    chains: HashMap<ChainId, AddChainParams>,
    active: ChainId,
}

impl LocalWallet {
    /// Create a wallet from a hex private key (with or without 0x prefix),
    /// starting on `chain`
    pub fn from_private_key(private_key: impl AsRef<str>, chain: &ChainConfig) -> Result<Self> {
        let key = private_key.as_ref().trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            signer,
            state: Mutex::new(WalletState {
                chains: HashMap::from([(chain.id, chain.add_chain_params())]),
                active: chain.id,
            }),
            events,
        })
    }

    /// The wallet's only account
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Currently selected chain
    pub fn active_chain(&self) -> Result<ChainId> {
        Ok(self.lock()?.active)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, WalletState>> {
        self.state
            .lock()
            .map_err(|e| eyre!("wallet state lock poisoned: {e}"))
    }

    fn active_rpc_url(&self) -> Result<Url> {
        let state = self.lock()?;
        let params = state
            .chains
            .get(&state.active)
            .ok_or_else(|| eyre!("Active chain {} has no parameters", state.active))?;
        let rpc = params
            .rpc_urls
            .first()
            .ok_or_else(|| eyre!("Chain {} has no RPC URL", params.chain_name))?;
        rpc.parse().context("Invalid RPC URL")
    }

    fn switch_to(&self, chain_id: ChainId) -> Result<()> {
        let changed = {
            let mut state = self.lock()?;
            if !state.chains.contains_key(&chain_id) {
                return Err(Report::new(ProviderRpcError::new(
                    crate::constants::UNRECOGNIZED_CHAIN_ERROR,
                    format!("Unrecognized chain ID \"{}\".", chain_id.to_hex()),
                )));
            }
            let changed = state.active != chain_id;
            state.active = chain_id;
            changed
        };

        if changed {
            tracing::info!("Local wallet switched to chain {}", chain_id);
            // No subscribers is fine
            let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    fn handle_add_chain(&self, params: &Value) -> Result<Value> {
        let params: AddChainParams = serde_json::from_value(first_param(params)?.clone())
            .context("Invalid wallet_addEthereumChain params")?;
        let chain_id: ChainId = params.chain_id.parse()?;
        if params.rpc_urls.is_empty() {
            return Err(Report::new(ProviderRpcError::new(
                -32602,
                "rpcUrls must contain at least one URL",
            )));
        }

        tracing::debug!("Local wallet registering chain {} ({})", params.chain_name, chain_id);
        self.lock()?.chains.insert(chain_id, params);
        self.switch_to(chain_id)?;
        Ok(Value::Null)
    }

    fn handle_switch_chain(&self, params: &Value) -> Result<Value> {
        let raw = first_param(params)?
            .get("chainId")
            .and_then(Value::as_str)
            .ok_or_else(|| eyre!("wallet_switchEthereumChain requires a chainId"))?;
        self.switch_to(raw.parse()?)?;
        Ok(Value::Null)
    }

    async fn handle_send_transaction(&self, params: &Value) -> Result<Value> {
        let tx: TxRequest = serde_json::from_value(first_param(params)?.clone())
            .context("Invalid eth_sendTransaction params")?;
        if tx.from != self.address() {
            return Err(Report::new(ProviderRpcError::new(
                4100,
                format!("Account {} is not managed by this wallet", tx.from),
            )));
        }

        let mut tx_request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.data);
        if let Some(value) = tx.value {
            tx_request = tx_request.with_value(value);
        }
        if let Some(gas) = tx.gas {
            tx_request = tx_request.with_gas_limit(gas.to::<u64>());
        }

        // Provider with wallet filler - handles nonce, gas, chain_id and signing
        let url = self.active_rpc_url()?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url);

        let pending = provider
            .send_transaction(tx_request)
            .await
            .context("Failed to send transaction")?;

        tracing::info!("Local wallet sent transaction {}", pending.tx_hash());
        Ok(json!(pending.tx_hash()))
    }

    async fn forward(&self, method: &str, params: Value) -> Result<Value> {
        let url = self.active_rpc_url()?;
        let provider: RootProvider<Ethereum> = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);

        provider
            .raw_request::<Value, Value>(Cow::Owned(method.to_string()), params)
            .await
            .with_context(|| format!("RPC request {} failed", method))
    }
}

fn first_param(params: &Value) -> Result<&Value> {
    params
        .get(0)
        .ok_or_else(|| eyre!("Missing request parameters"))
}

impl Eip1193Provider for LocalWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "eth_chainId" => Ok(json!(self.active_chain()?.to_hex())),
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address()])),
            "wallet_addEthereumChain" => self.handle_add_chain(&params),
            "wallet_switchEthereumChain" => self.handle_switch_chain(&params),
            "eth_sendTransaction" => self.handle_send_transaction(&params).await,
            _ => self.forward(method, params).await,
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        Some(self.events.subscribe())
    }
}
