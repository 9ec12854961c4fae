//! Dashboard - wallet connection and token interaction flow
//!
//! Holds everything the token page shows: connection state, token metadata
//! and balance, and the last error / transfer messages. All wallet access
//! goes through an [`Eip1193Provider`].

use crate::config::ChainConfig;
use crate::constants::DEFAULT_TOKEN_DECIMALS;
use crate::error::{bail, eyre, ProviderRpcError, Result};
use crate::token::{ReceiptPolling, TokenClient, TokenSnapshot};
use crate::units::{format_units, parse_units};
use crate::wallet::{Eip1193Provider, WalletEvent, WalletRequests};
use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::{broadcast, watch};

pub const NO_WALLET_MESSAGE: &str =
    "Please install or enable MetaMask. Other wallets like Phantom may not be fully compatible.";
pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch token data. Check token address and network.";
pub const INVALID_INPUT_MESSAGE: &str = "Please enter a valid recipient address and amount.";
pub const INVALID_RECIPIENT_MESSAGE: &str = "Invalid recipient address.";
pub const INVALID_AMOUNT_MESSAGE: &str = "Invalid amount.";
pub const TRANSFER_FAILED_MESSAGE: &str =
    "Transfer failed. Check logs for details (e.g., insufficient balance or network error).";

/// Wallet connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Connected(account) => Some(*account),
            _ => None,
        }
    }
}

/// Token fields as displayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDisplay {
    pub name: String,
    pub symbol: String,
    pub total_supply: String,
    pub balance: String,
}

impl From<&TokenSnapshot> for TokenDisplay {
    fn from(snapshot: &TokenSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            symbol: snapshot.symbol.clone(),
            total_supply: snapshot.formatted_total_supply(),
            balance: snapshot.formatted_balance(),
        }
    }
}

/// Parse a recipient address
///
/// Accepts all-lowercase or all-uppercase hex; mixed case must be a valid
/// EIP-55 checksum.
pub fn parse_recipient(input: &str) -> Result<Address> {
    let input = input.trim();
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| eyre!("Address must start with 0x: {}", input))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Address must be 40 hex characters: {}", input);
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{hex}"), None)
            .map_err(|e| eyre!("Bad address checksum for {}: {}", input, e));
    }

    Ok(format!("0x{hex}").parse()?)
}

/// Token dashboard bound to one chain and an optional wallet
pub struct Dashboard<P: Eip1193Provider> {
    chain: ChainConfig,
    provider: Option<P>,
    status: ConnectionStatus,
    token: TokenDisplay,
    decimals: u8,
    error_message: Option<String>,
    transfer_message: Option<String>,
    connection: watch::Sender<ConnectionStatus>,
    transferring: watch::Sender<bool>,
    events: Option<broadcast::Receiver<WalletEvent>>,
    polling: ReceiptPolling,
}

impl<P: Eip1193Provider> Dashboard<P> {
    /// `provider` is `None` when no usable wallet was found
    pub fn new(chain: ChainConfig, provider: Option<P>) -> Self {
        let (connection, _) = watch::channel(ConnectionStatus::Disconnected);
        let (transferring, _) = watch::channel(false);
        Self {
            chain,
            provider,
            status: ConnectionStatus::Disconnected,
            token: TokenDisplay::default(),
            decimals: DEFAULT_TOKEN_DECIMALS,
            error_message: None,
            transfer_message: None,
            connection,
            transferring,
            events: None,
            polling: ReceiptPolling::default(),
        }
    }

    /// Override the receipt polling schedule used by transfers
    pub fn with_receipt_polling(mut self, polling: ReceiptPolling) -> Self {
        self.polling = polling;
        self
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn account(&self) -> Option<Address> {
        self.status.account()
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    pub fn token(&self) -> &TokenDisplay {
        &self.token
    }

    /// Token decimals, 18 until token data has loaded
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn transfer_message(&self) -> Option<&str> {
        self.transfer_message.as_deref()
    }

    pub fn is_transferring(&self) -> bool {
        *self.transferring.borrow()
    }

    /// Watch connection status changes, including `Connecting` while
    /// [`Dashboard::connect`] is waiting on the wallet
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.subscribe()
    }

    /// Watch whether a transfer is being sent or confirmed
    pub fn subscribe_transferring(&self) -> watch::Receiver<bool> {
        self.transferring.subscribe()
    }

    /// Page heading
    pub fn title(&self) -> &'static str {
        if self.is_connected() {
            "📊 My Dashboard"
        } else {
            "💼 Token Wallet"
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
        self.connection.send_replace(status);
    }

    fn clear_token(&mut self) {
        self.token = TokenDisplay::default();
        self.decimals = DEFAULT_TOKEN_DECIMALS;
    }

    fn disconnect(&mut self) {
        self.set_status(ConnectionStatus::Disconnected);
        self.clear_token();
    }

    fn wrong_network_message(&self) -> String {
        format!(
            "Please switch to the {} network (chain ID {}).",
            self.chain.name, self.chain.id
        )
    }

    // ========== Connection ==========

    /// Connect the wallet: make sure it is on the configured chain, then
    /// request accounts and load token data
    pub async fn connect(&mut self) -> Result<Address> {
        self.error_message = None;

        if self.provider.is_none() {
            self.error_message = Some(NO_WALLET_MESSAGE.to_string());
            bail!("No EIP-1193 wallet available");
        }

        self.set_status(ConnectionStatus::Connecting);
        tracing::info!("Connecting wallet to {} ({})", self.chain.name, self.chain.id);

        let (result, events) = match self.provider.as_ref() {
            Some(provider) => {
                let result = establish(provider, &self.chain).await;
                (result, provider.subscribe())
            }
            None => (Err(eyre!("No EIP-1193 wallet available")), None),
        };

        match result {
            Ok(account) => {
                // Drop events queued before this connection
                self.events = events;
                self.set_status(ConnectionStatus::Connected(account));
                tracing::info!("Wallet connected: {}", account);

                // A failed fetch is reported through `error_message` only
                let _ = self.refresh_token_data().await;
                Ok(account)
            }
            Err(e) => {
                tracing::error!("Wallet connection failed: {:#}", e);
                self.disconnect();
                self.error_message = Some(format!(
                    "Failed to connect wallet. Ensure MetaMask is set to {} network (chain ID {}).",
                    self.chain.name, self.chain.id
                ));
                Err(e)
            }
        }
    }

    /// Apply one wallet event
    pub async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => {
                    tracing::info!("Wallet locked or no accounts exposed");
                    self.disconnect();
                }
                Some(account) if self.status == ConnectionStatus::Connected(account) => {}
                Some(account) => {
                    tracing::info!("Account changed to {}", account);
                    self.clear_token();
                    self.set_status(ConnectionStatus::Connected(account));
                    let _ = self.refresh_token_data().await;
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                if chain_id != self.chain.id {
                    tracing::warn!(
                        "Wallet switched to chain {}, expected {}",
                        chain_id,
                        self.chain.id
                    );
                    self.error_message = Some(self.wrong_network_message());
                    self.disconnect();
                }
            }
        }
    }

    /// Apply every event the wallet has emitted since the last call
    ///
    /// Returns the number of events handled.
    pub async fn drain_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(events) = self.events.as_mut() {
            loop {
                match events.try_recv() {
                    Ok(event) => pending.push(event),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        tracing::warn!("Dropped {} wallet events", skipped);
                    }
                    Err(_) => break,
                }
            }
        }

        let handled = pending.len();
        for event in pending {
            self.handle_event(event).await;
        }
        handled
    }

    // ========== Token data ==========

    /// Reload token metadata and balance for the connected account
    pub async fn refresh_token_data(&mut self) -> Result<()> {
        let (Some(provider), Some(account)) = (self.provider.as_ref(), self.status.account())
        else {
            return Ok(());
        };

        match load_snapshot(provider, &self.chain, account).await {
            Ok(snapshot) => {
                tracing::debug!(
                    "Token {} ({}) balance of {}: {}",
                    snapshot.name,
                    snapshot.symbol,
                    account,
                    snapshot.balance
                );
                self.decimals = snapshot.decimals;
                self.token = TokenDisplay::from(&snapshot);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching token data: {:#}", e);
                self.clear_token();
                self.error_message = Some(FETCH_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    async fn refresh_balance(&mut self) -> Result<()> {
        let (Some(provider), Some(account)) = (self.provider.as_ref(), self.status.account())
        else {
            return Ok(());
        };
        let token = self.chain.require_token()?;

        let balance = TokenClient::new(provider, token).balance_of(account).await?;
        self.token.balance = format_units(balance, self.decimals);
        Ok(())
    }

    // ========== Transfers ==========

    /// Send `amount` tokens (decimal string) to `recipient`
    pub async fn transfer(&mut self, recipient: &str, amount: &str) -> Result<TxHash> {
        self.transfer_message = None;
        self.error_message = None;

        let recipient = recipient.trim();
        let amount = amount.trim();
        let account = match self.status.account() {
            Some(account)
                if self.provider.is_some() && !recipient.is_empty() && !amount.is_empty() =>
            {
                account
            }
            _ => {
                self.error_message = Some(INVALID_INPUT_MESSAGE.to_string());
                bail!("Transfer requires a connected wallet, a recipient and an amount");
            }
        };

        let to = match parse_recipient(recipient) {
            Ok(to) => to,
            Err(e) => {
                self.error_message = Some(INVALID_RECIPIENT_MESSAGE.to_string());
                return Err(e);
            }
        };

        let value = match parse_units(amount, self.decimals) {
            Ok(value) => value,
            Err(e) => {
                self.error_message = Some(INVALID_AMOUNT_MESSAGE.to_string());
                return Err(e);
            }
        };

        self.transferring.send_replace(true);
        let result = match self.provider.as_ref() {
            Some(provider) => {
                send_and_confirm(provider, &self.chain, account, to, value, self.polling).await
            }
            None => Err(eyre!("No EIP-1193 wallet available")),
        };
        self.transferring.send_replace(false);

        match result {
            Ok(tx_hash) => {
                self.transfer_message = Some(format!("Transfer successful! Tx Hash: {tx_hash}"));
                if let Err(e) = self.refresh_balance().await {
                    tracing::warn!("Failed to refresh balance after transfer: {:#}", e);
                }
                Ok(tx_hash)
            }
            Err(e) => {
                if let Some(rpc) = ProviderRpcError::from_report(&e) {
                    if rpc.is_user_rejected() {
                        tracing::info!("Transfer rejected in wallet");
                    }
                }
                tracing::error!("Transfer failed: {:#}", e);
                self.error_message = Some(TRANSFER_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}

/// Put the wallet on `chain` and return the selected account
async fn establish<P: Eip1193Provider>(provider: &P, chain: &ChainConfig) -> Result<Address> {
    let params = chain.add_chain_params();
    let added = provider.add_chain(&params).await?;
    tracing::debug!("wallet_addEthereumChain returned {}", added);

    let current = provider.chain_id().await?;
    if current != chain.id {
        tracing::info!("Wallet on chain {}, switching to {}", current, chain.id);
        match provider.switch_chain(chain.id).await {
            Ok(()) => {}
            Err(e)
                if ProviderRpcError::from_report(&e)
                    .is_some_and(ProviderRpcError::is_unrecognized_chain) =>
            {
                tracing::info!("Wallet does not know chain {}, adding it again", chain.id);
                provider.add_chain(&params).await?;
                provider.switch_chain(chain.id).await?;
            }
            Err(e) => return Err(e.wrap_err("Failed to switch chain")),
        }
    }

    let accounts = provider.request_accounts().await?;
    accounts
        .first()
        .copied()
        .ok_or_else(|| eyre!("Wallet returned no accounts"))
}

async fn load_snapshot<P: Eip1193Provider>(
    provider: &P,
    chain: &ChainConfig,
    account: Address,
) -> Result<TokenSnapshot> {
    let token = chain.require_token()?;
    TokenClient::new(provider, token).snapshot(account).await
}

async fn send_and_confirm<P: Eip1193Provider>(
    provider: &P,
    chain: &ChainConfig,
    from: Address,
    to: Address,
    value: U256,
    polling: ReceiptPolling,
) -> Result<TxHash> {
    let client = TokenClient::new(provider, chain.require_token()?);
    let tx_hash = client.transfer(from, to, value).await?;
    client.wait_for_receipt(tx_hash, polling).await?;
    Ok(tx_hash)
}
