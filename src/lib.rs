//! Token Dashboard
//!
//! Connect an EIP-1193 wallet (MetaMask or compatible), read an ERC-20 token's
//! metadata and the connected account's balance, and send transfers.
//!
//! # Features
//!
//! - Resolve chain and token from environment variables or a deployment file
//! - Add/switch the wallet to the configured chain
//! - Token name, symbol, total supply and balance
//! - Transfers with receipt confirmation
//!
//! # Example
//!
//! ```rust,ignore
//! use token_dashboard::{render, ChainConfig, Dashboard, LocalWallet};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = ChainConfig::from_env()?;
//!     let wallet = LocalWallet::from_private_key("0x...", &config)?;
//!     let mut dashboard = Dashboard::new(config, Some(wallet));
//!
//!     dashboard.connect().await?;
//!     println!("{}", render(&dashboard));
//!
//!     // Send 1.5 tokens
//!     let tx_hash = dashboard
//!         .transfer("0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "1.5")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod contracts;
pub mod dashboard;
pub mod deployment;
pub mod error;
pub mod token;
pub mod units;
pub mod view;
pub mod wallet;

// Re-export main types for convenience
pub use config::{ChainConfig, ChainId, NativeCurrency};
pub use dashboard::{parse_recipient, ConnectionStatus, Dashboard, TokenDisplay};
pub use deployment::Deployment;
pub use error::{eyre, Context, ProviderRpcError, Report, Result};
pub use token::{ReceiptPolling, TokenClient, TokenSnapshot};
pub use units::{format_ether, format_units, parse_ether, parse_units};
pub use view::{progress_line, render};
pub use wallet::{
    select_provider, AddChainParams, Eip1193Provider, InjectedProviders, JsonRpcBridge,
    LocalWallet, TxRequest, WalletEvent, WalletRequests,
};
