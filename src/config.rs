//! Network configuration for the token dashboard

use crate::constants::{
    ENV_CHAIN_ID, ENV_DEPLOYMENT_FILE, ENV_NETWORK, ENV_PROVIDER_URL, ENV_TOKEN_ADDRESS,
    ENV_TOKEN_CONTRACT, HARDHAT_CHAIN_ID, HARDHAT_RPC_URL, SEPOLIA_CHAIN_ID,
};
use crate::deployment::Deployment;
use crate::error::{bail, ensure, eyre, Context, Report, Result};
use crate::wallet::AddChainParams;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Presets known to [`ChainConfig::preset`]
pub const KNOWN_NETWORKS: &[&str] = &["hardhat", "sepolia"];

/// EIP-155 chain ID
///
/// Parses from `0x`-prefixed hex or decimal; wallets receive it as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Lowercase `0x` hex form used by wallet RPC methods
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => (hex, 16),
            None => (s, 10),
        };
        // from_str_radix also accepts a leading '+'
        ensure!(
            !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix)),
            "Invalid chain ID {:?}",
            s
        );
        u64::from_str_radix(digits, radix)
            .map(ChainId)
            .map_err(|e| eyre!("Invalid chain ID {:?}: {}", s, e))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Normalize a configured chain ID into the hex form wallets expect
///
/// A missing value falls back to the Hardhat chain (`0x7a69`).
pub fn hex_chain_id(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ChainId(HARDHAT_CHAIN_ID).to_hex()),
        Some(raw) => Ok(raw.parse::<ChainId>()?.to_hex()),
    }
}

/// Native currency of a chain, as shown by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Ether with 18 decimals
    pub fn ether(symbol: impl Into<String>) -> Self {
        Self::new("Ether", symbol, 18)
    }
}

/// Chain and token the dashboard displays
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    /// Chain ID
    pub id: ChainId,
    /// Human readable chain name
    pub name: String,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Native currency
    pub native_currency: NativeCurrency,
    /// ERC-20 token address
    pub token_address: Option<Address>,
    /// Block explorers passed to `wallet_addEthereumChain`
    pub block_explorer_urls: Vec<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::hardhat()
    }
}

impl ChainConfig {
    /// Local Hardhat node (default)
    pub fn hardhat() -> Self {
        Self {
            id: ChainId(HARDHAT_CHAIN_ID),
            name: "Hardhat".to_string(),
            rpc_url: HARDHAT_RPC_URL.to_string(),
            native_currency: NativeCurrency::ether("ETH"),
            token_address: None,
            block_explorer_urls: Vec::new(),
        }
    }

    /// Sepolia testnet; there is no public default RPC so one must be given
    pub fn sepolia(rpc_url: impl Into<String>) -> Self {
        Self {
            id: ChainId(SEPOLIA_CHAIN_ID),
            name: "Sepolia".to_string(),
            rpc_url: rpc_url.into(),
            native_currency: NativeCurrency::ether("SepoliaETH"),
            token_address: None,
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
        }
    }

    /// Look up a preset by name (case-insensitive)
    ///
    /// Presets without a default RPC URL are returned with an empty one and
    /// must be completed with [`ChainConfig::with_rpc_url`].
    pub fn preset(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hardhat" | "localhost" => Ok(Self::hardhat()),
            "sepolia" => Ok(Self::sepolia("")),
            other => bail!(
                "Unknown network {:?} (known networks: {})",
                other,
                KNOWN_NETWORKS.join(", ")
            ),
        }
    }

    /// Resolve configuration from the process environment (after loading `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    ///
    /// The token address comes from the address variable when set, otherwise
    /// from the deployment file when one is named.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = match get(ENV_NETWORK) {
            Some(network) => network,
            None => {
                tracing::warn!("{} not set, defaulting to hardhat", ENV_NETWORK);
                "hardhat".to_string()
            }
        };
        let mut config = Self::preset(&network)?;

        if let Some(raw) = get(ENV_CHAIN_ID) {
            config.id = raw
                .parse()
                .with_context(|| format!("Invalid {}", ENV_CHAIN_ID))?;
        }

        if let Some(url) = get(ENV_PROVIDER_URL) {
            config.rpc_url = url;
        }

        if let Some(raw) = get(ENV_TOKEN_ADDRESS) {
            let address: Address = raw
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_TOKEN_ADDRESS, raw))?;
            config.token_address = Some(address);
        } else if let Some(path) = get(ENV_DEPLOYMENT_FILE) {
            let deployment = Deployment::from_file(&path)?;
            if let Some(deployed_on) = deployment.chain_id() {
                if deployed_on != config.id {
                    tracing::warn!(
                        "Deployment {} targets chain {} but {} is configured",
                        path,
                        deployed_on,
                        config.id
                    );
                }
            }
            let contract = get(ENV_TOKEN_CONTRACT);
            config.token_address = Some(deployment.token_address(contract.as_deref())?);
        }

        config.validate()?;

        tracing::info!(
            "Selected chain: {} ({}), token: {}",
            config.name,
            config.id,
            config
                .token_address
                .map(|a| a.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );

        Ok(config)
    }

    /// Check that the configuration can be used
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.rpc_url.is_empty(),
            "No RPC URL configured for {} (set {})",
            self.name,
            ENV_PROVIDER_URL
        );
        Ok(())
    }

    /// Set the RPC URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Set the token address
    pub fn with_token_address(mut self, token: Address) -> Self {
        self.token_address = Some(token);
        self
    }

    /// Set the chain ID
    pub fn with_chain_id(mut self, id: impl Into<ChainId>) -> Self {
        self.id = id.into();
        self
    }

    /// Token address, or an error when none is configured
    pub fn require_token(&self) -> Result<Address> {
        self.token_address
            .ok_or_else(|| eyre!("Token address not configured (set {})", ENV_TOKEN_ADDRESS))
    }

    /// Chain ID in wallet hex form
    pub fn hex_id(&self) -> String {
        self.id.to_hex()
    }

    /// `wallet_addEthereumChain` parameters for this chain
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.hex_id(),
            chain_name: self.name.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            native_currency: self.native_currency.clone(),
            block_explorer_urls: if self.block_explorer_urls.is_empty() {
                None
            } else {
                Some(self.block_explorer_urls.clone())
            },
        }
    }
}
