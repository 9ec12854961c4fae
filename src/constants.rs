//! Constants shared across the dashboard

use std::time::Duration;

/// Hardhat local node chain ID (0x7a69)
pub const HARDHAT_CHAIN_ID: u64 = 31337;

/// Sepolia testnet chain ID (0xaa36a7)
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Hardhat node default RPC endpoint
pub const HARDHAT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Decimals assumed when a token does not answer `decimals()`
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// EIP-1193 error: user rejected the request
pub const USER_REJECTED_ERROR: i64 = 4001;

/// EIP-3085/3326 error: the wallet does not know the requested chain
pub const UNRECOGNIZED_CHAIN_ERROR: i64 = 4902;

/// Receipt polling interval
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Receipt polling attempts (60 attempts * 2 seconds = 2 minutes timeout)
pub const RECEIPT_MAX_ATTEMPTS: u32 = 60;

/// Timeout for HTTP requests made by the JSON-RPC bridge
pub const BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

// Environment variables read by `ChainConfig::from_env`
pub const ENV_NETWORK: &str = "TOKEN_DASHBOARD_NETWORK";
pub const ENV_CHAIN_ID: &str = "TOKEN_DASHBOARD_CHAIN_ID";
pub const ENV_PROVIDER_URL: &str = "TOKEN_DASHBOARD_PROVIDER_URL";
pub const ENV_TOKEN_ADDRESS: &str = "TOKEN_DASHBOARD_TOKEN_ADDRESS";
pub const ENV_DEPLOYMENT_FILE: &str = "TOKEN_DASHBOARD_DEPLOYMENT_FILE";
pub const ENV_TOKEN_CONTRACT: &str = "TOKEN_DASHBOARD_TOKEN_CONTRACT";
