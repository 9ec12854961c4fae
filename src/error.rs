//! Error types for the token dashboard
//!
//! Uses `eyre` for ergonomic error handling with context. Wallet errors keep
//! their EIP-1193 code in a [`ProviderRpcError`] so callers can recover it
//! from a report with [`ProviderRpcError::from_report`].

pub use eyre::{bail, ensure, eyre, Context, Report, Result};

use serde::Deserialize;
use serde_json::Value;

use crate::constants::{UNRECOGNIZED_CHAIN_ERROR, USER_REJECTED_ERROR};

/// Error object returned by an EIP-1193 provider (or a JSON-RPC endpoint)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Find a [`ProviderRpcError`] anywhere in the report's chain
    pub fn from_report(report: &Report) -> Option<&Self> {
        report.chain().find_map(|e| e.downcast_ref::<Self>())
    }

    /// The wallet does not know the requested chain (4902)
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN_ERROR
    }

    /// The user rejected the request in the wallet (4001)
    pub fn is_user_rejected(&self) -> bool {
        self.code == USER_REJECTED_ERROR
    }
}

impl std::fmt::Display for ProviderRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "provider error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderRpcError {}
