//! TokenClient - ERC-20 reads and transfers routed through a wallet

use crate::constants::{DEFAULT_TOKEN_DECIMALS, RECEIPT_MAX_ATTEMPTS, RECEIPT_POLL_INTERVAL};
use crate::contracts::{balance_of_calldata, transfer_calldata, IERC20};
use crate::error::{bail, Context, Result};
use crate::units::format_units;
use crate::wallet::{Eip1193Provider, ReceiptSummary, TxRequest, WalletRequests};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use std::time::Duration;

/// Receipt polling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: RECEIPT_POLL_INTERVAL,
            max_attempts: RECEIPT_MAX_ATTEMPTS,
        }
    }
}

/// Token metadata plus one account's balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub balance: U256,
}

impl TokenSnapshot {
    /// Total supply as a decimal string
    pub fn formatted_total_supply(&self) -> String {
        format_units(self.total_supply, self.decimals)
    }

    /// Balance as a decimal string
    pub fn formatted_balance(&self) -> String {
        format_units(self.balance, self.decimals)
    }
}

/// ERC-20 client bound to one token
pub struct TokenClient<'a, P: Eip1193Provider> {
    provider: &'a P,
    token: Address,
}

impl<'a, P: Eip1193Provider> TokenClient<'a, P> {
    pub fn new(provider: &'a P, token: Address) -> Self {
        Self { provider, token }
    }

    /// Token contract address
    pub fn address(&self) -> Address {
        self.token
    }

    async fn call<C: SolCall>(&self, call: C, what: &str) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let result = self
            .provider
            .call(self.token, data)
            .await
            .with_context(|| format!("Failed to call {}", what))?;

        C::abi_decode_returns(&result).with_context(|| format!("Failed to decode {}", what))
    }

    pub async fn name(&self) -> Result<String> {
        self.call(IERC20::nameCall {}, "name").await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.call(IERC20::symbolCall {}, "symbol").await
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.call(IERC20::decimalsCall {}, "decimals").await
    }

    /// `decimals()`, or 18 when the token does not implement it
    pub async fn decimals_or_default(&self) -> u8 {
        match self.decimals().await {
            Ok(decimals) => decimals,
            Err(e) => {
                tracing::warn!(
                    "decimals() failed for {}, assuming {}: {:#}",
                    self.token,
                    DEFAULT_TOKEN_DECIMALS,
                    e
                );
                DEFAULT_TOKEN_DECIMALS
            }
        }
    }

    pub async fn total_supply(&self) -> Result<U256> {
        self.call(IERC20::totalSupplyCall {}, "totalSupply").await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let result = self
            .provider
            .call(self.token, balance_of_calldata(account))
            .await
            .context("Failed to call balanceOf")?;

        IERC20::balanceOfCall::abi_decode_returns(&result).context("Failed to decode balance")
    }

    /// Read name, symbol, decimals, total supply and `account`'s balance
    pub async fn snapshot(&self, account: Address) -> Result<TokenSnapshot> {
        let (name, symbol, decimals, total_supply, balance) = tokio::join!(
            self.name(),
            self.symbol(),
            self.decimals_or_default(),
            self.total_supply(),
            self.balance_of(account)
        );

        Ok(TokenSnapshot {
            name: name?,
            symbol: symbol?,
            decimals,
            total_supply: total_supply?,
            balance: balance?,
        })
    }

    /// Submit `transfer(to, amount)` from `from`, returning the transaction hash
    pub async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxHash> {
        let tx = TxRequest::new(from, self.token, transfer_calldata(to, amount));
        let tx_hash = self
            .provider
            .send_transaction(&tx)
            .await
            .context("Failed to send transfer")?;

        tracing::info!("Transfer of {} to {} submitted: {}", amount, to, tx_hash);
        Ok(tx_hash)
    }

    /// Poll until the transaction is mined; reverted transactions are errors
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        polling: ReceiptPolling,
    ) -> Result<ReceiptSummary> {
        for attempt in 0..polling.max_attempts {
            let receipt = self
                .provider
                .transaction_receipt(tx_hash)
                .await
                .context("Failed to get transaction receipt")?;

            if let Some(receipt) = receipt {
                if !receipt.succeeded() {
                    bail!("Transaction {} reverted", tx_hash);
                }
                return Ok(receipt);
            }

            tracing::debug!(
                "Receipt for {} not available (attempt {}/{})",
                tx_hash,
                attempt + 1,
                polling.max_attempts
            );
            tokio::time::sleep(polling.interval).await;
        }

        bail!("Transaction receipt not found after timeout: {}", tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::eyre;
    use alloy::sol_types::SolValue;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const HOLDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    /// Answers ERC-20 calls by selector
    struct FakeToken {
        decimals: Option<u8>,
        pending_polls: AtomicU32,
        receipt_status: &'static str,
    }

    impl FakeToken {
        fn new() -> Self {
            Self {
                decimals: Some(18),
                pending_polls: AtomicU32::new(0),
                receipt_status: "0x1",
            }
        }
    }

    fn hex(data: Vec<u8>) -> Value {
        json!(Bytes::from(data))
    }

    impl Eip1193Provider for FakeToken {
        async fn request(&self, method: &str, params: Value) -> Result<Value> {
            match method {
                "eth_call" => {
                    let data: Bytes = serde_json::from_value(params[0]["data"].clone())?;
                    let selector: [u8; 4] = data[..4].try_into()?;
                    if selector == IERC20::nameCall::SELECTOR {
                        Ok(hex("Test Token".to_string().abi_encode()))
                    } else if selector == IERC20::symbolCall::SELECTOR {
                        Ok(hex("TT".to_string().abi_encode()))
                    } else if selector == IERC20::decimalsCall::SELECTOR {
                        match self.decimals {
                            Some(d) => Ok(hex(U256::from(d).abi_encode())),
                            None => Err(eyre!("execution reverted")),
                        }
                    } else if selector == IERC20::totalSupplyCall::SELECTOR {
                        Ok(hex(U256::from(1_000_000u64).abi_encode()))
                    } else if selector == IERC20::balanceOfCall::SELECTOR {
                        Ok(hex(U256::from(250u64).abi_encode()))
                    } else {
                        Err(eyre!("unexpected selector"))
                    }
                }
                "eth_sendTransaction" => {
                    assert_eq!(params[0]["to"].as_str().unwrap().to_lowercase(), TOKEN.to_lowercase());
                    Ok(json!(TxHash::repeat_byte(0xab)))
                }
                "eth_getTransactionReceipt" => {
                    if self.pending_polls.load(Ordering::SeqCst) > 0 {
                        self.pending_polls.fetch_sub(1, Ordering::SeqCst);
                        return Ok(Value::Null);
                    }
                    Ok(json!({
                        "transactionHash": params[0],
                        "blockNumber": "0x1",
                        "status": self.receipt_status,
                    }))
                }
                other => Err(eyre!("unexpected method {}", other)),
            }
        }
    }

    fn fast() -> ReceiptPolling {
        ReceiptPolling {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn test_snapshot() {
        let provider = FakeToken::new();
        let client = TokenClient::new(&provider, TOKEN.parse().unwrap());

        let snapshot = client.snapshot(HOLDER.parse().unwrap()).await.unwrap();
        assert_eq!(snapshot.name, "Test Token");
        assert_eq!(snapshot.symbol, "TT");
        assert_eq!(snapshot.decimals, 18);
        assert_eq!(snapshot.total_supply, U256::from(1_000_000u64));
        assert_eq!(snapshot.formatted_balance(), "0.00000000000000025");
    }

    #[tokio::test]
    async fn test_decimals_fallback() {
        let provider = FakeToken {
            decimals: None,
            ..FakeToken::new()
        };
        let client = TokenClient::new(&provider, TOKEN.parse().unwrap());
        assert!(client.decimals().await.is_err());
        assert_eq!(client.decimals_or_default().await, 18);
    }

    #[tokio::test]
    async fn test_transfer_and_wait() {
        let provider = FakeToken {
            pending_polls: AtomicU32::new(2),
            ..FakeToken::new()
        };
        let client = TokenClient::new(&provider, TOKEN.parse().unwrap());

        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let hash = client
            .transfer(HOLDER.parse().unwrap(), to, U256::from(5u64))
            .await
            .unwrap();
        assert_eq!(hash, TxHash::repeat_byte(0xab));

        let receipt = client.wait_for_receipt(hash, fast()).await.unwrap();
        assert_eq!(receipt.transaction_hash, hash);
    }

    #[tokio::test]
    async fn test_wait_for_receipt_errors() {
        let reverted = FakeToken {
            receipt_status: "0x0",
            ..FakeToken::new()
        };
        let client = TokenClient::new(&reverted, TOKEN.parse().unwrap());
        let err = client
            .wait_for_receipt(TxHash::repeat_byte(1), fast())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reverted"));

        let never_mined = FakeToken {
            pending_polls: AtomicU32::new(10),
            ..FakeToken::new()
        };
        let client = TokenClient::new(&never_mined, TOKEN.parse().unwrap());
        let err = client
            .wait_for_receipt(TxHash::repeat_byte(1), fast())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
