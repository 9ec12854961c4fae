//! Scripted in-memory wallet for tests

use super::{Eip1193Provider, TxRequest, WalletEvent};
use crate::config::ChainId;
use crate::contracts::IERC20;
use crate::error::{eyre, ProviderRpcError, Report, Result};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolCall, SolValue};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

pub(crate) const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub(crate) const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub(crate) const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

pub(crate) fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Wallet whose behavior is set by its public fields
pub(crate) struct ScriptedWallet {
    pub accounts: Vec<Address>,
    pub chain: Mutex<ChainId>,
    pub known_chains: Mutex<Vec<ChainId>>,
    /// Adding a chain also selects it (MetaMask does)
    pub switch_on_add: bool,
    /// Accept the next `wallet_addEthereumChain` without registering the chain
    pub forget_next_add: AtomicBool,
    pub reject_accounts: bool,
    pub fail_calls: AtomicBool,
    pub fail_send: bool,
    /// `eth_requestAccounts` waits for a permit, like a pending approval popup
    pub accounts_gate: Option<Arc<Notify>>,
    /// `eth_sendTransaction` waits for a permit
    pub send_gate: Option<Arc<Notify>>,
    pub metamask: bool,
    pub balance: Mutex<U256>,
    pub calls: Mutex<Vec<String>>,
    pub events: broadcast::Sender<WalletEvent>,
}

impl ScriptedWallet {
    pub fn on_chain(chain: ChainId) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: vec![ALICE.parse().unwrap()],
            chain: Mutex::new(chain),
            known_chains: Mutex::new(vec![chain]),
            switch_on_add: true,
            forget_next_add: AtomicBool::new(false),
            reject_accounts: false,
            fail_calls: AtomicBool::new(false),
            fail_send: false,
            accounts_gate: None,
            send_gate: None,
            metamask: true,
            balance: Mutex::new(ether(100)),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn emit(&self, event: WalletEvent) {
        self.events.send(event).unwrap();
    }

    fn rpc_error(code: i64, message: &str) -> Report {
        Report::new(ProviderRpcError::new(code, message))
    }

    fn eth_call(&self, params: &Value) -> Result<Value> {
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(Self::rpc_error(-32000, "execution reverted"));
        }
        let data: Bytes = serde_json::from_value(params[0]["data"].clone())?;
        let selector: [u8; 4] = data[..4].try_into()?;

        let encoded = if selector == IERC20::nameCall::SELECTOR {
            "Dashboard Token".to_string().abi_encode()
        } else if selector == IERC20::symbolCall::SELECTOR {
            "DASH".to_string().abi_encode()
        } else if selector == IERC20::decimalsCall::SELECTOR {
            U256::from(18u64).abi_encode()
        } else if selector == IERC20::totalSupplyCall::SELECTOR {
            ether(1_000_000).abi_encode()
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            self.balance.lock().unwrap().abi_encode()
        } else {
            return Err(eyre!("unexpected selector {:?}", selector));
        };
        Ok(json!(Bytes::from(encoded)))
    }

    fn send(&self, params: &Value) -> Result<Value> {
        if self.fail_send {
            return Err(Self::rpc_error(4001, "User denied transaction signature."));
        }
        let tx: TxRequest = serde_json::from_value(params[0].clone())?;
        let call = IERC20::transferCall::abi_decode(&tx.data)?;

        let mut balance = self.balance.lock().unwrap();
        if call.amount > *balance {
            return Err(Self::rpc_error(-32603, "ERC20InsufficientBalance"));
        }
        *balance -= call.amount;
        Ok(json!(TxHash::repeat_byte(0x42)))
    }
}

impl Eip1193Provider for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(method.to_string());

        match method {
            "wallet_addEthereumChain" => {
                let id: ChainId = params[0]["chainId"].as_str().unwrap_or_default().parse()?;
                if self.forget_next_add.swap(false, Ordering::SeqCst) {
                    return Ok(Value::Null);
                }
                self.known_chains.lock().unwrap().push(id);
                if self.switch_on_add {
                    *self.chain.lock().unwrap() = id;
                }
                Ok(Value::Null)
            }
            "wallet_switchEthereumChain" => {
                let id: ChainId = params[0]["chainId"].as_str().unwrap_or_default().parse()?;
                if !self.known_chains.lock().unwrap().contains(&id) {
                    return Err(Self::rpc_error(4902, "Unrecognized chain ID"));
                }
                *self.chain.lock().unwrap() = id;
                Ok(Value::Null)
            }
            "eth_chainId" => Ok(json!(self.chain.lock().unwrap().to_hex())),
            "eth_requestAccounts" => {
                if let Some(gate) = &self.accounts_gate {
                    gate.notified().await;
                }
                if self.reject_accounts {
                    return Err(Self::rpc_error(4001, "User rejected the request."));
                }
                Ok(json!(self.accounts))
            }
            "eth_call" => self.eth_call(&params),
            "eth_sendTransaction" => {
                if let Some(gate) = &self.send_gate {
                    gate.notified().await;
                }
                self.send(&params)
            }
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": params[0],
                "blockNumber": "0x2",
                "status": "0x1",
            })),
            other => Err(eyre!("unexpected method {}", other)),
        }
    }

    fn is_metamask(&self) -> bool {
        self.metamask
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        Some(self.events.subscribe())
    }
}
