//! Deployment artifacts that record where the token contract lives
//!
//! Two layouts are understood:
//!
//! - Hardhat Ignition `deployed_addresses.json`:
//!   `{ "TokenModule#Token": "0x5FbDB2315678afecb367f032d93F642f64180aa3" }`
//! - A single-contract artifact:
//!   `{ "address": "0x...", "chainId": 31337, "contractName": "Token" }`

use crate::config::ChainId;
use crate::error::{bail, eyre, Context, Result};
use alloy::primitives::Address;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDeployment {
    Single(SingleArtifact),
    Ignition(BTreeMap<String, Address>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleArtifact {
    address: Address,
    #[serde(default)]
    chain_id: Option<serde_json::Value>,
    #[serde(default)]
    contract_name: Option<String>,
}

/// Contract addresses read from a deployment artifact
#[derive(Debug, Clone)]
pub struct Deployment {
    contracts: BTreeMap<String, Address>,
    chain_id: Option<ChainId>,
}

impl Deployment {
    /// Read and parse a deployment file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse deployment file {}", path.display()))
    }

    /// Parse deployment JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDeployment =
            serde_json::from_str(json).context("Unrecognized deployment artifact layout")?;

        match raw {
            RawDeployment::Single(artifact) => {
                let chain_id = artifact
                    .chain_id
                    .map(|value| match value {
                        serde_json::Value::Number(n) => n
                            .as_u64()
                            .map(ChainId)
                            .ok_or_else(|| eyre!("Invalid chainId in deployment: {}", n)),
                        serde_json::Value::String(s) => s.parse::<ChainId>(),
                        other => Err(eyre!("Invalid chainId in deployment: {}", other)),
                    })
                    .transpose()?;
                let name = artifact.contract_name.unwrap_or_else(|| "Token".to_string());
                Ok(Self {
                    contracts: BTreeMap::from([(name, artifact.address)]),
                    chain_id,
                })
            }
            RawDeployment::Ignition(contracts) => {
                if contracts.is_empty() {
                    bail!("Deployment artifact lists no contracts");
                }
                Ok(Self {
                    contracts,
                    chain_id: None,
                })
            }
        }
    }

    /// Chain the artifact was deployed to, when it records one
    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    /// Contract names in the artifact
    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Pick the token address
    ///
    /// `contract` matches either the full key (`TokenModule#Token`) or the
    /// contract part after `#`. Without a name the artifact must hold exactly
    /// one contract.
    pub fn token_address(&self, contract: Option<&str>) -> Result<Address> {
        match contract {
            Some(wanted) => {
                if let Some(address) = self.contracts.get(wanted) {
                    return Ok(*address);
                }
                let mut matches = self
                    .contracts
                    .iter()
                    .filter(|(key, _)| key.rsplit('#').next() == Some(wanted));
                match (matches.next(), matches.next()) {
                    (Some((_, address)), None) => Ok(*address),
                    (Some(_), Some(_)) => bail!(
                        "Contract name {} is ambiguous in deployment; use the full key ({})",
                        wanted,
                        self.available()
                    ),
                    (None, _) => bail!(
                        "Contract {} not found in deployment (available: {})",
                        wanted,
                        self.available()
                    ),
                }
            }
            None => {
                if self.contracts.len() == 1 {
                    if let Some(address) = self.contracts.values().next() {
                        return Ok(*address);
                    }
                }
                bail!(
                    "Deployment lists several contracts; choose one of: {}",
                    self.available()
                )
            }
        }
    }

    fn available(&self) -> String {
        self.contracts().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const FAUCET: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

    #[test]
    fn test_ignition_single_contract() {
        let json = format!(r#"{{"TokenModule#Token": "{TOKEN}"}}"#);
        let deployment = Deployment::from_json(&json).unwrap();

        assert_eq!(deployment.token_address(None).unwrap(), TOKEN.parse::<Address>().unwrap());
        assert_eq!(deployment.chain_id(), None);
    }

    #[test]
    fn test_ignition_selects_by_contract_name() {
        let json = format!(r#"{{"TokenModule#Token": "{TOKEN}", "TokenModule#Faucet": "{FAUCET}"}}"#);
        let deployment = Deployment::from_json(&json).unwrap();

        assert!(deployment.token_address(None).is_err());
        assert_eq!(
            deployment.token_address(Some("Faucet")).unwrap(),
            FAUCET.parse::<Address>().unwrap()
        );
        assert_eq!(
            deployment.token_address(Some("TokenModule#Token")).unwrap(),
            TOKEN.parse::<Address>().unwrap()
        );
        let err = deployment.token_address(Some("Vault")).unwrap_err();
        assert!(err.to_string().contains("TokenModule#Faucet"));
    }

    #[test]
    fn test_ambiguous_short_name() {
        let json = format!(r#"{{"A#Token": "{TOKEN}", "B#Token": "{FAUCET}"}}"#);
        let deployment = Deployment::from_json(&json).unwrap();
        assert!(deployment.token_address(Some("Token")).is_err());
        assert!(deployment.token_address(Some("B#Token")).is_ok());
    }

    #[test]
    fn test_single_artifact_with_chain() {
        let json = format!(r#"{{"address": "{TOKEN}", "chainId": "0x7a69"}}"#);
        let deployment = Deployment::from_json(&json).unwrap();
        assert_eq!(deployment.chain_id(), Some(ChainId(31337)));
        assert_eq!(deployment.token_address(None).unwrap(), TOKEN.parse::<Address>().unwrap());

        let json = format!(r#"{{"address": "{TOKEN}", "chainId": 11155111, "contractName": "MyToken"}}"#);
        let deployment = Deployment::from_json(&json).unwrap();
        assert_eq!(deployment.chain_id(), Some(ChainId(11_155_111)));
        assert!(deployment.token_address(Some("MyToken")).is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Deployment::from_json("{}").is_err());
        assert!(Deployment::from_json(r#"{"Token": "not-an-address"}"#).is_err());
        assert!(Deployment::from_json("[]").is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!(
            "token-dashboard-deployment-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, format!(r#"{{"TokenModule#Token": "{TOKEN}"}}"#)).unwrap();

        let deployment = Deployment::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(deployment.token_address(Some("Token")).is_ok());

        assert!(Deployment::from_file("/nonexistent/deployed_addresses.json").is_err());
    }
}
