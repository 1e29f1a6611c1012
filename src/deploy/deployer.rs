// Contract deployment
//
// Deploys from Hardhat-style artifact files ({abi, bytecode}) and records
// the mined address. `ensure_deployed` is the deploy-if-missing primitive
// every deploy program goes through.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ethers::abi::{Abi, Token};
use ethers::providers::Middleware;
use ethers::signers::Signer;
use ethers::types::{Address, TransactionRequest, U256};
use ethers::utils::to_checksum;
use serde::Deserialize;

use crate::wallet::SigningClient;

use super::Manifest;

/// Compiled contract: ABI plus creation bytecode
pub struct Artifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Vec<u8>,
}

#[derive(Deserialize)]
struct RawArtifact {
    #[serde(rename = "contractName", default)]
    contract_name: Option<String>,
    abi: serde_json::Value,
    bytecode: String,
}

impl Artifact {
    /// Load `<dir>/<name>.json`
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path: PathBuf = dir.join(format!("{name}.json"));
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let raw: RawArtifact = serde_json::from_str(&data)
            .with_context(|| format!("artifact {} is not valid JSON", path.display()))?;

        let abi: Abi = serde_json::from_value(raw.abi)
            .with_context(|| format!("artifact {} has an invalid abi", path.display()))?;
        let bytecode = hex::decode(raw.bytecode.trim_start_matches("0x"))
            .with_context(|| format!("artifact {} has invalid bytecode", path.display()))?;
        if bytecode.is_empty() {
            bail!("artifact {} has empty bytecode", path.display());
        }

        Ok(Self {
            contract_name: raw.contract_name.unwrap_or_else(|| name.to_string()),
            abi,
            bytecode,
        })
    }
}

/// A freshly mined deployment
#[derive(Debug, Clone)]
pub struct Deployed {
    pub address: Address,
    pub deployer: Address,
    pub block_number: Option<u64>,
}

impl Deployed {
    /// Checksummed address string, the form stored in the manifest
    pub fn address_string(&self) -> String {
        to_checksum(&self.address, None)
    }

    pub fn deployer_string(&self) -> String {
        to_checksum(&self.deployer, None)
    }
}

/// Deploys contracts through a signing client
pub struct Deployer {
    client: Arc<SigningClient>,
    gas_price: Option<U256>,
}

impl Deployer {
    pub fn new(client: Arc<SigningClient>, gas_price: Option<U256>) -> Self {
        Self { client, gas_price }
    }

    pub fn account(&self) -> Address {
        self.client.signer().address()
    }

    /// Broadcast the creation transaction and wait for its receipt
    pub async fn deploy(&self, artifact: &Artifact, args: Vec<Token>) -> Result<Deployed> {
        let data = match artifact.abi.constructor() {
            Some(constructor) => constructor
                .encode_input(artifact.bytecode.clone(), &args)
                .with_context(|| {
                    format!("failed to encode {} constructor", artifact.contract_name)
                })?,
            None => {
                if !args.is_empty() {
                    bail!(
                        "{} has no constructor but arguments were supplied",
                        artifact.contract_name
                    );
                }
                artifact.bytecode.clone()
            }
        };

        let mut tx = TransactionRequest::new().data(data);
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .with_context(|| format!("failed to broadcast {}", artifact.contract_name))?;
        let receipt = pending
            .confirmations(1)
            .await
            .with_context(|| format!("failed to confirm {}", artifact.contract_name))?
            .with_context(|| {
                format!("{} deployment dropped without a receipt", artifact.contract_name)
            })?;

        let address = receipt.contract_address.with_context(|| {
            format!("{} receipt carries no contract address", artifact.contract_name)
        })?;
        Ok(Deployed {
            address,
            deployer: self.account(),
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}

/// Deploy-if-missing: return the recorded address untouched, or run the
/// deploy closure and record the result. Re-running against a fully
/// recorded network performs zero deploy transactions.
pub async fn ensure_deployed<F, Fut>(
    manifest: &mut Manifest,
    network: &str,
    contract: &str,
    deploy: F,
) -> Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Deployed>>,
{
    if let Some(address) = manifest.get_deployment(network, contract) {
        println!("  {contract} already deployed: {address}");
        return Ok(address);
    }

    println!("  deploying {contract}...");
    let deployed = deploy().await?;
    let address = deployed.address_string();
    manifest.save_deployment(
        network,
        contract,
        &address,
        &deployed.deployer_string(),
        deployed.block_number,
    )?;
    println!("  {contract} deployed: {address}");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn artifact_parses_abi_and_strips_the_bytecode_prefix() {
        let dir = tempdir().unwrap();
        let body = serde_json::json!({
            "contractName": "Box",
            "abi": [
                {
                    "type": "function",
                    "name": "value",
                    "inputs": [],
                    "outputs": [{"name": "", "type": "uint256"}],
                    "stateMutability": "view"
                }
            ],
            "bytecode": "0x6080604052"
        });
        fs::write(dir.path().join("Box.json"), body.to_string()).unwrap();

        let artifact = Artifact::load(dir.path(), "Box").unwrap();
        assert_eq!(artifact.contract_name, "Box");
        assert_eq!(artifact.bytecode, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.abi.function("value").is_ok());
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Artifact::load(dir.path(), "Ghost").is_err());
    }
}
