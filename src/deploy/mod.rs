// Deployment manifest
//
// The manifest is a JSON file keyed by network name, then contract name.
// It is what makes the deploy scripts safe to re-run: a contract with a
// record is never redeployed. Single-process sequential access only; there
// is no file locking and the last writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod deployer;
pub mod programs;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed JSON aborts the deploy run; silently starting from an
    /// empty manifest would redeploy everything
    #[error("manifest {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded deployment. At most one live record per
/// (network, contract) key; overwritten, never versioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: String,
    pub deployer: String,
    /// Epoch milliseconds at record time
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

type NetworkRecords = BTreeMap<String, DeploymentRecord>;

/// The manifest file and its parsed contents
pub struct Manifest {
    path: PathBuf,
    networks: BTreeMap<String, NetworkRecords>,
}

impl Manifest {
    /// Load the manifest. A missing file is an empty manifest; malformed
    /// JSON is fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                networks: BTreeMap::new(),
            });
        }

        let data = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let networks =
            serde_json::from_str(&data).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, networks })
    }

    /// True iff a record exists for that exact key
    pub fn is_deployed(&self, network: &str, contract: &str) -> bool {
        self.get_deployment(network, contract).is_some()
    }

    /// Stored address for the key, if any
    pub fn get_deployment(&self, network: &str, contract: &str) -> Option<String> {
        self.networks
            .get(network)
            .and_then(|records| records.get(contract))
            .map(|record| record.address.clone())
    }

    /// Full record for the key, if any
    pub fn record(&self, network: &str, contract: &str) -> Option<&DeploymentRecord> {
        self.networks
            .get(network)
            .and_then(|records| records.get(contract))
    }

    /// Upsert a record and synchronously rewrite the whole file
    pub fn save_deployment(
        &mut self,
        network: &str,
        contract: &str,
        address: &str,
        deployer: &str,
        block_number: Option<u64>,
    ) -> Result<(), ManifestError> {
        self.networks.entry(network.to_string()).or_default().insert(
            contract.to_string(),
            DeploymentRecord {
                address: address.to_string(),
                deployer: deployer.to_string(),
                timestamp: Utc::now().timestamp_millis(),
                block_number,
            },
        );
        self.persist()?;
        log::info!("saved {contract} deployment to {network}");
        Ok(())
    }

    /// Print a summary of one network's deployments
    pub fn print_deployments(&self, network: &str) {
        let records = match self.networks.get(network) {
            Some(records) if !records.is_empty() => records,
            _ => {
                println!("\nNo deployments found for {network}\n");
                return;
            }
        };

        println!("\nDeployments on {network}:");
        println!("{}", "─".repeat(80));
        for (contract, record) in records {
            println!("  {:<20} {}", contract, record.address);
        }
        println!("{}\n", "─".repeat(80));
    }

    fn persist(&self) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(&self.networks)
            .expect("manifest contents are always serializable");
        fs::write(&self.path, json).map_err(|source| ManifestError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_an_empty_manifest() {
        let dir = tempdir().unwrap();
        let manifest = Manifest::load(dir.path().join("deployments.json")).unwrap();
        assert!(!manifest.is_deployed("ganache", "NFT"));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Manifest::load(&path),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn save_overwrites_the_previous_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut manifest = Manifest::load(&path).unwrap();
        manifest
            .save_deployment("ganache", "NFT", "0x01", "0xdeployer", Some(1))
            .unwrap();
        manifest
            .save_deployment("ganache", "NFT", "0x02", "0xdeployer", Some(2))
            .unwrap();

        assert_eq!(
            manifest.get_deployment("ganache", "NFT").as_deref(),
            Some("0x02")
        );
        assert_eq!(manifest.record("ganache", "NFT").unwrap().block_number, Some(2));
    }

    #[test]
    fn records_survive_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut manifest = Manifest::load(&path).unwrap();
        manifest
            .save_deployment("amoy", "Lottery", "0xAAA", "0xdeployer", None)
            .unwrap();
        drop(manifest);

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(
            reloaded.get_deployment("amoy", "Lottery").as_deref(),
            Some("0xAAA")
        );
        // absent blockNumber stays absent instead of serializing as null
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("blockNumber"));
    }
}
