// Wallet and chain binding
//
// This module provides the chain profile registry and the explicit wallet
// context passed to every component that needs chain access. The context is
// initialized once at startup and mutated only by connect/disconnect.

use std::env;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::{Address, U256};
use thiserror::Error;

/// Signing client used for writes and deployments
pub type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no wallet is connected")]
    NotConnected,
}

/// Configuration for an EVM-compatible chain
#[derive(Debug, Clone)]
pub struct ChainProfile {
    /// Chain ID
    pub chain_id: u64,

    /// Chain name, also the deployment manifest key
    pub name: &'static str,

    /// Default RPC endpoint, when the chain has a public one
    pub rpc_url: Option<String>,

    /// Native currency symbol
    pub currency_symbol: &'static str,

    /// Average block time in seconds
    pub block_time: u64,

    /// Fixed gas price in wei, when the network config pins one
    pub gas_price: Option<U256>,
}

impl ChainProfile {
    /// Local Ganache chain
    pub fn ganache() -> Self {
        Self {
            chain_id: 1337,
            name: "ganache",
            rpc_url: Some("http://127.0.0.1:7545".to_string()),
            currency_symbol: "ETH",
            block_time: 1,
            gas_price: None,
        }
    }

    /// Localhost alias for the Ganache endpoint
    pub fn localhost() -> Self {
        Self {
            name: "localhost",
            ..Self::ganache()
        }
    }

    /// Polygon Amoy testnet
    pub fn polygon_amoy() -> Self {
        Self {
            chain_id: 80002,
            name: "polygonAmoy",
            rpc_url: Some("https://rpc-amoy.polygon.technology".to_string()),
            currency_symbol: "POL",
            block_time: 2,
            gas_price: Some(U256::from(30_000_000_000u64)), // 30 gwei
        }
    }

    /// Sepolia testnet, RPC endpoint must come from the environment
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11_155_111,
            name: "sepoliaInfura",
            rpc_url: None,
            currency_symbol: "ETH",
            block_time: 12,
            gas_price: Some(U256::from(30_000_000_000u64)), // 30 gwei
        }
    }

    /// Look up a profile by network name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "ganache" => Some(Self::ganache()),
            "localhost" => Some(Self::localhost()),
            "polygonAmoy" | "amoy" => Some(Self::polygon_amoy()),
            "sepoliaInfura" | "sepolia" => Some(Self::sepolia()),
            _ => None,
        }
    }
}

/// Connected-wallet context shared by chain-facing components
pub struct WalletContext {
    profile: ChainProfile,
    account: RwLock<Option<Address>>,
}

impl WalletContext {
    /// Create a disconnected context for the given chain
    pub fn new(profile: ChainProfile) -> Arc<Self> {
        Arc::new(Self {
            profile,
            account: RwLock::new(None),
        })
    }

    /// Bind a connected account
    pub fn connect(&self, account: Address) {
        *self.account.write().expect("wallet lock poisoned") = Some(account);
    }

    /// Bind the account controlled by a local signer
    pub fn connect_signer(&self, wallet: &LocalWallet) {
        self.connect(wallet.address());
    }

    /// Clear the connected account
    pub fn disconnect(&self) {
        *self.account.write().expect("wallet lock poisoned") = None;
    }

    pub fn account(&self) -> Option<Address> {
        *self.account.read().expect("wallet lock poisoned")
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Connected account, or an error for operations that need one
    pub fn require_account(&self) -> Result<Address, WalletError> {
        self.account().ok_or(WalletError::NotConnected)
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }
}

/// Create an HTTP provider for the given endpoint
pub fn http_provider(rpc_url: &str) -> Result<Arc<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .with_context(|| format!("invalid RPC endpoint {rpc_url}"))?;
    Ok(Arc::new(provider))
}

/// Wrap a provider and a signer into a signing client
pub fn signing_client(
    provider: Arc<Provider<Http>>,
    wallet: LocalWallet,
    chain_id: u64,
) -> Arc<SigningClient> {
    Arc::new(SignerMiddleware::new(
        provider.as_ref().clone(),
        wallet.with_chain_id(chain_id),
    ))
}

/// Build a signer from PRIVATE_KEY or MNEMONIC
pub fn signer_from_env() -> Result<LocalWallet> {
    if let Ok(key) = env::var("PRIVATE_KEY") {
        return key.parse::<LocalWallet>().context("invalid PRIVATE_KEY");
    }
    if let Ok(mnemonic) = env::var("MNEMONIC") {
        return MnemonicBuilder::<English>::default()
            .phrase(mnemonic.as_str())
            .build()
            .context("invalid MNEMONIC");
    }
    anyhow::bail!("set PRIVATE_KEY or MNEMONIC to sign transactions")
}
