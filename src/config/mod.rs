// Application configuration
//
// All runtime configuration comes from environment variables. Optional
// values (contract addresses, upload credentials) degrade the matching
// feature when absent; a present but malformed value is an error.

use std::env;

use ethers::types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} holds an invalid address: {value}")]
    InvalidAddress { var: &'static str, value: String },
}

/// Environment-supplied application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Network name used as the deployment manifest key
    pub network: Option<String>,

    /// RPC endpoint override
    pub rpc_url: Option<String>,

    /// Stake token (DamcStakedToken) address
    pub stake_token: Option<Address>,

    /// Reward token (ReyRewardToken) address
    pub reward_token: Option<Address>,

    /// Chef (MasterChefToken) address
    pub chef: Option<Address>,

    /// Lottery contract address
    pub lottery: Option<Address>,

    /// Lottery ticket NFT address
    pub lottery_nft: Option<Address>,

    /// Marketplace NFT collection address
    pub nft: Option<Address>,

    /// Marketplace contract address
    pub marketplace: Option<Address>,

    /// Upload service JWT
    pub pinata_jwt: Option<String>,

    /// Upload service gateway host
    pub pinata_gateway: Option<String>,

    /// WalletConnect project identifier
    pub walletconnect_project_id: Option<String>,
}

impl AppConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            network: optional("NETWORK"),
            rpc_url: optional("RPC_URL"),
            stake_token: optional_address("STAKE_TOKEN_ADDRESS")?,
            reward_token: optional_address("REWARD_TOKEN_ADDRESS")?,
            chef: optional_address("CHEF_ADDRESS")?,
            lottery: optional_address("LOTTERY_ADDRESS")?,
            lottery_nft: optional_address("LOTTERY_NFT_ADDRESS")?,
            nft: optional_address("NFT_ADDRESS")?,
            marketplace: optional_address("MARKETPLACE_ADDRESS")?,
            pinata_jwt: optional("PINATA_JWT"),
            pinata_gateway: optional("PINATA_GATEWAY"),
            walletconnect_project_id: optional("WALLETCONNECT_PROJECT_ID"),
        })
    }

    pub fn require_stake_token(&self) -> Result<Address, ConfigError> {
        self.stake_token
            .ok_or(ConfigError::Missing("STAKE_TOKEN_ADDRESS"))
    }

    pub fn require_reward_token(&self) -> Result<Address, ConfigError> {
        self.reward_token
            .ok_or(ConfigError::Missing("REWARD_TOKEN_ADDRESS"))
    }

    pub fn require_chef(&self) -> Result<Address, ConfigError> {
        self.chef.ok_or(ConfigError::Missing("CHEF_ADDRESS"))
    }

    pub fn require_lottery(&self) -> Result<Address, ConfigError> {
        self.lottery.ok_or(ConfigError::Missing("LOTTERY_ADDRESS"))
    }

    pub fn require_nft(&self) -> Result<Address, ConfigError> {
        self.nft.ok_or(ConfigError::Missing("NFT_ADDRESS"))
    }

    pub fn require_marketplace(&self) -> Result<Address, ConfigError> {
        self.marketplace
            .ok_or(ConfigError::Missing("MARKETPLACE_ADDRESS"))
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn optional_address(var: &'static str) -> Result<Option<Address>, ConfigError> {
    match optional(var) {
        None => Ok(None),
        Some(value) => value
            .parse::<Address>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidAddress { var, value }),
    }
}
