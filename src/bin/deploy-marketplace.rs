// Deploy the marketplace contract group (NFT collection + marketplace).
// Contracts already recorded in the manifest are not redeployed.

use anyhow::Result;
use dotenv::dotenv;

use evm_dapp::deploy::programs::{deploy_marketplace, DeployEnv};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut env = DeployEnv::from_env()?;
    deploy_marketplace(&mut env).await
}
