// Deploy the Lottery contract and record the ticket NFT collection it
// creates. Contracts already recorded in the manifest are not redeployed.

use anyhow::Result;
use dotenv::dotenv;

use evm_dapp::deploy::programs::{deploy_lottery, DeployEnv};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut env = DeployEnv::from_env()?;
    deploy_lottery(&mut env).await
}
