// Deploy every contract group, the first-run path for a fresh network.

use anyhow::Result;
use dotenv::dotenv;

use evm_dapp::deploy::programs::{deploy_all, DeployEnv};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut env = DeployEnv::from_env()?;
    deploy_all(&mut env).await
}
