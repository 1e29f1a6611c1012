// Deploy programs
//
// One function per contract group, shared by the deploy binaries. All
// configuration comes from the environment; the scripts take no flags.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::abi::Token;
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use ethers::utils::to_checksum;

use crate::contracts::{abi, ContractReader, ReadRequest, RpcReader};
use crate::wallet::{http_provider, signer_from_env, signing_client, ChainProfile};

use super::deployer::{ensure_deployed, Artifact, Deployer};
use super::Manifest;

/// Everything a deploy run needs, resolved from the environment once
pub struct DeployEnv {
    pub network: String,
    pub manifest: Manifest,
    pub deployer: Deployer,
    pub provider: Arc<Provider<Http>>,
    artifacts_dir: PathBuf,
}

impl DeployEnv {
    /// Resolve NETWORK, RPC_URL, CHAIN_ID, the signer and the manifest
    /// path. Unknown networks need RPC_URL and CHAIN_ID set explicitly.
    pub fn from_env() -> Result<Self> {
        let network = env::var("NETWORK").unwrap_or_else(|_| "localhost".to_string());
        let profile = ChainProfile::by_name(&network);

        let rpc_url = env::var("RPC_URL")
            .ok()
            .or_else(|| profile.as_ref().and_then(|p| p.rpc_url.clone()))
            .with_context(|| format!("RPC_URL is not set and {network} has no default"))?;
        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => raw.parse::<u64>().context("invalid CHAIN_ID")?,
            Err(_) => profile
                .as_ref()
                .map(|p| p.chain_id)
                .with_context(|| format!("CHAIN_ID is not set and {network} has no default"))?,
        };
        let gas_price = profile.and_then(|p| p.gas_price);

        let provider = http_provider(&rpc_url)?;
        let wallet = signer_from_env()?;
        let client = signing_client(Arc::clone(&provider), wallet, chain_id);

        let manifest_path =
            env::var("DEPLOYMENTS_FILE").unwrap_or_else(|_| "deployments.json".to_string());
        let manifest = Manifest::load(&manifest_path)?;

        let artifacts_dir =
            PathBuf::from(env::var("ARTIFACTS_DIR").unwrap_or_else(|_| "artifacts".to_string()));

        Ok(Self {
            network,
            manifest,
            deployer: Deployer::new(client, gas_price),
            provider,
            artifacts_dir,
        })
    }

    pub fn account(&self) -> Address {
        self.deployer.account()
    }

    fn artifact(&self, name: &str) -> Result<Artifact> {
        Artifact::load(&self.artifacts_dir, name)
    }
}

/// Print the banner every deploy script opens with
pub fn banner(title: &str, env: &DeployEnv) {
    println!("\n{title}");
    println!("{}", "─".repeat(80));
    println!("Network:  {}", env.network);
    println!("Deployer: {}", to_checksum(&env.account(), None));
    println!("{}\n", "─".repeat(80));
}

/// Deploy the DeFi group: stake token, reward token, chef(stake, reward)
pub async fn deploy_defi(env: &mut DeployEnv) -> Result<()> {
    banner("Deploying DeFi Contracts", env);

    let stake_artifact = env.artifact("DamcStakedToken")?;
    let reward_artifact = env.artifact("ReyRewardToken")?;
    let chef_artifact = env.artifact("MasterChefToken")?;

    let DeployEnv {
        network,
        manifest,
        deployer,
        ..
    } = env;

    let stake_address = ensure_deployed(manifest, network, "DamcStakedToken", || {
        deployer.deploy(&stake_artifact, vec![])
    })
    .await?;

    let reward_address = ensure_deployed(manifest, network, "ReyRewardToken", || {
        deployer.deploy(&reward_artifact, vec![])
    })
    .await?;

    let stake: Address = stake_address.parse().context("stored stake token address")?;
    let reward: Address = reward_address
        .parse()
        .context("stored reward token address")?;
    ensure_deployed(manifest, network, "MasterChefToken", || {
        deployer.deploy(
            &chef_artifact,
            vec![Token::Address(stake), Token::Address(reward)],
        )
    })
    .await?;

    env.manifest.print_deployments(&env.network);
    Ok(())
}

/// Deploy the lottery and record the ticket NFT collection it creates
pub async fn deploy_lottery(env: &mut DeployEnv) -> Result<()> {
    banner("Deploying Lottery Contract", env);

    let lottery_artifact = env.artifact("Lottery")?;

    let DeployEnv {
        network,
        manifest,
        deployer,
        ..
    } = env;

    let lottery_address = ensure_deployed(manifest, network, "Lottery", || {
        deployer.deploy(&lottery_artifact, vec![])
    })
    .await?;

    // the lottery deploys its own NFT collection; record it under its own
    // name so the frontend can read it from the manifest
    if !env.manifest.is_deployed(&env.network, "LotteryNFT") {
        let lottery: Address = lottery_address.parse().context("stored lottery address")?;
        let reader = RpcReader::new(Arc::clone(&env.provider));
        let tokens = reader
            .read(&abi::lottery(), ReadRequest::new(lottery, "nft", vec![]))
            .await
            .context("failed to read the lottery NFT address")?;
        let nft = match tokens.as_slice() {
            [Token::Address(nft)] => *nft,
            other => anyhow::bail!("unexpected nft() return: {other:?}"),
        };

        env.manifest.save_deployment(
            &env.network,
            "LotteryNFT",
            &to_checksum(&nft, None),
            &to_checksum(&env.account(), None),
            None,
        )?;
        println!("  LotteryNFT recorded: {}", to_checksum(&nft, None));
    }

    env.manifest.print_deployments(&env.network);
    Ok(())
}

/// Deploy the marketplace group: NFT collection, then the marketplace with
/// its fee percentage
pub async fn deploy_marketplace(env: &mut DeployEnv) -> Result<()> {
    banner("Deploying Marketplace Contracts", env);

    let nft_artifact = env.artifact("NFT")?;
    let marketplace_artifact = env.artifact("Marketplace")?;

    let fee_percent = 1u64; // 1% fee

    let DeployEnv {
        network,
        manifest,
        deployer,
        ..
    } = env;

    ensure_deployed(manifest, network, "NFT", || {
        deployer.deploy(&nft_artifact, vec![])
    })
    .await?;

    ensure_deployed(manifest, network, "Marketplace", || {
        deployer.deploy(
            &marketplace_artifact,
            vec![Token::Uint(fee_percent.into())],
        )
    })
    .await?;

    env.manifest.print_deployments(&env.network);
    Ok(())
}

/// Deploy everything, the first-run path for a fresh network
pub async fn deploy_all(env: &mut DeployEnv) -> Result<()> {
    println!("\nDeploying ALL Contracts");
    println!("{}", "═".repeat(80));
    println!("Network: {}", env.network);
    println!("{}\n", "═".repeat(80));

    println!("Step 1/2: DeFi contracts");
    deploy_defi(env).await?;

    println!("Step 2/2: Lottery contract");
    deploy_lottery(env).await?;

    println!("\n{}", "═".repeat(80));
    println!("ALL CONTRACTS DEPLOYED");
    println!("{}", "═".repeat(80));
    env.manifest.print_deployments(&env.network);
    Ok(())
}
