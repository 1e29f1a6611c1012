// Yield-farm operations
//
// Typed operations over the chef and its two tokens. Amounts are validated
// before anything is submitted; the stake sequence sends the approval first
// and only submits the deposit once the approval receipt is in.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{Abi, Token};
use ethers::types::{Address, TransactionReceipt, U256};
use ethers::utils::{format_units, parse_units};
use thiserror::Error;

use crate::contracts::{abi, CallError, CallRequest, ContractReader, ReadRequest, TxSubmitter};
use crate::reads::PollingQuery;
use crate::wallet::{WalletContext, WalletError};

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("only the contract owner can {0}")]
    NotOwner(&'static str),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("unexpected return data: {0}")]
    Decode(String),
}

/// Client for the stake token, reward token and chef contracts
pub struct StakingClient {
    stake_token: Address,
    reward_token: Address,
    chef: Address,
    token_abi: Abi,
    chef_abi: Abi,
    reader: Arc<dyn ContractReader>,
    submitter: Arc<dyn TxSubmitter>,
    wallet: Arc<WalletContext>,
}

impl StakingClient {
    pub fn new(
        stake_token: Address,
        reward_token: Address,
        chef: Address,
        reader: Arc<dyn ContractReader>,
        submitter: Arc<dyn TxSubmitter>,
        wallet: Arc<WalletContext>,
    ) -> Self {
        Self {
            stake_token,
            reward_token,
            chef,
            token_abi: abi::erc20(),
            chef_abi: abi::chef(),
            reader,
            submitter,
            wallet,
        }
    }

    /// Deposit stake tokens: approve the chef, then stake once the
    /// approval is confirmed
    pub async fn stake(&self, amount: U256) -> Result<TransactionReceipt, StakingError> {
        ensure_positive(amount)?;

        self.submitter
            .submit(
                &self.token_abi,
                CallRequest::new(
                    self.stake_token,
                    "approve",
                    vec![Token::Address(self.chef), Token::Uint(amount)],
                ),
            )
            .await?;

        let receipt = self
            .submitter
            .submit(
                &self.chef_abi,
                CallRequest::new(self.chef, "stakeTokens", vec![Token::Uint(amount)]),
            )
            .await?;
        log::info!("staked {amount} wei");
        Ok(receipt)
    }

    /// Withdraw the full staked balance
    pub async fn unstake(&self) -> Result<TransactionReceipt, StakingError> {
        let receipt = self
            .submitter
            .submit(
                &self.chef_abi,
                CallRequest::new(self.chef, "unstakeTokens", vec![]),
            )
            .await?;
        Ok(receipt)
    }

    /// Distribute reward tokens to stakers. Owner-only; checked locally so
    /// a non-owner gets a validation error instead of a revert.
    pub async fn issue_rewards(&self) -> Result<TransactionReceipt, StakingError> {
        let caller = self.wallet.require_account()?;
        if self.owner().await? != caller {
            return Err(StakingError::NotOwner("issue rewards"));
        }
        let receipt = self
            .submitter
            .submit(
                &self.chef_abi,
                CallRequest::new(self.chef, "issueTokens", vec![]),
            )
            .await?;
        Ok(receipt)
    }

    /// Transfer stake tokens into the chef so unstake tests have liquidity
    pub async fn fund_chef(&self, amount: U256) -> Result<TransactionReceipt, StakingError> {
        ensure_positive(amount)?;
        let receipt = self
            .submitter
            .submit(
                &self.token_abi,
                CallRequest::new(
                    self.stake_token,
                    "transfer",
                    vec![Token::Address(self.chef), Token::Uint(amount)],
                ),
            )
            .await?;
        Ok(receipt)
    }

    /// Test-token faucet for the connected account
    pub async fn claim_test_tokens(&self, amount: U256) -> Result<TransactionReceipt, StakingError> {
        ensure_positive(amount)?;
        let account = self.wallet.require_account()?;
        let receipt = self
            .submitter
            .submit(
                &self.token_abi,
                CallRequest::new(
                    self.stake_token,
                    "mint",
                    vec![Token::Address(account), Token::Uint(amount)],
                ),
            )
            .await?;
        Ok(receipt)
    }

    pub async fn owner(&self) -> Result<Address, StakingError> {
        let tokens = self
            .reader
            .read(&self.chef_abi, ReadRequest::new(self.chef, "owner", vec![]))
            .await?;
        match tokens.as_slice() {
            [Token::Address(owner)] => Ok(*owner),
            other => Err(StakingError::Decode(format!("{other:?}"))),
        }
    }

    /// Staked balance of an account
    pub async fn staking_balance(&self, account: Address) -> Result<U256, StakingError> {
        self.read_uint(
            &self.chef_abi,
            ReadRequest::new(
                self.chef,
                "stakingBalance",
                vec![Token::Address(account)],
            ),
        )
        .await
    }

    /// Reward-token balance of an account
    pub async fn reward_balance(&self, account: Address) -> Result<U256, StakingError> {
        self.read_uint(
            &self.token_abi,
            ReadRequest::new(
                self.reward_token,
                "balanceOf",
                vec![Token::Address(account)],
            ),
        )
        .await
    }

    /// Reward tokens still held by the chef, the distributable pool
    pub async fn reward_pool(&self) -> Result<U256, StakingError> {
        self.reward_balance(self.chef).await
    }

    /// Poll the reward pool on a fixed interval
    pub fn reward_pool_query(self: Arc<Self>, period: Duration) -> PollingQuery<U256> {
        PollingQuery::spawn(period, move || {
            let client = Arc::clone(&self);
            async move { Ok(client.reward_pool().await?) }
        })
    }

    /// Poll an account's staked balance on a fixed interval
    pub fn staking_balance_query(
        self: Arc<Self>,
        account: Address,
        period: Duration,
    ) -> PollingQuery<U256> {
        PollingQuery::spawn(period, move || {
            let client = Arc::clone(&self);
            async move { Ok(client.staking_balance(account).await?) }
        })
    }

    async fn read_uint(&self, abi: &Abi, request: ReadRequest) -> Result<U256, StakingError> {
        let tokens = self.reader.read(abi, request).await?;
        match tokens.as_slice() {
            [Token::Uint(value)] => Ok(*value),
            other => Err(StakingError::Decode(format!("{other:?}"))),
        }
    }
}

/// Parse a user-typed 18-decimals amount, rejecting zero and garbage before
/// any transaction is built
pub fn parse_amount(input: &str) -> Result<U256, StakingError> {
    if input.trim_start().starts_with('-') {
        return Err(StakingError::InvalidAmount(input.to_string()));
    }
    let amount: U256 = parse_units(input, 18)
        .map_err(|e| StakingError::InvalidAmount(e.to_string()))?
        .into();
    ensure_positive(amount)?;
    Ok(amount)
}

/// Render an 18-decimals amount for display
pub fn format_amount(amount: U256) -> String {
    format_units(amount, 18).unwrap_or_else(|_| amount.to_string())
}

fn ensure_positive(amount: U256) -> Result<(), StakingError> {
    if amount.is_zero() {
        return Err(StakingError::NonPositiveAmount);
    }
    Ok(())
}
