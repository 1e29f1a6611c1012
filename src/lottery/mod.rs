// Lottery operations
//
// The contract sells its own ERC-20 against ether, tickets cost a fixed
// number of those tokens, and the owner runs the draw. The ether price per
// token is a client parameter since the distilled contract surface does not
// expose it.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{Abi, Token};
use ethers::types::{Address, TransactionReceipt, U256};
use thiserror::Error;

use crate::contracts::{abi, CallError, CallRequest, ContractReader, ReadRequest, TxSubmitter};
use crate::reads::PollingQuery;
use crate::wallet::{WalletContext, WalletError};

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("only the contract owner can {0}")]
    NotOwner(&'static str),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("unexpected return data: {0}")]
    Decode(String),
}

/// The three balances the lottery screen polls every 10 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryBalances {
    /// Lottery tokens held by the account
    pub user_tokens: U256,
    /// Lottery tokens still for sale in the contract
    pub contract_tokens: U256,
    /// Prize pool in ether
    pub contract_ethers: U256,
}

/// Client for the lottery contract
pub struct LotteryClient {
    lottery: Address,
    lottery_abi: Abi,
    /// Ether price of one lottery token, in wei
    token_price: U256,
    reader: Arc<dyn ContractReader>,
    submitter: Arc<dyn TxSubmitter>,
    wallet: Arc<WalletContext>,
}

impl LotteryClient {
    pub fn new(
        lottery: Address,
        token_price: U256,
        reader: Arc<dyn ContractReader>,
        submitter: Arc<dyn TxSubmitter>,
        wallet: Arc<WalletContext>,
    ) -> Self {
        Self {
            lottery,
            lottery_abi: abi::lottery(),
            token_price,
            reader,
            submitter,
            wallet,
        }
    }

    /// Buy lottery tokens with ether
    pub async fn buy_tokens(&self, quantity: u64) -> Result<TransactionReceipt, LotteryError> {
        ensure_positive(quantity)?;
        let value = self.token_price * U256::from(quantity);
        let receipt = self
            .submitter
            .submit(
                &self.lottery_abi,
                CallRequest::new(
                    self.lottery,
                    "compraTokens",
                    vec![Token::Uint(U256::from(quantity))],
                )
                .with_value(value),
            )
            .await?;
        Ok(receipt)
    }

    /// Return lottery tokens for ether
    pub async fn return_tokens(&self, quantity: u64) -> Result<TransactionReceipt, LotteryError> {
        ensure_positive(quantity)?;
        let receipt = self
            .submitter
            .submit(
                &self.lottery_abi,
                CallRequest::new(
                    self.lottery,
                    "devolverTokens",
                    vec![Token::Uint(U256::from(quantity))],
                ),
            )
            .await?;
        Ok(receipt)
    }

    /// Buy tickets; each one mints a collectible ticket NFT on-chain
    pub async fn buy_tickets(&self, quantity: u64) -> Result<TransactionReceipt, LotteryError> {
        ensure_positive(quantity)?;
        let receipt = self
            .submitter
            .submit(
                &self.lottery_abi,
                CallRequest::new(
                    self.lottery,
                    "compraBoleto",
                    vec![Token::Uint(U256::from(quantity))],
                ),
            )
            .await?;
        Ok(receipt)
    }

    /// Run the draw. Owner-only; checked locally so a non-owner gets a
    /// validation error instead of a revert.
    pub async fn draw_winner(&self) -> Result<TransactionReceipt, LotteryError> {
        let caller = self.wallet.require_account()?;
        if self.owner().await? != caller {
            return Err(LotteryError::NotOwner("run the draw"));
        }
        let receipt = self
            .submitter
            .submit(
                &self.lottery_abi,
                CallRequest::new(self.lottery, "generarGanador", vec![]),
            )
            .await?;
        Ok(receipt)
    }

    pub async fn owner(&self) -> Result<Address, LotteryError> {
        self.read_address("owner").await
    }

    /// Address of the ticket NFT collection created by the lottery
    pub async fn nft_address(&self) -> Result<Address, LotteryError> {
        self.read_address("nft").await
    }

    pub async fn balances(&self, account: Address) -> Result<LotteryBalances, LotteryError> {
        Ok(LotteryBalances {
            user_tokens: self
                .read_uint("balanceTokens", vec![Token::Address(account)])
                .await?,
            contract_tokens: self.read_uint("balanceTokensSC", vec![]).await?,
            contract_ethers: self.read_uint("balanceEthersSC", vec![]).await?,
        })
    }

    /// Poll the balances triple on a fixed interval (10 s in the UI)
    pub fn balances_query(
        self: Arc<Self>,
        account: Address,
        period: Duration,
    ) -> PollingQuery<LotteryBalances> {
        PollingQuery::spawn(period, move || {
            let client = Arc::clone(&self);
            async move { Ok(client.balances(account).await?) }
        })
    }

    async fn read_uint(&self, function: &str, args: Vec<Token>) -> Result<U256, LotteryError> {
        let tokens = self
            .reader
            .read(
                &self.lottery_abi,
                ReadRequest::new(self.lottery, function, args),
            )
            .await?;
        match tokens.as_slice() {
            [Token::Uint(value)] => Ok(*value),
            other => Err(LotteryError::Decode(format!("{other:?}"))),
        }
    }

    async fn read_address(&self, function: &str) -> Result<Address, LotteryError> {
        let tokens = self
            .reader
            .read(
                &self.lottery_abi,
                ReadRequest::new(self.lottery, function, vec![]),
            )
            .await?;
        match tokens.as_slice() {
            [Token::Address(address)] => Ok(*address),
            other => Err(LotteryError::Decode(format!("{other:?}"))),
        }
    }
}

fn ensure_positive(quantity: u64) -> Result<(), LotteryError> {
    if quantity == 0 {
        return Err(LotteryError::NonPositiveQuantity);
    }
    Ok(())
}
