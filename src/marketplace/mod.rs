// Marketplace listing mirror
//
// Listings live in the marketplace contract; this module only reads and
// mirrors them. Purchases attach the contract-computed total price.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{Abi, Token};
use ethers::types::{Address, TransactionReceipt, U256};
use thiserror::Error;

use crate::contracts::{abi, CallError, CallRequest, ContractReader, ReadRequest, TxSubmitter};
use crate::reads::PollingQuery;
use crate::wallet::{WalletContext, WalletError};

#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("unexpected listing shape: {0}")]
    Decode(String),
}

/// A marketplace item, mirrored from the contract's `items` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub item_id: U256,
    pub nft: Address,
    pub token_id: U256,
    /// Seller-set price in wei, before the marketplace fee
    pub price: U256,
    pub seller: Address,
    pub sold: bool,
}

impl Listing {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, MarketError> {
        match tokens.as_slice() {
            [Token::Uint(item_id), Token::Address(nft), Token::Uint(token_id), Token::Uint(price), Token::Address(seller), Token::Bool(sold)] => {
                Ok(Self {
                    item_id: *item_id,
                    nft: *nft,
                    token_id: *token_id,
                    price: *price,
                    seller: *seller,
                    sold: *sold,
                })
            }
            other => Err(MarketError::Decode(format!("{other:?}"))),
        }
    }
}

/// A user's listings split by sale state
#[derive(Debug, Clone, Default)]
pub struct MyListings {
    pub on_sale: Vec<Listing>,
    pub sold: Vec<Listing>,
}

/// Client for the marketplace contract and its NFT collection
pub struct MarketplaceClient {
    marketplace: Address,
    nft: Address,
    marketplace_abi: Abi,
    nft_abi: Abi,
    reader: Arc<dyn ContractReader>,
    submitter: Arc<dyn TxSubmitter>,
    wallet: Arc<WalletContext>,
}

impl MarketplaceClient {
    pub fn new(
        marketplace: Address,
        nft: Address,
        reader: Arc<dyn ContractReader>,
        submitter: Arc<dyn TxSubmitter>,
        wallet: Arc<WalletContext>,
    ) -> Self {
        Self {
            marketplace,
            nft,
            marketplace_abi: abi::marketplace(),
            nft_abi: abi::nft(),
            reader,
            submitter,
            wallet,
        }
    }

    pub async fn item_count(&self) -> Result<U256, MarketError> {
        self.read_uint("itemCount", vec![]).await
    }

    pub async fn fee_percent(&self) -> Result<U256, MarketError> {
        self.read_uint("feePercent", vec![]).await
    }

    /// One listing, decoded from the contract tuple
    pub async fn listing(&self, item_id: U256) -> Result<Listing, MarketError> {
        let tokens = self
            .reader
            .read(
                &self.marketplace_abi,
                ReadRequest::new(self.marketplace, "items", vec![Token::Uint(item_id)]),
            )
            .await?;
        Listing::from_tokens(tokens)
    }

    /// Price plus marketplace fee, as computed by the contract
    pub async fn total_price(&self, item_id: U256) -> Result<U256, MarketError> {
        self.read_uint("getTotalPrice", vec![Token::Uint(item_id)])
            .await
    }

    /// All listings, walking 1..=itemCount. Items that fail to decode are
    /// skipped and logged.
    pub async fn browse(&self) -> Result<Vec<Listing>, MarketError> {
        let count = self.item_count().await?.as_u64();
        let mut listings = Vec::new();
        for item_id in 1..=count {
            match self.listing(U256::from(item_id)).await {
                Ok(listing) => listings.push(listing),
                Err(e) => log::warn!("skipping item {item_id}: {e}"),
            }
        }
        Ok(listings)
    }

    /// Listings whose seller is the connected account
    pub async fn my_listings(&self) -> Result<MyListings, MarketError> {
        let account = self.wallet.require_account()?;
        let mut mine = MyListings::default();
        for listing in self.browse().await? {
            if listing.seller != account {
                continue;
            }
            if listing.sold {
                mine.sold.push(listing);
            } else {
                mine.on_sale.push(listing);
            }
        }
        Ok(mine)
    }

    /// Buy an item, attaching the contract-computed total price
    pub async fn purchase(&self, item_id: U256) -> Result<TransactionReceipt, MarketError> {
        let total = self.total_price(item_id).await?;
        let receipt = self
            .submitter
            .submit(
                &self.marketplace_abi,
                CallRequest::new(self.marketplace, "purchaseItem", vec![Token::Uint(item_id)])
                    .with_value(total),
            )
            .await?;
        Ok(receipt)
    }

    pub async fn token_uri(&self, token_id: U256) -> Result<String, MarketError> {
        let tokens = self
            .reader
            .read(
                &self.nft_abi,
                ReadRequest::new(self.nft, "tokenURI", vec![Token::Uint(token_id)]),
            )
            .await?;
        match tokens.as_slice() {
            [Token::String(uri)] => Ok(uri.clone()),
            other => Err(MarketError::Decode(format!("{other:?}"))),
        }
    }

    /// Poll one listing on a fixed interval (the cards refresh every 5 s)
    pub fn listing_query(
        self: Arc<Self>,
        item_id: U256,
        period: Duration,
    ) -> PollingQuery<Listing> {
        PollingQuery::spawn(period, move || {
            let client = Arc::clone(&self);
            async move { Ok(client.listing(item_id).await?) }
        })
    }

    async fn read_uint(&self, function: &str, args: Vec<Token>) -> Result<U256, MarketError> {
        let tokens = self
            .reader
            .read(
                &self.marketplace_abi,
                ReadRequest::new(self.marketplace, function, args),
            )
            .await?;
        match tokens.as_slice() {
            [Token::Uint(value)] => Ok(*value),
            other => Err(MarketError::Decode(format!("{other:?}"))),
        }
    }
}
