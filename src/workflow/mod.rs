// NFT creation workflow
//
// Sequences the four dependent operations behind "create and list an NFT":
// pin the asset and its metadata, mint, approve the marketplace, list.
// Each chain step starts only after the previous step's receipt has been
// retrieved and validated; any failure halts the sequence and resets the
// controller to idle. A failure between mint and list can leave a minted,
// approved-but-unlisted token: the controller reports the failed stage and
// never retries on its own.

use std::fmt;
use std::sync::Arc;

use ethers::abi::{Abi, Token};
use ethers::types::{Address, Log, TransactionReceipt, H256, U256};
use thiserror::Error;

use crate::contracts::abi::{self, EventSelectors};
use crate::contracts::{CallError, CallRequest, TxSubmitter};
use crate::uploads::{ContentStore, PinResult, TokenMetadata, UploadError};

/// Stage of the mint-and-list sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    /// Idle baseline; also the asset/metadata pinning stage
    Upload,
    Mint,
    Approve,
    List,
    Done,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Upload => "upload",
            WorkflowStage::Mint => "mint",
            WorkflowStage::Approve => "approve",
            WorkflowStage::List => "list",
            WorkflowStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("{stage} transaction failed: {source}")]
    Transaction {
        stage: WorkflowStage,
        source: CallError,
    },

    #[error("token id not found")]
    TokenIdNotFound,

    #[error("approval not confirmed")]
    ApprovalNotConfirmed,
}

/// Everything needed to create and list one NFT
#[derive(Debug, Clone)]
pub struct CreateNftRequest {
    pub asset: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub name: String,
    pub description: String,
    /// Listing price in wei
    pub price: U256,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct ListedNft {
    pub token_id: U256,
    pub token_uri: String,
    pub price: U256,
}

/// Controller for the mint-and-list sequence. One instance drives one
/// submission at a time; state lives in client memory only.
pub struct NftWorkflow {
    submitter: Arc<dyn TxSubmitter>,
    store: Arc<dyn ContentStore>,
    nft: Address,
    marketplace: Address,
    nft_abi: Abi,
    marketplace_abi: Abi,
    selectors: EventSelectors,
    stage: WorkflowStage,
}

impl NftWorkflow {
    pub fn new(
        submitter: Arc<dyn TxSubmitter>,
        store: Arc<dyn ContentStore>,
        nft: Address,
        marketplace: Address,
    ) -> Self {
        Self {
            submitter,
            store,
            nft,
            marketplace,
            nft_abi: abi::nft(),
            marketplace_abi: abi::marketplace(),
            selectors: EventSelectors::default(),
            stage: WorkflowStage::Upload,
        }
    }

    /// Override the event selectors, for collections that emit non-standard
    /// signatures
    pub fn with_selectors(mut self, selectors: EventSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    /// Drive the full sequence. On success or failure the controller
    /// settles back to the idle `Upload` baseline.
    pub async fn run(&mut self, request: CreateNftRequest) -> Result<ListedNft, WorkflowError> {
        let outcome = self.advance(request).await;
        if let Err(e) = &outcome {
            log::warn!("nft creation aborted at {}: {e}", self.stage);
        }
        self.stage = WorkflowStage::Upload;
        outcome
    }

    async fn advance(&mut self, request: CreateNftRequest) -> Result<ListedNft, WorkflowError> {
        self.stage = WorkflowStage::Upload;
        let asset = self
            .store
            .pin_file(request.asset.clone(), &request.filename, &request.content_type)
            .await?;
        let token_uri = self.pin_metadata(&request, &asset).await?.uri;
        log::debug!("metadata pinned at {token_uri}");

        self.stage = WorkflowStage::Mint;
        let receipt = self
            .step(
                &self.nft_abi,
                CallRequest::new(
                    self.nft,
                    "mint",
                    vec![Token::String(token_uri.clone())],
                ),
            )
            .await?;
        let token_id = token_id_from_logs(&receipt.logs, self.selectors.transfer, self.nft)
            .ok_or(WorkflowError::TokenIdNotFound)?;
        log::info!("minted token {token_id}");

        self.stage = WorkflowStage::Approve;
        let receipt = self
            .step(
                &self.nft_abi,
                CallRequest::new(
                    self.nft,
                    "approve",
                    vec![Token::Address(self.marketplace), Token::Uint(token_id)],
                ),
            )
            .await?;
        let approved = token_id_from_logs(&receipt.logs, self.selectors.approval, self.nft);
        if approved != Some(token_id) {
            return Err(WorkflowError::ApprovalNotConfirmed);
        }

        self.stage = WorkflowStage::List;
        self.step(
            &self.marketplace_abi,
            CallRequest::new(
                self.marketplace,
                "makeItem",
                vec![
                    Token::Address(self.nft),
                    Token::Uint(token_id),
                    Token::Uint(request.price),
                ],
            ),
        )
        .await?;

        self.stage = WorkflowStage::Done;
        log::info!("token {token_id} listed at {} wei", request.price);
        Ok(ListedNft {
            token_id,
            token_uri,
            price: request.price,
        })
    }

    async fn pin_metadata(
        &self,
        request: &CreateNftRequest,
        asset: &PinResult,
    ) -> Result<PinResult, WorkflowError> {
        let metadata = TokenMetadata {
            name: request.name.clone(),
            description: request.description.clone(),
            image: asset.uri.clone(),
        };
        Ok(self.store.pin_metadata(&metadata).await?)
    }

    // The one submit-await-validate primitive shared by the chain steps
    async fn step(
        &self,
        abi: &Abi,
        call: CallRequest,
    ) -> Result<TransactionReceipt, WorkflowError> {
        self.submitter
            .submit(abi, call)
            .await
            .map_err(|source| WorkflowError::Transaction {
                stage: self.stage,
                source,
            })
    }
}

/// Extract the token id from the first 4-topic record emitted by `emitter`
/// whose topic0 matches `selector`; the id is the fourth topic.
pub fn token_id_from_logs(logs: &[Log], selector: H256, emitter: Address) -> Option<U256> {
    logs.iter()
        .find(|log| {
            log.address == emitter && log.topics.len() == 4 && log.topics[0] == selector
        })
        .map(|log| U256::from_big_endian(log.topics[3].as_bytes()))
}
