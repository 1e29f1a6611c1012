#![allow(dead_code)]

// Shared test doubles: a recording transaction submitter, a canned
// contract reader and an in-memory content store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, Log, TransactionReceipt, H256};

use evm_dapp::contracts::abi::EventSelectors;
use evm_dapp::contracts::{CallError, CallRequest, ContractReader, ReadRequest, TxSubmitter};
use evm_dapp::uploads::{ContentStore, PinResult, TokenMetadata, UploadError};

/// Records every submitted call and replays canned receipts in order
pub struct MockSubmitter {
    calls: Mutex<Vec<CallRequest>>,
    receipts: Mutex<VecDeque<TransactionReceipt>>,
}

impl MockSubmitter {
    pub fn new(receipts: Vec<TransactionReceipt>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            receipts: Mutex::new(receipts.into()),
        })
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Function names in submission order
    pub fn functions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| call.function)
            .collect()
    }
}

#[async_trait]
impl TxSubmitter for MockSubmitter {
    async fn submit(&self, _abi: &Abi, call: CallRequest) -> Result<TransactionReceipt, CallError> {
        self.calls.lock().unwrap().push(call);
        self.receipts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CallError::ReceiptMissing)
    }
}

/// Canned read responses keyed by function name
pub struct MockReader {
    responses: Mutex<HashMap<String, Vec<Token>>>,
}

impl MockReader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
        })
    }

    pub fn respond(self: Arc<Self>, function: &str, tokens: Vec<Token>) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .insert(function.to_string(), tokens);
        self
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn read(&self, _abi: &Abi, request: ReadRequest) -> Result<Vec<Token>, CallError> {
        self.responses
            .lock()
            .unwrap()
            .get(&request.function)
            .cloned()
            .ok_or_else(|| CallError::UnknownFunction(request.function))
    }
}

/// In-memory content store; `failing()` simulates a service outage
pub struct MockStore {
    fail: bool,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true })
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn pin_file(
        &self,
        _bytes: Vec<u8>,
        _filename: &str,
        _content_type: &str,
    ) -> Result<PinResult, UploadError> {
        if self.fail {
            return Err(UploadError::Service {
                status: 500,
                detail: "pinning unavailable".to_string(),
            });
        }
        Ok(PinResult {
            cid: "bafyasset".to_string(),
            uri: "ipfs://bafyasset".to_string(),
        })
    }

    async fn pin_metadata(&self, metadata: &TokenMetadata) -> Result<PinResult, UploadError> {
        if self.fail {
            return Err(UploadError::Service {
                status: 500,
                detail: "pinning unavailable".to_string(),
            });
        }
        if metadata.name.is_empty() || metadata.image.is_empty() {
            return Err(UploadError::InvalidMetadata);
        }
        Ok(PinResult {
            cid: "bafymeta".to_string(),
            uri: "ipfs://bafymeta".to_string(),
        })
    }
}

/// Receipt carrying one 4-topic record from `emitter`
pub fn receipt_with_record(emitter: Address, selector: H256, token_id: u64) -> TransactionReceipt {
    TransactionReceipt {
        logs: vec![Log {
            address: emitter,
            topics: vec![
                selector,
                H256::zero(),
                H256::from_low_u64_be(0xcafe),
                H256::from_low_u64_be(token_id),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Receipt with no logs at all
pub fn empty_receipt() -> TransactionReceipt {
    TransactionReceipt::default()
}

pub fn selectors() -> EventSelectors {
    EventSelectors::default()
}
