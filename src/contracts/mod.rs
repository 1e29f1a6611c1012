// Contract read/write boundary
//
// Every on-chain interaction is expressed as (contract address, ABI,
// function name, arguments). Reads return decoded values; writes return the
// mined receipt with its log array. The trait seams exist so tests can
// substitute recording implementations.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, TransactionRequest, U256, U64};
use thiserror::Error;

use crate::wallet::SigningClient;

pub mod abi;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transaction {0} reverted")]
    Reverted(String),

    #[error("transaction dropped before a receipt was produced")]
    ReceiptMissing,

    #[error("unexpected return data: {0}")]
    Decode(String),
}

/// A read against a deployed contract
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub to: Address,
    pub function: String,
    pub args: Vec<Token>,
}

impl ReadRequest {
    pub fn new(to: Address, function: &str, args: Vec<Token>) -> Self {
        Self {
            to,
            function: function.to_string(),
            args,
        }
    }
}

/// A state-changing call against a deployed contract
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub function: String,
    pub args: Vec<Token>,
    /// Ether attached to the call, zero for non-payable functions
    pub value: U256,
}

impl CallRequest {
    pub fn new(to: Address, function: &str, args: Vec<Token>) -> Self {
        Self {
            to,
            function: function.to_string(),
            args,
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Decoding read access to deployed contracts
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn read(&self, abi: &Abi, request: ReadRequest) -> Result<Vec<Token>, CallError>;
}

/// Transaction submission, resolved once the receipt is mined
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, abi: &Abi, call: CallRequest) -> Result<TransactionReceipt, CallError>;
}

/// Encode a function call for the given ABI
pub fn encode_call(abi: &Abi, function: &str, args: &[Token]) -> Result<Vec<u8>, CallError> {
    let function = abi
        .function(function)
        .map_err(|_| CallError::UnknownFunction(function.to_string()))?;
    function
        .encode_input(args)
        .map_err(|e| CallError::Abi(e.to_string()))
}

/// Live reader backed by an RPC provider
pub struct RpcReader {
    provider: Arc<Provider<Http>>,
}

impl RpcReader {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ContractReader for RpcReader {
    async fn read(&self, abi: &Abi, request: ReadRequest) -> Result<Vec<Token>, CallError> {
        let data = encode_call(abi, &request.function, &request.args)?;
        let tx: TypedTransaction = TransactionRequest::new()
            .to(request.to)
            .data(data)
            .into();

        let raw = self
            .provider
            .call(&tx, None)
            .await
            .map_err(|e| CallError::Rpc(e.to_string()))?;

        let function = abi
            .function(&request.function)
            .map_err(|_| CallError::UnknownFunction(request.function.clone()))?;
        function
            .decode_output(raw.as_ref())
            .map_err(|e| CallError::Abi(e.to_string()))
    }
}

/// Live submitter that signs with the session wallet and waits one
/// confirmation
pub struct SignerSubmitter {
    client: Arc<SigningClient>,
    gas_price: Option<U256>,
}

impl SignerSubmitter {
    pub fn new(client: Arc<SigningClient>) -> Self {
        Self {
            client,
            gas_price: None,
        }
    }

    /// Pin the gas price, for networks whose config fixes one
    pub fn with_gas_price(mut self, gas_price: Option<U256>) -> Self {
        self.gas_price = gas_price;
        self
    }
}

#[async_trait]
impl TxSubmitter for SignerSubmitter {
    async fn submit(&self, abi: &Abi, call: CallRequest) -> Result<TransactionReceipt, CallError> {
        let data = encode_call(abi, &call.function, &call.args)?;

        let mut tx = TransactionRequest::new().to(call.to).data(data);
        if !call.value.is_zero() {
            tx = tx.value(call.value);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| CallError::Rejected(e.to_string()))?;

        let receipt = pending
            .confirmations(1)
            .await
            .map_err(|e| CallError::Rpc(e.to_string()))?
            .ok_or(CallError::ReceiptMissing)?;

        if receipt.status == Some(U64::zero()) {
            return Err(CallError::Reverted(format!(
                "{:?}",
                receipt.transaction_hash
            )));
        }
        Ok(receipt)
    }
}
