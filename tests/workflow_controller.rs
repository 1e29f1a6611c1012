// The mint-and-list controller must drive its four operations strictly in
// order, validate each receipt before building the next request, and abort
// to idle on any failure.

mod common;

use ethers::abi::Token;
use ethers::types::{Address, U256};

use common::{empty_receipt, receipt_with_record, selectors, MockStore, MockSubmitter};
use evm_dapp::workflow::{CreateNftRequest, NftWorkflow, WorkflowError, WorkflowStage};

fn nft_address() -> Address {
    Address::from_low_u64_be(0x11)
}

fn marketplace_address() -> Address {
    Address::from_low_u64_be(0x22)
}

fn request() -> CreateNftRequest {
    CreateNftRequest {
        asset: vec![0xde, 0xad, 0xbe, 0xef],
        filename: "lion.png".to_string(),
        content_type: "image/png".to_string(),
        name: "Lion".to_string(),
        description: "roars".to_string(),
        price: U256::from(1_000_000_000_000_000u64),
    }
}

#[tokio::test]
async fn happy_path_runs_mint_approve_list_in_order() {
    let selectors = selectors();
    let submitter = MockSubmitter::new(vec![
        receipt_with_record(nft_address(), selectors.transfer, 7),
        receipt_with_record(nft_address(), selectors.approval, 7),
        empty_receipt(),
    ]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    let listed = workflow.run(request()).await.unwrap();

    assert_eq!(listed.token_id, U256::from(7));
    assert_eq!(listed.token_uri, "ipfs://bafymeta");
    assert_eq!(submitter.functions(), vec!["mint", "approve", "makeItem"]);
    // done, settled back to the idle baseline
    assert_eq!(workflow.stage(), WorkflowStage::Upload);
}

#[tokio::test]
async fn token_id_flows_from_the_mint_receipt_into_approve_and_list() {
    let selectors = selectors();
    let submitter = MockSubmitter::new(vec![
        receipt_with_record(nft_address(), selectors.transfer, 7),
        receipt_with_record(nft_address(), selectors.approval, 7),
        empty_receipt(),
    ]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    workflow.run(request()).await.unwrap();

    let calls = submitter.calls();
    // approve(marketplace, tokenId = 7)
    assert_eq!(calls[1].to, nft_address());
    assert_eq!(
        calls[1].args,
        vec![
            Token::Address(marketplace_address()),
            Token::Uint(U256::from(7)),
        ]
    );
    // makeItem(nft, tokenId = 7, price)
    assert_eq!(calls[2].to, marketplace_address());
    assert_eq!(
        calls[2].args,
        vec![
            Token::Address(nft_address()),
            Token::Uint(U256::from(7)),
            Token::Uint(request().price),
        ]
    );
}

#[tokio::test]
async fn missing_transfer_record_halts_before_approve() {
    let submitter = MockSubmitter::new(vec![
        empty_receipt(),
        empty_receipt(),
        empty_receipt(),
    ]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    let err = workflow.run(request()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::TokenIdNotFound));
    // only the mint was issued; no further transactions
    assert_eq!(submitter.functions(), vec!["mint"]);
    assert_eq!(workflow.stage(), WorkflowStage::Upload);
}

#[tokio::test]
async fn unconfirmed_approval_halts_before_list() {
    let selectors = selectors();
    let submitter = MockSubmitter::new(vec![
        receipt_with_record(nft_address(), selectors.transfer, 7),
        // approval record reconfirms a different token
        receipt_with_record(nft_address(), selectors.approval, 8),
        empty_receipt(),
    ]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    let err = workflow.run(request()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::ApprovalNotConfirmed));
    assert_eq!(submitter.functions(), vec!["mint", "approve"]);
}

#[tokio::test]
async fn upload_failure_issues_no_transactions() {
    let submitter = MockSubmitter::new(vec![]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::failing(),
        nft_address(),
        marketplace_address(),
    );

    let err = workflow.run(request()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Upload(_)));
    assert!(submitter.calls().is_empty());
    assert_eq!(workflow.stage(), WorkflowStage::Upload);
}

#[tokio::test]
async fn a_dropped_mint_transaction_names_the_failed_stage() {
    // no canned receipts: the first submission fails
    let submitter = MockSubmitter::new(vec![]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    let err = workflow.run(request()).await.unwrap_err();

    match err {
        WorkflowError::Transaction { stage, .. } => assert_eq!(stage, WorkflowStage::Mint),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(submitter.functions(), vec!["mint"]);
}

#[tokio::test]
async fn records_from_a_foreign_contract_do_not_satisfy_the_mint_check() {
    let selectors = selectors();
    let stranger = Address::from_low_u64_be(0x99);
    let submitter = MockSubmitter::new(vec![
        receipt_with_record(stranger, selectors.transfer, 7),
        empty_receipt(),
    ]);
    let mut workflow = NftWorkflow::new(
        submitter.clone(),
        MockStore::new(),
        nft_address(),
        marketplace_address(),
    );

    let err = workflow.run(request()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::TokenIdNotFound));
    assert_eq!(submitter.functions(), vec!["mint"]);
}
