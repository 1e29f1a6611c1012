// Minimal ABIs for the deployed contract groups
//
// Function names here are the deployed contracts' wire identifiers and must
// match them exactly. Event selectors are parameterized (see
// `EventSelectors`) because they are stable but easily mistyped; nothing
// outside this module spells out a selector hash.

use ethers::abi::{parse_abi, Abi};
use ethers::types::H256;
use ethers::utils::keccak256;

/// ERC-20 surface shared by the stake and reward tokens, plus the test
/// faucet mint
pub fn erc20() -> Abi {
    parse_abi(&[
        "function transfer(address to, uint256 amount) returns (bool)",
        "function approve(address spender, uint256 amount) returns (bool)",
        "function balanceOf(address account) view returns (uint256)",
        "function mint(address to, uint256 amount)",
        "function owner() view returns (address)",
    ])
    .expect("static erc20 abi")
}

/// MasterChefToken
pub fn chef() -> Abi {
    parse_abi(&[
        "function stakeTokens(uint256 amount)",
        "function unstakeTokens()",
        "function issueTokens()",
        "function stakingBalance(address account) view returns (uint256)",
        "function isStaking(address account) view returns (bool)",
        "function owner() view returns (address)",
    ])
    .expect("static chef abi")
}

/// Lottery
pub fn lottery() -> Abi {
    parse_abi(&[
        "function compraTokens(uint256 numTokens) payable",
        "function devolverTokens(uint256 numTokens)",
        "function compraBoleto(uint256 numBoletos)",
        "function generarGanador()",
        "function balanceTokens(address account) view returns (uint256)",
        "function balanceTokensSC() view returns (uint256)",
        "function balanceEthersSC() view returns (uint256)",
        "function nft() view returns (address)",
        "function owner() view returns (address)",
    ])
    .expect("static lottery abi")
}

/// Marketplace NFT collection
pub fn nft() -> Abi {
    parse_abi(&[
        "function mint(string tokenURI) returns (uint256)",
        "function approve(address to, uint256 tokenId)",
        "function tokenURI(uint256 tokenId) view returns (string)",
        "function ownerOf(uint256 tokenId) view returns (address)",
    ])
    .expect("static nft abi")
}

/// Marketplace
pub fn marketplace() -> Abi {
    parse_abi(&[
        "function makeItem(address nft, uint256 tokenId, uint256 price)",
        "function purchaseItem(uint256 itemId) payable",
        "function items(uint256 itemId) view returns (uint256, address, uint256, uint256, address, bool)",
        "function getTotalPrice(uint256 itemId) view returns (uint256)",
        "function itemCount() view returns (uint256)",
        "function feePercent() view returns (uint256)",
    ])
    .expect("static marketplace abi")
}

/// Event selectors used to validate receipts in the mint-and-list workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSelectors {
    /// ERC-721 Transfer(address,address,uint256) topic0
    pub transfer: H256,

    /// ERC-721 Approval(address,address,uint256) topic0
    pub approval: H256,
}

impl Default for EventSelectors {
    fn default() -> Self {
        Self {
            transfer: H256::from(keccak256("Transfer(address,address,uint256)")),
            approval: H256::from(keccak256("Approval(address,address,uint256)")),
        }
    }
}
