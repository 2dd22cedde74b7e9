//! Core data model: hashes, keys, outputs, transactions, blocks, and the
//! branching block tree.

use serde::{Deserialize, Serialize};

pub use secp256k1::{ecdsa::Signature, PublicKey};

/// Content hash: SHA-256 over the canonical byte encoding of a value.
pub type Hash = [u8; 32];

/// Declares a kind-typed hash wrapper.
///
/// Hashes address different kinds of values (headers, coinbases, ordinary
/// transactions) and must not be mixed up. `#[repr(transparent)]` keeps the
/// wrappers layout-identical to the raw hash.
macro_rules! hash_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(#[serde(with = "hex::serde")] pub Hash);

        impl $name {
            #[inline]
            pub fn as_bytes(&self) -> &Hash {
                &self.0
            }
        }

        impl From<Hash> for $name {
            #[inline]
            fn from(hash: Hash) -> Self {
                $name(hash)
            }
        }
    };
}

hash_newtype!(
    /// Hash of a canonically encoded block header.
    BlockHash
);
hash_newtype!(
    /// Hash of a canonically encoded coinbase transaction.
    CoinbaseHash
);
hash_newtype!(
    /// Hash of a canonically encoded ordinary transaction.
    TxHash
);
hash_newtype!(
    /// Root of the binary hash tree over a block's ordinary transactions.
    MerkleRoot
);

/// A spendable amount bound to the public key allowed to spend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOut {
    pub value: u64,
    pub signature_pub_key: PublicKey,
}

/// Which kind of transaction produced an output.
///
/// Coinbase-sourced and transaction-sourced outputs live in distinct key
/// spaces: equality and hashing include the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxSource {
    Coinbase(CoinbaseHash),
    Transaction(TxHash),
}

/// Coordinate of a single transaction output: producing hash plus position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub source: TxSource,
    pub index: u64,
}

/// Spend of one previously produced output, authorized by a signature over
/// the spending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub signature: Signature,
}

/// An ordinary value transfer. Inputs and outputs are non-empty by protocol
/// rule; input order is free, output order fixes each output's coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
}

/// The block-reward transaction: no inputs, one or more outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinbaseTransaction(pub Vec<TxOut>);

impl CoinbaseTransaction {
    #[inline]
    pub fn outputs(&self) -> &[TxOut] {
        &self.0
    }
}

/// Block header. The three hashes pin the parent header, the coinbase
/// transaction, and the ordinary-transaction tree respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub prev_block_header_hash: BlockHash,
    pub coinbase_transaction_hash: CoinbaseHash,
    pub transaction_hash_tree_root: MerkleRoot,
    pub time: u64,
    pub difficulty: u64,
    pub nonce: u64,
}

/// Header, coinbase, and ordinary transactions.
///
/// Transaction order is significant: a transaction spending an output
/// produced earlier in the same block must come after its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(rename = "coinbaseTransaction")]
    pub coinbase: CoinbaseTransaction,
    pub transactions: Vec<Transaction>,
}

/// Node of the branching block tree: a block plus the subtrees extending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainNode {
    pub block: Block,
    #[serde(rename = "nodes")]
    pub children: Vec<BlockchainNode>,
}

impl BlockchainNode {
    /// A node with no descendants.
    pub fn leaf(block: Block) -> Self {
        BlockchainNode {
            block,
            children: Vec::new(),
        }
    }

    /// Number of blocks in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(BlockchainNode::count).sum::<usize>()
    }
}
