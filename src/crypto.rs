//! Hash and signature oracle.
//!
//! Content hashes are SHA-256 over a canonical byte encoding: fixed-width
//! big-endian integers, 64-bit length prefixes on sequences, and a one-byte
//! tag on outpoint sources. The encoding is an internal detail of hashing;
//! the wire format of chains is JSON (see `serialization`).

use num_bigint::BigUint;
use secp256k1::{All, Message, Secp256k1};
use sha2::{Digest, Sha256};

use crate::types::{
    BlockHash, BlockHeader, CoinbaseHash, CoinbaseTransaction, Hash, MerkleRoot, OutPoint,
    PublicKey, Signature, Transaction, TxHash, TxOut, TxSource,
};

thread_local! {
    /// Verification is stateless; one context per thread avoids rebuilding
    /// it for every signature.
    static SECP256K1: Secp256k1<All> = Secp256k1::new();
}

/// Root of an empty transaction sequence.
pub const EMPTY_TREE_ROOT: MerkleRoot = MerkleRoot([0u8; 32]);

fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

fn encode_tx_out(buf: &mut Vec<u8>, out: &TxOut) {
    buf.extend_from_slice(&out.value.to_be_bytes());
    buf.extend_from_slice(&out.signature_pub_key.serialize());
}

fn encode_tx_outs(buf: &mut Vec<u8>, outs: &[TxOut]) {
    buf.extend_from_slice(&(outs.len() as u64).to_be_bytes());
    for out in outs {
        encode_tx_out(buf, out);
    }
}

fn encode_out_point(buf: &mut Vec<u8>, prevout: &OutPoint) {
    match &prevout.source {
        TxSource::Coinbase(hash) => {
            buf.push(0);
            buf.extend_from_slice(hash.as_bytes());
        }
        TxSource::Transaction(hash) => {
            buf.push(1);
            buf.extend_from_slice(hash.as_bytes());
        }
    }
    buf.extend_from_slice(&prevout.index.to_be_bytes());
}

fn encode_header(header: &BlockHeader) -> Vec<u8> {
    // 3 hashes + 3 words
    let mut buf = Vec::with_capacity(120);
    buf.extend_from_slice(header.prev_block_header_hash.as_bytes());
    buf.extend_from_slice(header.coinbase_transaction_hash.as_bytes());
    buf.extend_from_slice(header.transaction_hash_tree_root.as_bytes());
    buf.extend_from_slice(&header.time.to_be_bytes());
    buf.extend_from_slice(&header.difficulty.to_be_bytes());
    buf.extend_from_slice(&header.nonce.to_be_bytes());
    buf
}

/// Hash addressing a block header.
pub fn hash_block_header(header: &BlockHeader) -> BlockHash {
    BlockHash(sha256(&encode_header(header)))
}

/// Hash addressing a coinbase transaction.
pub fn hash_coinbase(coinbase: &CoinbaseTransaction) -> CoinbaseHash {
    let mut buf = Vec::new();
    encode_tx_outs(&mut buf, coinbase.outputs());
    CoinbaseHash(sha256(&buf))
}

/// Hash addressing an ordinary transaction, signatures included.
pub fn hash_transaction(tx: &Transaction) -> TxHash {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(tx.inputs.len() as u64).to_be_bytes());
    for input in &tx.inputs {
        encode_out_point(&mut buf, &input.prevout);
        buf.extend_from_slice(&input.signature.serialize_compact());
    }
    encode_tx_outs(&mut buf, &tx.outputs);
    TxHash(sha256(&buf))
}

/// Big-endian interpretation of a hash as an unbounded integer.
pub fn hash_to_integer(hash: &Hash) -> BigUint {
    BigUint::from_bytes_be(hash)
}

/// Binary hash tree root over a block's ordinary transactions.
///
/// Levels with an odd node count duplicate their last node; the empty
/// sequence has the fixed sentinel root.
pub fn transaction_merkle_root(transactions: &[Transaction]) -> MerkleRoot {
    if transactions.is_empty() {
        return EMPTY_TREE_ROOT;
    }
    let mut level: Vec<Hash> = transactions
        .iter()
        .map(|tx| hash_transaction(tx).0)
        .collect();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(level[level.len() - 1]);
        }
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(&pair[0]);
            buf[32..].copy_from_slice(&pair[1]);
            next.push(sha256(&buf));
        }
        level = next;
    }
    MerkleRoot(level[0])
}

/// The message every input of a transaction signs: the transaction with its
/// signatures stripped. Covering outpoints and outputs pins both what is
/// spent and where the value goes.
pub fn spend_message_parts<'a, I>(prevouts: I, outputs: &[TxOut]) -> Message
where
    I: IntoIterator<Item = &'a OutPoint>,
{
    let mut buf = Vec::new();
    for prevout in prevouts {
        encode_out_point(&mut buf, prevout);
    }
    encode_tx_outs(&mut buf, outputs);
    Message::from_digest(sha256(&buf))
}

/// The canonical spend message of an assembled transaction.
pub fn spend_message(tx: &Transaction) -> Message {
    spend_message_parts(tx.inputs.iter().map(|input| &input.prevout), &tx.outputs)
}

/// Whether `signature` authorizes `tx` to spend an output bound to
/// `pub_key`.
pub fn verify_spend_signature(signature: &Signature, tx: &Transaction, pub_key: &PublicKey) -> bool {
    let message = spend_message(tx);
    SECP256K1.with(|secp| secp.verify_ecdsa(&message, signature, pub_key).is_ok())
}
