//! Shared fixtures for the integration suites.
//!
//! Block sealing (nonce search) lives here, not in the library: the core
//! validates proof of work but never performs the search.

// Each suite links its own copy of this module and uses a subset of it.
#![allow(dead_code)]

use arborchain::crypto::{
    hash_block_header, hash_coinbase, spend_message_parts, transaction_merkle_root,
};
use arborchain::pow::{check_proof_of_work, target_difficulty};
use arborchain::{
    Block, BlockHash, BlockHeader, Blockchain, BlockchainConfig, BlockchainNode,
    CoinbaseTransaction, OutPoint, PublicKey, Transaction, TxIn, TxOut, TxSource, Verified,
};
use num_bigint::BigUint;
use secp256k1::{Secp256k1, SecretKey};

/// Deterministic keypair; any small non-zero seed is a valid secret scalar.
pub fn keypair(seed: u8) -> (SecretKey, PublicKey) {
    let secret = SecretKey::from_slice(&[seed; 32]).expect("static test key");
    let secp = Secp256k1::new();
    (secret, PublicKey::from_secret_key(&secp, &secret))
}

/// A config whose schedule stays flat across these suites: difficulty 4
/// everywhere (the intervals are far larger than any test chain), reward
/// 100, and a full-width difficulty-1 target so mining takes ~4 attempts.
pub fn test_config() -> BlockchainConfig {
    BlockchainConfig {
        initial_difficulty: 4,
        difficulty1_target: BigUint::from(1u8) << 256,
        target_seconds_per_block: 600,
        difficulty_recalculation_interval: 1_000_000,
        initial_mining_reward: 100,
        mining_reward_halving_interval: 1_000_000,
    }
}

pub fn coinbase_paying(outs: &[(PublicKey, u64)]) -> CoinbaseTransaction {
    CoinbaseTransaction(
        outs.iter()
            .map(|&(signature_pub_key, value)| TxOut {
                value,
                signature_pub_key,
            })
            .collect(),
    )
}

/// Assembles a transaction spending `ins`, signing every input with its key.
pub fn signed_transaction(
    ins: &[(OutPoint, &SecretKey)],
    outs: &[(PublicKey, u64)],
) -> Transaction {
    let outputs: Vec<TxOut> = outs
        .iter()
        .map(|&(signature_pub_key, value)| TxOut {
            value,
            signature_pub_key,
        })
        .collect();
    let message = spend_message_parts(ins.iter().map(|(prevout, _)| prevout), &outputs);
    let secp = Secp256k1::new();
    let inputs = ins
        .iter()
        .map(|&(prevout, secret)| TxIn {
            prevout,
            signature: secp.sign_ecdsa(&message, secret),
        })
        .collect();
    Transaction { inputs, outputs }
}

/// Coordinate of a coinbase output.
pub fn coinbase_prevout(coinbase: &CoinbaseTransaction, index: u64) -> OutPoint {
    OutPoint {
        source: TxSource::Coinbase(hash_coinbase(coinbase)),
        index,
    }
}

/// Builds the block extending `ancestors`: derives the header references
/// and the scheduled difficulty, then searches nonces until the header
/// meets it.
pub fn seal_block(
    config: &BlockchainConfig,
    ancestors: &[&Block],
    time: u64,
    coinbase: CoinbaseTransaction,
    transactions: Vec<Transaction>,
) -> Block {
    let prev_block_header_hash = match ancestors.last() {
        Some(parent) => hash_block_header(&parent.header),
        None => BlockHash([0; 32]),
    };
    let mut header = BlockHeader {
        prev_block_header_hash,
        coinbase_transaction_hash: hash_coinbase(&coinbase),
        transaction_hash_tree_root: transaction_merkle_root(&transactions),
        time,
        difficulty: target_difficulty(config, ancestors),
        nonce: 0,
    };
    while !check_proof_of_work(config, &header) {
        header.nonce += 1;
    }
    Block {
        header,
        coinbase,
        transactions,
    }
}

/// Smallest nonce whose header misses its difficulty target, for negative
/// proof-of-work cases.
pub fn failing_nonce(config: &BlockchainConfig, block: &Block) -> u64 {
    let mut header = block.header.clone();
    for nonce in 0.. {
        header.nonce = nonce;
        if !check_proof_of_work(config, &header) {
            return nonce;
        }
    }
    unreachable!("some nonce must miss a difficulty-4 target")
}

/// A verified genesis-only chain whose coinbase pays 100 to the first key;
/// returns the config, the chain, and two keypairs.
#[allow(clippy::type_complexity)]
pub fn genesis_chain() -> (
    BlockchainConfig,
    Blockchain<Verified>,
    (SecretKey, PublicKey),
    (SecretKey, PublicKey),
) {
    let config = test_config();
    let k1 = keypair(1);
    let k2 = keypair(2);
    let genesis = seal_block(&config, &[], 1_000, coinbase_paying(&[(k1.1, 100)]), vec![]);
    let chain = Blockchain::new(config.clone(), BlockchainNode::leaf(genesis))
        .verify()
        .expect("genesis fixture must validate");
    (config, chain, k1, k2)
}
