//! Per-block consensus checks.

use num_bigint::BigUint;

use crate::config::BlockchainConfig;
use crate::crypto::{hash_coinbase, transaction_merkle_root};
use crate::economic::{block_reward, coinbase_value};
use crate::error::{BlockError, ValidationError};
use crate::pow::{block_header_hash_difficulty, target_difficulty};
use crate::types::Block;
use crate::utxo::UtxoSet;

/// Validates `block` as the next block after `ancestors` (the chain from
/// genesis to the intended parent, in order; empty for the genesis block
/// itself).
///
/// Checks, in order: the header's difficulty matches the schedule, the
/// header hash meets that difficulty, the header's coinbase and
/// transaction-tree references are honest, the coinbase pays exactly the
/// scheduled reward, the timestamp advances past the parent, and every
/// ordinary transaction applies to the ancestor UTXO set extended with this
/// block's own coinbase.
pub fn check_block(
    config: &BlockchainConfig,
    block: &Block,
    ancestors: &[&Block],
) -> Result<(), BlockError> {
    if block.header.difficulty != target_difficulty(config, ancestors) {
        return Err(BlockError::InvalidDifficultyReference);
    }
    if block_header_hash_difficulty(&config.difficulty1_target, &block.header)
        < BigUint::from(block.header.difficulty)
    {
        return Err(BlockError::InvalidDifficulty);
    }
    if hash_coinbase(&block.coinbase) != block.header.coinbase_transaction_hash {
        return Err(BlockError::InvalidCoinbaseTransactionHash);
    }
    if transaction_merkle_root(&block.transactions) != block.header.transaction_hash_tree_root {
        return Err(BlockError::InvalidTransactionHashTreeRoot);
    }

    // The reward must be matched exactly: input value not re-spent by a
    // transaction is burned, never collected by the miner.
    let height = ancestors.len() as u64 + 1;
    if coinbase_value(&block.coinbase) != u128::from(block_reward(config, height)) {
        return Err(BlockError::InvalidCoinbaseTransactionValue);
    }

    if let Some(parent) = ancestors.last() {
        if block.header.time <= parent.header.time {
            return Err(BlockError::TimestampTooOld);
        }
    }
    // TODO: bound the timestamp against wall time once a clock source is
    // threaded through the validator (TimestampTooFarIntoFuture).

    let mut utxo = UtxoSet::accumulate(ancestors.iter().copied());
    utxo.credit_coinbase(&block.coinbase);
    for tx in &block.transactions {
        utxo.apply_transaction(tx)?;
    }
    Ok(())
}

/// Validates a genesis block: it must carry no ordinary transactions and
/// must satisfy every per-block rule with an empty ancestor chain.
pub fn check_genesis_block(config: &BlockchainConfig, block: &Block) -> Result<(), ValidationError> {
    if !block.transactions.is_empty() {
        return Err(ValidationError::GenesisBlockHasTransactions);
    }
    check_block(config, block, &[]).map_err(ValidationError::BlockValidation)
}
