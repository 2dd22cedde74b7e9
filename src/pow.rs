//! Difficulty schedule and proof of work.

use num_bigint::BigUint;

use crate::config::BlockchainConfig;
use crate::crypto::{hash_block_header, hash_to_integer};
use crate::types::{Block, BlockHeader};

/// Difficulty required of the block extending `prior_blocks`.
///
/// The first interval runs at the configured initial difficulty. At every
/// recalculation boundary the previous difficulty is scaled by how far the
/// last interval's wall time missed the schedule, using integer arithmetic
/// only; between boundaries the previous block's difficulty carries over.
pub fn target_difficulty(config: &BlockchainConfig, prior_blocks: &[&Block]) -> u64 {
    if prior_blocks.is_empty() {
        return config.initial_difficulty;
    }

    let n = prior_blocks.len() as u64;
    let k = config.difficulty_recalculation_interval;
    debug_assert!(k > 0, "recalculation interval must be positive");

    let previous = prior_blocks[prior_blocks.len() - 1].header.difficulty;
    if n % k != 0 {
        return previous;
    }

    let window = &prior_blocks[(n - k) as usize..];
    let elapsed = window[window.len() - 1]
        .header
        .time
        .saturating_sub(window[0].header.time)
        .max(1);
    let expected = u128::from(k) * u128::from(config.target_seconds_per_block);

    let retargeted = u128::from(previous)
        .saturating_mul(expected)
        .checked_div(u128::from(elapsed))
        .unwrap_or(u128::MAX);
    retargeted.clamp(1, u128::from(u64::MAX)) as u64
}

/// The difficulty a header's hash actually achieves:
/// `difficulty1_target / hash`, as an unbounded integer.
pub fn block_header_hash_difficulty(
    difficulty1_target: &BigUint,
    header: &BlockHeader,
) -> BigUint {
    let hash_value = hash_to_integer(hash_block_header(header).as_bytes());
    if hash_value.bits() == 0 {
        // An all-zero hash meets any target.
        return difficulty1_target.clone();
    }
    difficulty1_target / hash_value
}

/// Whether a header's hash meets the difficulty the header claims.
pub fn check_proof_of_work(config: &BlockchainConfig, header: &BlockHeader) -> bool {
    block_header_hash_difficulty(&config.difficulty1_target, header)
        >= BigUint::from(header.difficulty)
}
