//! Mining-reward schedule.

use crate::config::BlockchainConfig;
use crate::types::CoinbaseTransaction;

/// Reward owed to the coinbase of the block at `height` (the genesis block
/// sits at height 1).
///
/// The initial reward halves every `mining_reward_halving_interval` blocks
/// and reaches zero once the halving count exhausts the word width.
pub fn block_reward(config: &BlockchainConfig, height: u64) -> u64 {
    debug_assert!(
        config.mining_reward_halving_interval > 0,
        "halving interval must be positive"
    );
    let halvings = height / config.mining_reward_halving_interval;
    if halvings >= u64::BITS as u64 {
        return 0;
    }
    config.initial_mining_reward >> halvings
}

/// Total value paid out by a coinbase transaction. Summed in a wider word so
/// adversarial output values cannot wrap.
pub fn coinbase_value(coinbase: &CoinbaseTransaction) -> u128 {
    coinbase
        .outputs()
        .iter()
        .map(|out| u128::from(out.value))
        .sum()
}
