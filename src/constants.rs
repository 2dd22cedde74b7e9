//! Default schedule parameters used by `BlockchainConfig::default`.

/// Target seconds between consecutive blocks.
pub const TARGET_SECONDS_PER_BLOCK: u64 = 600;

/// Blocks between difficulty recalculations.
pub const DIFFICULTY_RECALCULATION_INTERVAL: u64 = 2016;

/// Difficulty required of the first recalculation interval.
pub const INITIAL_DIFFICULTY: u64 = 1;

/// Reward paid by blocks in the first halving interval.
pub const INITIAL_MINING_REWARD: u64 = 100;

/// Blocks between reward halvings.
pub const MINING_REWARD_HALVING_INTERVAL: u64 = 210_000;

/// Bit width of the default difficulty-1 target.
///
/// Header hashes are 256 bits, so a 2^256 target rates every hash at
/// difficulty 1 or better.
pub const DIFFICULTY_1_TARGET_BITS: usize = 256;
