//! Chain parameters.
//!
//! `BlockchainConfig` is an immutable input to validation: it fixes the
//! difficulty retargeting schedule and the mining-reward schedule. It is
//! carried inside every chain value and serialized with it.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DIFFICULTY_1_TARGET_BITS, DIFFICULTY_RECALCULATION_INTERVAL, INITIAL_DIFFICULTY,
    INITIAL_MINING_REWARD, MINING_REWARD_HALVING_INTERVAL, TARGET_SECONDS_PER_BLOCK,
};

/// Consensus parameters of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainConfig {
    /// Difficulty required until the first recalculation boundary.
    pub initial_difficulty: u64,

    /// The difficulty-1 target: a header meets difficulty `d` when
    /// `difficulty1_target / hash` is at least `d`. Wider than any machine
    /// word, so it is held as an unbounded integer and serialized as a
    /// decimal string.
    #[serde(with = "biguint_decimal")]
    pub difficulty1_target: BigUint,

    /// Seconds each block is expected to take to mine.
    pub target_seconds_per_block: u64,

    /// Blocks between difficulty recalculations.
    pub difficulty_recalculation_interval: u64,

    /// Reward paid by blocks in the first halving interval.
    pub initial_mining_reward: u64,

    /// Blocks between reward halvings.
    pub mining_reward_halving_interval: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        BlockchainConfig {
            initial_difficulty: INITIAL_DIFFICULTY,
            difficulty1_target: BigUint::from(1u8) << DIFFICULTY_1_TARGET_BITS,
            target_seconds_per_block: TARGET_SECONDS_PER_BLOCK,
            difficulty_recalculation_interval: DIFFICULTY_RECALCULATION_INTERVAL,
            initial_mining_reward: INITIAL_MINING_REWARD,
            mining_reward_halving_interval: MINING_REWARD_HALVING_INTERVAL,
        }
    }
}

/// Decimal-string serde for unbounded integers. JSON numbers cannot carry a
/// 256-bit target exactly.
mod biguint_decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let digits = String::deserialize(deserializer)?;
        digits.parse().map_err(de::Error::custom)
    }
}
