//! Error types for block insertion and whole-chain validation.
//!
//! Every variant reports a protocol rejection; none is retried. Violations
//! of internal data-structure invariants (a block matching two parents, a
//! tracked output vanishing mid-spend) are not represented here; they
//! abort the process with a diagnostic.

use thiserror::Error;

/// Rejection of a single block or transaction.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum BlockError {
    #[error("an equal block already extends this parent")]
    BlockAlreadyExists,

    #[error("no block in the tree matches the previous-header reference")]
    NoParentFound,

    #[error("block timestamp does not advance past its parent")]
    TimestampTooOld,

    /// Reserved: produced once a clock source is threaded through the
    /// validator.
    #[error("block timestamp is too far into the future")]
    TimestampTooFarIntoFuture,

    #[error("header difficulty does not match the scheduled target")]
    InvalidDifficultyReference,

    #[error("header hash does not meet its stated difficulty")]
    InvalidDifficulty,

    #[error("coinbase transaction does not match the header hash")]
    InvalidCoinbaseTransactionHash,

    #[error("transaction tree root does not match the header")]
    InvalidTransactionHashTreeRoot,

    #[error("coinbase value does not equal the scheduled reward")]
    InvalidCoinbaseTransactionValue,

    #[error("transaction outputs exceed the value of its inputs")]
    InvalidTransactionValues,

    #[error("transaction input references an output that is not unspent")]
    TransactionOutRefNotFound,

    #[error("transaction signature does not authorize the spend")]
    InvalidTransactionSignature,
}

/// Rejection of an untrusted chain by the validation gate.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("genesis block carries ordinary transactions")]
    GenesisBlockHasTransactions,

    /// Reserved wrapper for rejections specific to the genesis position.
    #[error("genesis block rejected: {0}")]
    GenesisBlock(BlockError),

    #[error("block rejected during chain validation: {0}")]
    BlockValidation(BlockError),
}
