//! # arborchain
//!
//! Core data structures and validation for a small cryptocurrency-style
//! ledger: an immutable branching tree of blocks rooted at a genesis block,
//! strict per-block consensus rules, unspent-output tracking, and selection
//! of the best chain by length then cumulative difficulty.
//!
//! ## Design principles
//!
//! 1. **Pure functions**: every operation is deterministic and
//!    side-effect-free; "updates" return new values sharing nothing mutable.
//! 2. **Typed validation states**: chains decoded or built from untrusted
//!    input are [`Blockchain<Unverified>`]; only the validation gate turns
//!    them into [`Blockchain<Verified>`], the sole state exposing consensus
//!    queries and insertion.
//! 3. **Explicit rejections**: every protocol violation is a value of
//!    [`BlockError`] or [`ValidationError`]; internal invariant violations
//!    abort with a diagnostic instead of masquerading as rejections.
//!
//! ## Usage
//!
//! ```no_run
//! use arborchain::{decode, encode};
//!
//! let chain = decode(r#"…a chain document…"#)?.verify()?;
//! let balances = chain.address_values();
//! let document = encode(&chain)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod economic;
pub mod error;
pub mod pow;
pub mod serialization;
pub mod types;
pub mod utxo;

pub use chain::{Blockchain, Unverified, Verified};
pub use config::BlockchainConfig;
pub use error::{BlockError, ValidationError};
pub use serialization::{decode, encode};
pub use types::{
    Block, BlockHash, BlockHeader, BlockchainNode, CoinbaseHash, CoinbaseTransaction, Hash,
    MerkleRoot, OutPoint, PublicKey, Signature, Transaction, TxHash, TxIn, TxOut, TxSource,
};
pub use utxo::UtxoSet;
