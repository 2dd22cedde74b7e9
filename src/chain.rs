//! The branching blockchain: a rose tree of blocks rooted at genesis,
//! tagged by validation state.
//!
//! A chain enters the system as `Blockchain<Unverified>`, built directly
//! from parts or decoded from JSON, and must pass [`verify`] before it can
//! be queried or extended. `Blockchain<Verified>` is the only state that
//! exposes consensus queries and [`add_block`]; the tag is phantom, so the
//! distinction costs nothing at runtime and cannot be bypassed without
//! going back through the gate.
//!
//! [`verify`]: Blockchain::<Unverified>::verify
//! [`add_block`]: Blockchain::<Verified>::add_block

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use crate::block::{check_block, check_genesis_block};
use crate::config::BlockchainConfig;
use crate::crypto::{hash_block_header, hash_coinbase, hash_transaction};
use crate::error::{BlockError, ValidationError};
use crate::types::{Block, BlockchainNode, OutPoint, PublicKey, Transaction, TxOut, TxSource};
use crate::utxo::UtxoSet;

/// Marker for chains built from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unverified;

/// Marker for chains known to satisfy every consensus rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified;

/// A block tree plus the parameters it is validated under.
///
/// Every "mutation" returns a new value; the type has no interior
/// mutability and is freely shareable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Blockchain<State> {
    config: BlockchainConfig,
    root: BlockchainNode,
    state: PhantomData<State>,
}

impl<State> Blockchain<State> {
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    pub fn root(&self) -> &BlockchainNode {
        &self.root
    }

    /// Number of blocks in the whole tree, forks included.
    pub fn block_count(&self) -> usize {
        self.root.count()
    }
}

impl Blockchain<Unverified> {
    /// Wraps untrusted parts into a chain. Total: nothing is checked until
    /// [`verify`](Self::verify).
    pub fn new(config: BlockchainConfig, root: BlockchainNode) -> Self {
        Blockchain {
            config,
            root,
            state: PhantomData,
        }
    }

    /// The validation gate: checks the genesis block, then replays every
    /// descendant through the insertion path.
    ///
    /// Descendants are replayed in pre-order, but insertion finds each
    /// block's unique parent by hash, so the result is structurally the
    /// input tree, up to the documented newest-child-first sibling order.
    pub fn verify(self) -> Result<Blockchain<Verified>, ValidationError> {
        check_genesis_block(&self.config, &self.root.block)?;

        let Blockchain { config, root, .. } = self;
        let BlockchainNode {
            block: genesis,
            children,
        } = root;

        let mut chain = Blockchain {
            config,
            root: BlockchainNode::leaf(genesis),
            state: PhantomData,
        };
        for block in preorder(&children) {
            chain = chain
                .add_block(block)
                .map_err(ValidationError::BlockValidation)?;
        }
        Ok(chain)
    }
}

impl Blockchain<Verified> {
    /// Forgets the validation evidence; the structure is unchanged. Used to
    /// hand a chain back to codecs and other Unverified consumers.
    pub fn unverify(self) -> Blockchain<Unverified> {
        Blockchain {
            config: self.config,
            root: self.root,
            state: PhantomData,
        }
    }

    /// Inserts `block` under the unique node whose header hash the block
    /// names as its parent.
    ///
    /// Returns the extended chain, or: [`BlockError::NoParentFound`] when no
    /// node matches, [`BlockError::BlockAlreadyExists`] when an equal block
    /// already extends the parent, or the first consensus rejection raised
    /// at the parent position. The new block becomes the first child of its
    /// parent.
    pub fn add_block(&self, block: &Block) -> Result<Self, BlockError> {
        let mut ancestors = Vec::new();
        let root = splice(&self.root, &self.config, block, &mut ancestors)?;
        debug_assert!(ancestors.is_empty());
        Ok(Blockchain {
            config: self.config.clone(),
            root,
            state: PhantomData,
        })
    }

    /// Every root-to-leaf path, in pre-order.
    pub fn flatten(&self) -> Vec<Vec<&Block>> {
        paths(&self.root)
    }

    /// The best chain: longest path, cumulative difficulty breaking length
    /// ties, earliest flatten position breaking the rest.
    pub fn longest_chain(&self) -> Vec<&Block> {
        let mut best: Option<(usize, u128, Vec<&Block>)> = None;
        for path in self.flatten() {
            let length = path.len();
            let work: u128 = path
                .iter()
                .map(|block| u128::from(block.header.difficulty))
                .sum();
            let better = match &best {
                None => true,
                Some((best_length, best_work, _)) => (length, work) > (*best_length, *best_work),
            };
            if better {
                best = Some((length, work, path));
            }
        }
        match best {
            Some((_, _, path)) => path,
            None => vec![&self.root.block],
        }
    }

    /// Height of the best chain (the genesis block sits at height 1).
    pub fn height(&self) -> usize {
        self.longest_chain().len()
    }

    /// Last block of the best chain.
    pub fn tip(&self) -> &Block {
        match self.longest_chain().pop() {
            Some(block) => block,
            None => &self.root.block,
        }
    }

    /// Unspent outputs along the best chain, grouped by spending key.
    /// Within each group, outputs keep the order they were produced in.
    pub fn unspent_transaction_outputs(&self) -> HashMap<PublicKey, Vec<(OutPoint, TxOut)>> {
        let path = self.longest_chain();
        let utxo = UtxoSet::accumulate(path.iter().copied());

        let mut grouped: HashMap<PublicKey, Vec<(OutPoint, TxOut)>> = HashMap::new();
        let mut emitted: HashSet<OutPoint> = HashSet::new();
        let mut emit = |prevout: OutPoint| {
            if let Some(out) = utxo.get(&prevout) {
                if emitted.insert(prevout) {
                    grouped
                        .entry(out.signature_pub_key)
                        .or_default()
                        .push((prevout, out.clone()));
                }
            }
        };

        // Replaying production order keeps each group ordered without an
        // order-aware map.
        for block in &path {
            let coinbase_hash = hash_coinbase(&block.coinbase);
            for index in 0..block.coinbase.outputs().len() {
                emit(OutPoint {
                    source: TxSource::Coinbase(coinbase_hash),
                    index: index as u64,
                });
            }
            for tx in &block.transactions {
                let tx_hash = hash_transaction(tx);
                for index in 0..tx.outputs.len() {
                    emit(OutPoint {
                        source: TxSource::Transaction(tx_hash),
                        index: index as u64,
                    });
                }
            }
        }
        grouped
    }

    /// Total unspent value per spending key along the best chain.
    pub fn address_values(&self) -> HashMap<PublicKey, u64> {
        self.unspent_transaction_outputs()
            .into_iter()
            .map(|(key, outputs)| (key, outputs.iter().map(|(_, out)| out.value).sum()))
            .collect()
    }

    /// Checks that `tx` could be applied on top of the best chain.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), BlockError> {
        self.validate_transactions(std::slice::from_ref(tx))
    }

    /// Checks that `txs`, applied in order, could extend the best chain.
    pub fn validate_transactions(&self, txs: &[Transaction]) -> Result<(), BlockError> {
        let path = self.longest_chain();
        let mut utxo = UtxoSet::accumulate(path.iter().copied());
        for tx in txs {
            utxo.apply_transaction(tx)?;
        }
        Ok(())
    }
}

/// Pre-order block enumeration of a subtree forest.
fn preorder(forest: &[BlockchainNode]) -> Vec<&Block> {
    let mut blocks = Vec::new();
    fn walk<'t>(node: &'t BlockchainNode, blocks: &mut Vec<&'t Block>) {
        blocks.push(&node.block);
        for child in &node.children {
            walk(child, blocks);
        }
    }
    for node in forest {
        walk(node, &mut blocks);
    }
    blocks
}

/// Every root-to-leaf path through `node`, children visited in order.
fn paths(node: &BlockchainNode) -> Vec<Vec<&Block>> {
    if node.children.is_empty() {
        return vec![vec![&node.block]];
    }
    let mut collected = Vec::new();
    for child in &node.children {
        for mut tail in paths(child) {
            let mut path = Vec::with_capacity(tail.len() + 1);
            path.push(&node.block);
            path.append(&mut tail);
            collected.push(path);
        }
    }
    collected
}

/// Parent search and splice.
///
/// Rewrites the subtree at `node` with `block` inserted under its parent,
/// or reports `NoParentFound` when the parent is not in this subtree, or
/// the rejection raised at the unique parent position. `ancestors` holds
/// the chain from genesis to `node`'s parent and is restored before
/// returning.
///
/// At most one node anywhere in the tree can match the block's parent
/// reference, because header hashes are unique under a collision-resistant
/// oracle. The result reduction leans on that: more than one accepting
/// subtree, or more than one rejecting one, is unrecoverable.
fn splice<'t>(
    node: &'t BlockchainNode,
    config: &BlockchainConfig,
    block: &Block,
    ancestors: &mut Vec<&'t Block>,
) -> Result<BlockchainNode, BlockError> {
    if hash_block_header(&node.block.header) == block.header.prev_block_header_hash {
        if node.children.iter().any(|child| child.block == *block) {
            return Err(BlockError::BlockAlreadyExists);
        }
        ancestors.push(&node.block);
        let checked = check_block(config, block, ancestors);
        ancestors.pop();
        checked?;

        let mut children = Vec::with_capacity(node.children.len() + 1);
        children.push(BlockchainNode::leaf(block.clone()));
        children.extend(node.children.iter().cloned());
        return Ok(BlockchainNode {
            block: node.block.clone(),
            children,
        });
    }

    ancestors.push(&node.block);
    let outcomes: Vec<Result<BlockchainNode, BlockError>> = node
        .children
        .iter()
        .map(|child| splice(child, config, block, ancestors))
        .collect();
    ancestors.pop();

    let mut accepted: Option<(usize, BlockchainNode)> = None;
    let mut rejected: Option<BlockError> = None;
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(subtree) => {
                if accepted.replace((index, subtree)).is_some() {
                    panic!("block matched more than one parent; the hash oracle is broken");
                }
            }
            Err(BlockError::NoParentFound) => {}
            Err(err) => {
                if rejected.replace(err).is_some() {
                    panic!("block was rejected at more than one position; the hash oracle is broken");
                }
            }
        }
    }

    match (accepted, rejected) {
        (Some((index, subtree)), None) => {
            let mut children = node.children.clone();
            children[index] = subtree;
            Ok(BlockchainNode {
                block: node.block.clone(),
                children,
            })
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err(BlockError::NoParentFound),
        (Some(_), Some(_)) => {
            panic!("block both spliced and rejected; the hash oracle is broken")
        }
    }
}
