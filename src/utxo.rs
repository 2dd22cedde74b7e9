//! Unspent-transaction-output tracking along a linear chain.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::crypto::{hash_coinbase, hash_transaction, verify_spend_signature};
use crate::error::BlockError;
use crate::types::{Block, CoinbaseTransaction, OutPoint, Transaction, TxOut, TxSource};

/// The outputs not yet referenced by any input, keyed by their producing
/// coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtxoSet {
    map: HashMap<OutPoint, TxOut>,
}

impl UtxoSet {
    pub fn new() -> Self {
        UtxoSet::default()
    }

    /// Folds a linear block sequence into its UTXO set.
    ///
    /// The caller vouches for the sequence: it must be (a prefix of) an
    /// already-validated chain, so a transaction failing to apply here is a
    /// bug, not an input error.
    pub fn accumulate<'a, I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let mut utxo = UtxoSet::new();
        for block in blocks {
            utxo.credit_coinbase(&block.coinbase);
            for tx in &block.transactions {
                if let Err(err) = utxo.apply_transaction(tx) {
                    panic!("transaction in a validated chain failed to apply: {err}");
                }
            }
        }
        utxo
    }

    /// Credits every output of a coinbase transaction.
    ///
    /// A colliding coordinate can only come from a duplicated coinbase in
    /// structurally odd input; the entry is merged by summing values under
    /// the resident key rather than clobbered.
    pub fn credit_coinbase(&mut self, coinbase: &CoinbaseTransaction) {
        let coinbase_hash = hash_coinbase(coinbase);
        for (index, out) in coinbase.outputs().iter().enumerate() {
            let prevout = OutPoint {
                source: TxSource::Coinbase(coinbase_hash),
                index: index as u64,
            };
            match self.map.entry(prevout) {
                Entry::Occupied(mut resident) => {
                    resident.get_mut().value += out.value;
                }
                Entry::Vacant(slot) => {
                    slot.insert(out.clone());
                }
            }
        }
    }

    /// Applies one ordinary transaction, transactionally: every input must
    /// resolve to an unspent output, every signature must authorize the
    /// spend, and the outputs must not exceed the inputs, before any entry
    /// is touched. Input value not re-spent by an output is burned.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<(), BlockError> {
        let mut input_total: u128 = 0;
        for input in &tx.inputs {
            let funding = self
                .map
                .get(&input.prevout)
                .ok_or(BlockError::TransactionOutRefNotFound)?;
            if !verify_spend_signature(&input.signature, tx, &funding.signature_pub_key) {
                return Err(BlockError::InvalidTransactionSignature);
            }
            input_total += u128::from(funding.value);
        }

        let output_total: u128 = tx.outputs.iter().map(|out| u128::from(out.value)).sum();
        if input_total < output_total {
            return Err(BlockError::InvalidTransactionValues);
        }

        for input in &tx.inputs {
            let spent = self.map.remove(&input.prevout);
            assert!(
                spent.is_some(),
                "spent an output that was never tracked: {:?}",
                input.prevout
            );
        }
        let tx_hash = hash_transaction(tx);
        for (index, out) in tx.outputs.iter().enumerate() {
            let prevout = OutPoint {
                source: TxSource::Transaction(tx_hash),
                index: index as u64,
            };
            self.map.insert(prevout, out.clone());
        }
        Ok(())
    }

    pub fn get(&self, prevout: &OutPoint) -> Option<&TxOut> {
        self.map.get(prevout)
    }

    pub fn contains(&self, prevout: &OutPoint) -> bool {
        self.map.contains_key(prevout)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TxOut)> {
        self.map.iter()
    }

    /// Total unspent value across the set.
    pub fn total_value(&self) -> u128 {
        self.map.values().map(|out| u128::from(out.value)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::spend_message_parts;
    use crate::types::{PublicKey, TxIn};
    use secp256k1::{Secp256k1, SecretKey};

    fn keypair(seed: u8) -> (SecretKey, PublicKey) {
        let secret = SecretKey::from_slice(&[seed; 32]).unwrap();
        let secp = Secp256k1::new();
        (secret, PublicKey::from_secret_key(&secp, &secret))
    }

    fn coinbase_paying(key: PublicKey, values: &[u64]) -> CoinbaseTransaction {
        CoinbaseTransaction(
            values
                .iter()
                .map(|&value| TxOut {
                    value,
                    signature_pub_key: key,
                })
                .collect(),
        )
    }

    /// Spends `prevouts`, each signed with the matching secret key.
    fn spend(prevouts: &[(OutPoint, &SecretKey)], outs: &[(PublicKey, u64)]) -> Transaction {
        let outputs: Vec<TxOut> = outs
            .iter()
            .map(|&(signature_pub_key, value)| TxOut {
                value,
                signature_pub_key,
            })
            .collect();
        let message = spend_message_parts(prevouts.iter().map(|(prevout, _)| prevout), &outputs);
        let secp = Secp256k1::new();
        let inputs = prevouts
            .iter()
            .map(|&(prevout, secret)| TxIn {
                prevout,
                signature: secp.sign_ecdsa(&message, secret),
            })
            .collect();
        Transaction { inputs, outputs }
    }

    fn coinbase_prevout(coinbase: &CoinbaseTransaction, index: u64) -> OutPoint {
        OutPoint {
            source: TxSource::Coinbase(hash_coinbase(coinbase)),
            index,
        }
    }

    #[test]
    fn credits_each_coinbase_output_at_its_index() {
        let (_, key) = keypair(1);
        let coinbase = coinbase_paying(key, &[30, 70]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);

        assert_eq!(utxo.len(), 2);
        assert_eq!(utxo.get(&coinbase_prevout(&coinbase, 0)).unwrap().value, 30);
        assert_eq!(utxo.get(&coinbase_prevout(&coinbase, 1)).unwrap().value, 70);
    }

    #[test]
    fn duplicate_coinbase_merges_by_summing() {
        let (_, key) = keypair(1);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);
        utxo.credit_coinbase(&coinbase);

        assert_eq!(utxo.len(), 1);
        assert_eq!(utxo.get(&coinbase_prevout(&coinbase, 0)).unwrap().value, 200);
    }

    #[test]
    fn spend_moves_value_to_the_new_coordinates() {
        let (secret, key) = keypair(1);
        let (_, payee) = keypair(2);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);

        let tx = spend(
            &[(coinbase_prevout(&coinbase, 0), &secret)],
            &[(payee, 60), (key, 40)],
        );
        utxo.apply_transaction(&tx).unwrap();

        assert_eq!(utxo.len(), 2);
        assert!(!utxo.contains(&coinbase_prevout(&coinbase, 0)));
        let tx_hash = hash_transaction(&tx);
        let first = OutPoint {
            source: TxSource::Transaction(tx_hash),
            index: 0,
        };
        assert_eq!(utxo.get(&first).unwrap().value, 60);
        assert_eq!(utxo.get(&first).unwrap().signature_pub_key, payee);
    }

    #[test]
    fn rejects_unknown_input_reference() {
        let (secret, key) = keypair(1);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();

        let tx = spend(&[(coinbase_prevout(&coinbase, 0), &secret)], &[(key, 100)]);
        assert_eq!(
            utxo.apply_transaction(&tx),
            Err(BlockError::TransactionOutRefNotFound)
        );
    }

    #[test]
    fn rejects_signature_from_the_wrong_key() {
        let (_, key) = keypair(1);
        let (stranger_secret, _) = keypair(2);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);

        let tx = spend(
            &[(coinbase_prevout(&coinbase, 0), &stranger_secret)],
            &[(key, 100)],
        );
        assert_eq!(
            utxo.apply_transaction(&tx),
            Err(BlockError::InvalidTransactionSignature)
        );
        // Nothing was spent.
        assert!(utxo.contains(&coinbase_prevout(&coinbase, 0)));
    }

    #[test]
    fn rejects_outputs_exceeding_inputs() {
        let (secret, key) = keypair(1);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);

        let tx = spend(&[(coinbase_prevout(&coinbase, 0), &secret)], &[(key, 101)]);
        assert_eq!(
            utxo.apply_transaction(&tx),
            Err(BlockError::InvalidTransactionValues)
        );
        assert!(utxo.contains(&coinbase_prevout(&coinbase, 0)));
    }

    #[test]
    fn burned_value_leaves_the_set() {
        let (secret, key) = keypair(1);
        let coinbase = coinbase_paying(key, &[100]);
        let mut utxo = UtxoSet::new();
        utxo.credit_coinbase(&coinbase);

        let tx = spend(&[(coinbase_prevout(&coinbase, 0), &secret)], &[(key, 75)]);
        utxo.apply_transaction(&tx).unwrap();
        assert_eq!(utxo.total_value(), 75);
    }

    #[test]
    fn accumulate_threads_spends_through_blocks() {
        use crate::types::{Block, BlockHash, BlockHeader, CoinbaseHash, MerkleRoot};

        let (secret, key) = keypair(1);
        let (_, payee) = keypair(2);
        let genesis_coinbase = coinbase_paying(key, &[100]);
        let next_coinbase = coinbase_paying(payee, &[100]);
        let tx = spend(
            &[(coinbase_prevout(&genesis_coinbase, 0), &secret)],
            &[(payee, 100)],
        );

        let header = BlockHeader {
            prev_block_header_hash: BlockHash([0; 32]),
            coinbase_transaction_hash: CoinbaseHash([0; 32]),
            transaction_hash_tree_root: MerkleRoot([0; 32]),
            time: 0,
            difficulty: 1,
            nonce: 0,
        };
        let blocks = [
            Block {
                header: header.clone(),
                coinbase: genesis_coinbase,
                transactions: Vec::new(),
            },
            Block {
                header,
                coinbase: next_coinbase,
                transactions: vec![tx],
            },
        ];

        let utxo = UtxoSet::accumulate(&blocks);
        assert_eq!(utxo.len(), 2);
        assert_eq!(utxo.total_value(), 200);
        assert!(utxo
            .iter()
            .all(|(_, out)| out.signature_pub_key == payee));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Spending conserves value up to the burned difference.
            #[test]
            fn conservation_up_to_burn(
                minted in 1u64..1_000_000,
                spent_fraction in 0u64..=100,
            ) {
                let (secret, key) = keypair(1);
                let coinbase = coinbase_paying(key, &[minted]);
                let mut utxo = UtxoSet::new();
                utxo.credit_coinbase(&coinbase);

                let paid = minted * spent_fraction / 100;
                let tx = spend(&[(coinbase_prevout(&coinbase, 0), &secret)], &[(key, paid)]);
                prop_assert!(utxo.apply_transaction(&tx).is_ok());
                prop_assert_eq!(utxo.total_value(), u128::from(paid));
            }
        }
    }
}
