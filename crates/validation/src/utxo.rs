//! Read access to the unspent output set.
//!
//! The UTXO set itself belongs to the storage layer. The engine only needs
//! point lookups, plus a block-local overlay so that later transactions in a
//! block can spend outputs created earlier in the same block.

use std::collections::{HashMap, HashSet};

use bitcoin::{OutPoint, Transaction, TxOut};
use keystone_script::OutputForm;

/// An unspent output together with the context needed to spend it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoEntry {
    pub output: TxOut,
    /// Height of the block that created the output.
    pub height: u64,
    pub is_coinbase: bool,
}

/// Point lookups into an unspent output set.
pub trait UtxoView {
    fn get(&self, outpoint: &OutPoint) -> Option<UtxoEntry>;
}

impl<V: UtxoView + ?Sized> UtxoView for &V {
    fn get(&self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        (**self).get(outpoint)
    }
}

/// Simple in-memory UTXO set.
#[derive(Clone, Debug, Default)]
pub struct MemUtxoView {
    entries: HashMap<OutPoint, UtxoEntry>,
}

impl MemUtxoView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outpoint: OutPoint, entry: UtxoEntry) {
        self.entries.insert(outpoint, entry);
    }

    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        self.entries.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spends the inputs of `tx` and adds its outputs at `height`.
    pub fn connect_tx(&mut self, tx: &Transaction, height: u64) {
        if !tx.is_coinbase() {
            for input in &tx.input {
                self.entries.remove(&input.previous_output);
            }
        }
        for (outpoint, entry) in created_entries(tx, height) {
            self.entries.insert(outpoint, entry);
        }
    }
}

impl UtxoView for MemUtxoView {
    fn get(&self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        self.entries.get(outpoint).cloned()
    }
}

/// Outputs created by `tx` that enter the UTXO set. Data-carrier outputs are
/// provably unspendable and never enter it.
fn created_entries(tx: &Transaction, height: u64) -> impl Iterator<Item = (OutPoint, UtxoEntry)> {
    let txid = tx.compute_txid();
    let is_coinbase = tx.is_coinbase();
    tx.output
        .iter()
        .enumerate()
        .filter(|(_, out)| !OutputForm::classify(&out.script_pubkey).is_null_data())
        .map(move |(vout, out)| {
            (
                OutPoint::new(txid, vout as u32),
                UtxoEntry {
                    output: out.clone(),
                    height,
                    is_coinbase,
                },
            )
        })
}

/// Overlay of the outputs created and spent by the transactions of a block
/// that have been accepted so far.
#[derive(Debug)]
pub struct BlockUtxoView<'a, V: ?Sized> {
    base: &'a V,
    height: u64,
    created: HashMap<OutPoint, UtxoEntry>,
    spent: HashSet<OutPoint>,
}

impl<'a, V: UtxoView + ?Sized> BlockUtxoView<'a, V> {
    pub fn new(base: &'a V, height: u64) -> Self {
        Self {
            base,
            height,
            created: HashMap::new(),
            spent: HashSet::new(),
        }
    }

    /// Records an accepted transaction.
    pub fn connect_tx(&mut self, tx: &Transaction) {
        for input in &tx.input {
            if self.created.remove(&input.previous_output).is_none() {
                self.spent.insert(input.previous_output);
            }
        }
        self.created.extend(created_entries(tx, self.height));
    }
}

impl<V: UtxoView + ?Sized> UtxoView for BlockUtxoView<'_, V> {
    fn get(&self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        if self.spent.contains(outpoint) {
            return None;
        }
        self.created
            .get(outpoint)
            .cloned()
            .or_else(|| self.base.get(outpoint))
    }
}
