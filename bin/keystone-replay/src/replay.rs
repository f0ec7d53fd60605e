//! Replay file format and the block replay loop.

use std::{fs, path::Path};

use anyhow::{Context, bail};
use bitcoin::{
    Amount, OutPoint, ScriptBuf, Transaction, TxOut, consensus::encode::deserialize_hex,
};
use keystone_admin_state::{AdminInfo, AdminState};
use keystone_params::ChainParams;
use keystone_validation::{MemUtxoView, UtxoEntry, apply_block};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Contents of a replay file.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ReplayFile {
    /// Outputs present before the first block, such as genesis allocations.
    #[serde(default)]
    pub(crate) utxos: Vec<UtxoInput>,
    pub(crate) blocks: Vec<BlockInput>,
}

impl ReplayFile {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading replay file {}", path.display()))?;
        serde_json::from_str(&raw).context("parsing replay file")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UtxoInput {
    pub(crate) outpoint: OutPoint,
    pub(crate) value_sat: u64,
    pub(crate) script_pubkey: ScriptBuf,
    #[serde(default)]
    pub(crate) height: u64,
    #[serde(default)]
    pub(crate) coinbase: bool,
}

/// One block: an optional coinbase and the remaining transactions, all as
/// consensus-encoded hex.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct BlockInput {
    #[serde(default)]
    pub(crate) coinbase: Option<String>,
    #[serde(default)]
    pub(crate) txs: Vec<String>,
}

/// What the tool prints once every block has been replayed.
#[derive(Debug, Serialize)]
pub(crate) struct ReplayReport {
    pub(crate) connected_blocks: usize,
    pub(crate) rejected_blocks: usize,
    pub(crate) admin_info: AdminInfo,
}

/// Drives the engine over a sequence of blocks.
#[derive(Debug)]
pub(crate) struct Replayer {
    params: ChainParams,
    state: AdminState,
    utxos: MemUtxoView,
}

impl Replayer {
    pub(crate) fn new(params: ChainParams) -> anyhow::Result<Self> {
        let state = AdminState::genesis(&params).context("building genesis state")?;
        Ok(Self {
            params,
            state,
            utxos: MemUtxoView::new(),
        })
    }

    pub(crate) fn add_utxos(&mut self, utxos: &[UtxoInput]) {
        for utxo in utxos {
            self.utxos.insert(
                utxo.outpoint,
                UtxoEntry {
                    output: TxOut {
                        value: Amount::from_sat(utxo.value_sat),
                        script_pubkey: utxo.script_pubkey.clone(),
                    },
                    height: utxo.height,
                    is_coinbase: utxo.coinbase,
                },
            );
        }
    }

    /// Connects one block. Returns `Ok(false)` if the engine rejected it or
    /// its coinbase pays out more than the block's fees, in which case nothing
    /// changes.
    pub(crate) fn replay_block(&mut self, block: &BlockInput) -> anyhow::Result<bool> {
        let height = self.state.height() + 1;

        let coinbase = block
            .coinbase
            .as_deref()
            .map(|hex| decode_tx(hex).context("decoding coinbase"))
            .transpose()?;
        if coinbase.as_ref().is_some_and(|tx| !tx.is_coinbase()) {
            bail!("block {height}: coinbase field holds a non-coinbase transaction");
        }

        let txs = block
            .txs
            .iter()
            .enumerate()
            .map(|(idx, hex)| {
                decode_tx(hex).with_context(|| format!("block {height}: decoding tx {idx}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut next = self.state.clone();
        let connected = match apply_block(&txs, &mut next, &self.utxos, &self.params) {
            Ok(connected) => connected,
            Err(rejection) => {
                warn!(%height, %rejection, "block rejected");
                return Ok(false);
            }
        };

        // There is no block subsidy: a coinbase may claim only the fees.
        let claimed = coinbase.as_ref().map_or(Amount::ZERO, coinbase_value);
        if claimed > connected.fees {
            warn!(
                %height,
                %claimed,
                fees = %connected.fees,
                "block rejected: coinbase pays more than fees"
            );
            return Ok(false);
        }

        self.state = next;
        for tx in coinbase.iter().chain(&txs) {
            self.utxos.connect_tx(tx, height);
        }
        let admin_txs = connected
            .deltas
            .iter()
            .filter(|d| d.tip_advance.is_some())
            .count();
        info!(
            %height,
            txs = txs.len(),
            admin_txs,
            fees = %connected.fees,
            total_supply = %self.state.total_supply(),
            "connected block"
        );
        Ok(true)
    }

    /// Replays every block of `file` in order.
    pub(crate) fn run(
        mut self,
        file: &ReplayFile,
        keep_going: bool,
    ) -> anyhow::Result<ReplayReport> {
        self.add_utxos(&file.utxos);

        let mut connected_blocks = 0;
        let mut rejected_blocks = 0;
        for block in &file.blocks {
            if self.replay_block(block)? {
                connected_blocks += 1;
            } else {
                rejected_blocks += 1;
                if !keep_going {
                    break;
                }
            }
        }

        Ok(ReplayReport {
            connected_blocks,
            rejected_blocks,
            admin_info: self.state.admin_info(),
        })
    }
}

fn coinbase_value(tx: &Transaction) -> Amount {
    tx.output
        .iter()
        .fold(Amount::ZERO, |acc, out| acc.checked_add(out.value).unwrap_or(Amount::MAX))
}

fn decode_tx(hex: &str) -> anyhow::Result<Transaction> {
    Ok(deserialize_hex(hex)?)
}
