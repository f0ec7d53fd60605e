//! Entry points: mempool admission and block application.
//!
//! Mempool checks and block application run the same validation path, so a
//! transaction is rejected for the same reason in both.

use std::collections::BTreeSet;

use bitcoin::{Amount, Transaction, TxOut, Txid};
use keystone_admin_state::{AdminState, KeySetError, StateDelta, TipAdvance};
use keystone_params::ChainParams;
use keystone_primitives::{AdminPubkey, KeyCategory, OutputRef, ThreadId};
use keystone_script::thread_script;
use tracing::{debug, warn};

use crate::{
    admin_ops::{check_operations, decode_operations},
    errors::{BlockRejection, RejectReason, StructuralError, ThreadStateError, ValueError},
    issuance::{check_issue_outputs, destroy_amount, mint_amount},
    regular::{check_address_outputs, check_input_signatures, check_regular, resolve_inputs},
    shape::{AdminTx, TxClass, check_basic, classify},
    signature::{SignerPolicy, verify_input},
    utxo::{BlockUtxoView, UtxoView},
};

/// Checks whether `tx` may enter the mempool on top of `state`.
///
/// Never mutates anything. Safe to call concurrently over one snapshot.
pub fn validate_for_mempool<U: UtxoView + ?Sized>(
    tx: &Transaction,
    state: &AdminState,
    utxos: &U,
    params: &ChainParams,
) -> Result<(), RejectReason> {
    check_transaction(tx, state, utxos, params).map(|_| ())
}

/// Validates `tx` exactly as [`validate_for_mempool`] does and applies its
/// effects to `state`. On error `state` is left untouched.
pub fn apply_in_block<U: UtxoView + ?Sized>(
    tx: &Transaction,
    state: &mut AdminState,
    utxos: &U,
    params: &ChainParams,
) -> Result<StateDelta, RejectReason> {
    apply_checked(tx, state, utxos, params).map(|checked| checked.delta)
}

/// Outcome of a connected block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectedBlock {
    /// One delta per transaction, in block order.
    pub deltas: Vec<StateDelta>,

    /// Sum of the fees paid by the block's transactions. This is all a
    /// coinbase may claim.
    pub fees: Amount,
}

/// Applies the non-coinbase transactions of a block in order.
///
/// Works on a copy of `state` and commits only if every transaction is
/// accepted, then advances the confirmed height. Later transactions may
/// spend outputs of earlier ones.
pub fn apply_block<U: UtxoView + ?Sized>(
    txs: &[Transaction],
    state: &mut AdminState,
    utxos: &U,
    params: &ChainParams,
) -> Result<ConnectedBlock, BlockRejection> {
    let mut next = state.clone();
    let height = next.height() + 1;
    let mut overlay = BlockUtxoView::new(utxos, height);
    let mut deltas = Vec::with_capacity(txs.len());
    let mut fees = Amount::ZERO;

    for (index, tx) in txs.iter().enumerate() {
        let checked = apply_checked(tx, &mut next, &overlay, params).and_then(|checked| {
            fees = fees
                .checked_add(checked.fee)
                .ok_or(ValueError::SupplyOutOfRange)?;
            Ok(checked)
        });
        match checked {
            Ok(checked) => {
                overlay.connect_tx(tx);
                deltas.push(checked.delta);
            }
            Err(reason) => {
                let txid = tx.compute_txid();
                warn!(%height, %index, %txid, %reason, "rejecting block");
                return Err(BlockRejection {
                    index,
                    txid,
                    reason,
                });
            }
        }
    }

    next.advance_height();
    debug!(
        %height,
        txs = txs.len(),
        %fees,
        total_supply = %next.total_supply(),
        "connected block"
    );
    *state = next;
    Ok(ConnectedBlock { deltas, fees })
}

/// A transaction that passed validation.
struct Checked {
    delta: StateDelta,
    fee: Amount,
}

fn apply_checked<U: UtxoView + ?Sized>(
    tx: &Transaction,
    state: &mut AdminState,
    utxos: &U,
    params: &ChainParams,
) -> Result<Checked, RejectReason> {
    let checked = check_transaction(tx, state, utxos, params)?;
    state.apply_delta(&checked.delta)?;
    Ok(checked)
}

/// Shared validation path. Returns the delta the transaction would apply and
/// the fee it pays.
fn check_transaction<U: UtxoView + ?Sized>(
    tx: &Transaction,
    state: &AdminState,
    utxos: &U,
    params: &ChainParams,
) -> Result<Checked, RejectReason> {
    check_basic(tx, params)?;

    let txid = tx.compute_txid();
    let spend_height = state.height() + 1;

    match classify(tx, txid, state.registry())? {
        TxClass::Regular => {
            let fee = check_regular(
                tx,
                txid,
                state.keys().asp(),
                utxos,
                spend_height,
                params,
            )?;
            debug!(%txid, %fee, "accepted regular transaction");
            Ok(Checked {
                delta: StateDelta::default(),
                fee: Amount::from_sat(fee),
            })
        }
        TxClass::Admin(admin) => {
            let delta = check_admin(tx, txid, admin, state, utxos, spend_height, params)?;
            debug!(
                %txid,
                thread = %admin.thread,
                ops = delta.key_diffs.len(),
                supply_delta = delta.supply_delta,
                "accepted admin transaction"
            );
            // Admin transactions never pay a fee.
            Ok(Checked {
                delta,
                fee: Amount::ZERO,
            })
        }
    }
}

fn check_admin<U: UtxoView + ?Sized>(
    tx: &Transaction,
    txid: Txid,
    admin: AdminTx,
    state: &AdminState,
    utxos: &U,
    spend_height: u64,
    params: &ChainParams,
) -> Result<StateDelta, RejectReason> {
    let AdminTx { thread, tip_input } = admin;

    let ops = match thread {
        ThreadId::Issue => {
            check_issue_outputs(tx)?;
            Vec::new()
        }
        _ => decode_operations(tx, thread)?,
    };

    let nonzero = match thread {
        ThreadId::Issue => tx.output.iter().take(1).position(|o| o.value.to_sat() != 0),
        _ => tx.output.iter().position(|o| o.value.to_sat() != 0),
    };
    if let Some(idx) = nonzero {
        return Err(ValueError::NonZeroAdminOutput(idx).into());
    }

    if tx.output.len() < 2 {
        return Err(StructuralError::NoAdminOperations.into());
    }

    match thread {
        ThreadId::Issue => {
            if tip_input.is_some_and(|idx| idx != 0) {
                return Err(ThreadStateError::TipNotFirstInput.into());
            }
        }
        _ if tx.input.len() != 1 => return Err(StructuralError::TooManyInputs.into()),
        _ => {}
    }

    let Some(tip_input) = tip_input else {
        return Err(ThreadStateError::TipNotSpent.into());
    };

    let signers = governing_keys(thread, state, params);
    if signers.len() < params.min_thread_keys {
        return Err(KeySetError::TooFewKeys {
            min: params.min_thread_keys,
        }
        .into());
    }

    let tip = state.registry().current_tip(thread);
    let tip_advance = Some(TipAdvance {
        thread,
        spent: tip,
        new: OutputRef::new(txid, 0),
    });

    let (key_diffs, supply_delta, extra_inputs) = match thread {
        ThreadId::Issue => {
            check_address_outputs(tx, state.keys().asp())?;
            let supply = state.total_supply().to_sat();
            if tx.input.len() == 1 {
                let minted = mint_amount(tx, supply, params)?;
                (Vec::new(), to_signed(minted)?, Vec::new())
            } else {
                let inputs =
                    resolve_inputs(tx, txid, 1..tx.input.len(), utxos, spend_height, params)?;
                let destroyed = destroy_amount(tx, txid, &inputs, supply)?;
                (Vec::new(), -to_signed(destroyed)?, inputs)
            }
        }
        _ => {
            check_operations(&ops, state.keys(), params.min_thread_keys)?;
            (ops, 0, Vec::new())
        }
    };

    // Thread outputs always carry zero value, so the spent tip is known
    // without a UTXO lookup.
    let tip_prevout = TxOut {
        value: Amount::ZERO,
        script_pubkey: thread_script(thread),
    };
    verify_input(tx, tip_input, &tip_prevout, &SignerPolicy::All(signers))?;
    check_input_signatures(tx, &extra_inputs, state.keys().asp())?;

    Ok(StateDelta {
        tip_advance,
        key_diffs,
        supply_delta,
    })
}

/// The keys that must all sign a transaction of `thread`.
fn governing_keys(
    thread: ThreadId,
    state: &AdminState,
    params: &ChainParams,
) -> BTreeSet<AdminPubkey> {
    match thread {
        ThreadId::Root => params.root_keys.iter().copied().collect(),
        ThreadId::Provision => state.keys().keys(KeyCategory::Provision).into_iter().collect(),
        ThreadId::Issue => state.keys().keys(KeyCategory::Issue).into_iter().collect(),
    }
}

fn to_signed(amount: u64) -> Result<i64, ValueError> {
    i64::try_from(amount).map_err(|_| ValueError::SupplyOutOfRange)
}
