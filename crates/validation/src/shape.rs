//! Structural checks that run before any semantic validation.

use std::collections::HashSet;

use bitcoin::{Transaction, Txid};
use keystone_admin_state::ThreadRegistry;
use keystone_params::ChainParams;
use keystone_primitives::ThreadId;
use keystone_script::OutputForm;

use crate::errors::{RejectReason, StructuralError, ThreadStateError, ValueError};

/// Which validation path a transaction takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TxClass {
    Regular,
    Admin(AdminTx),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AdminTx {
    pub(crate) thread: ThreadId,
    /// Input spending the thread tip, if any.
    pub(crate) tip_input: Option<usize>,
}

/// Checks every transaction must pass regardless of its kind.
pub(crate) fn check_basic(tx: &Transaction, params: &ChainParams) -> Result<(), RejectReason> {
    if tx.output.is_empty() {
        return Err(StructuralError::NoOutputs.into());
    }
    if tx.is_coinbase() {
        return Err(StructuralError::Coinbase.into());
    }
    if tx.input.is_empty() {
        return Err(StructuralError::NoInputs.into());
    }

    let mut seen = HashSet::with_capacity(tx.input.len());
    if !tx.input.iter().all(|i| seen.insert(i.previous_output)) {
        return Err(StructuralError::DuplicateInputs.into());
    }

    let max = params.max_money.to_sat();
    let total = tx
        .output
        .iter()
        .fold(0u64, |acc, out| acc.saturating_add(out.value.to_sat()));
    if total > max {
        return Err(ValueError::OutputsAboveMaxMoney { total, max }.into());
    }

    Ok(())
}

/// Routes a transaction to the admin or regular path.
pub(crate) fn classify(
    tx: &Transaction,
    txid: Txid,
    registry: &ThreadRegistry,
) -> Result<TxClass, RejectReason> {
    let mut out0_thread = None;
    for (idx, out) in tx.output.iter().enumerate() {
        if let OutputForm::Thread(thread) = OutputForm::classify(&out.script_pubkey) {
            if idx != 0 {
                return Err(StructuralError::ThreadOutputPosition(idx).into());
            }
            out0_thread = Some(thread);
        }
    }

    let mut spent_tips = tx.input.iter().enumerate().filter_map(|(idx, input)| {
        registry
            .thread_for(&input.previous_output.into())
            .map(|thread| (idx, thread))
    });
    let spent = spent_tips.next();
    if spent.is_some() && spent_tips.next().is_some() {
        return Err(ThreadStateError::MultipleTips(txid).into());
    }

    match (spent, out0_thread) {
        (None, None) => Ok(TxClass::Regular),
        (Some(_), None) => Err(ThreadStateError::NotContinued(txid).into()),
        (Some((_, spent_thread)), Some(thread)) if spent_thread != thread => {
            Err(ThreadStateError::WrongThread(txid).into())
        }
        (Some((idx, _)), Some(thread)) => Ok(TxClass::Admin(AdminTx {
            thread,
            tip_input: Some(idx),
        })),
        (None, Some(thread)) => Ok(TxClass::Admin(AdminTx {
            thread,
            tip_input: None,
        })),
    }
}
