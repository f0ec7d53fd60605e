//! Checks for transactions that move funds between addresses.
//!
//! The input side is shared with the destroy form of the issue thread, whose
//! extra inputs are authorised exactly like regular inputs.

use bitcoin::{Transaction, TxOut, Txid};
use keystone_admin_state::AspKeySet;
use keystone_params::ChainParams;
use keystone_script::OutputForm;

use crate::{
    errors::{RejectReason, SignatureError, SignatureFailure, StructuralError, ValueError},
    signature::{SignerPolicy, verify_input},
    utxo::{UtxoEntry, UtxoView},
};

/// An input whose spent output has been looked up.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedInput {
    pub(crate) index: usize,
    pub(crate) entry: UtxoEntry,
}

/// Output shapes allowed in a regular transaction: pay-to-address outputs and
/// at most one zero-value data-carrier.
pub(crate) fn check_output_forms(tx: &Transaction) -> Result<(), StructuralError> {
    let mut null_data = 0;
    for out in &tx.output {
        match OutputForm::classify(&out.script_pubkey) {
            OutputForm::PayToAddress(_) => {}
            OutputForm::NullData(_) if out.value.to_sat() == 0 => null_data += 1,
            _ => return Err(StructuralError::NotAllowedForm),
        }
    }
    if null_data > 1 {
        return Err(StructuralError::NotAllowedForm);
    }
    Ok(())
}

/// Every address output must name two distinct ASP ids, both live.
pub(crate) fn check_address_outputs(
    tx: &Transaction,
    asp: &AspKeySet,
) -> Result<(), RejectReason> {
    for (index, out) in tx.output.iter().enumerate() {
        let OutputForm::PayToAddress(addr) = OutputForm::classify(&out.script_pubkey) else {
            continue;
        };
        if !addr.has_distinct_key_ids() {
            return Err(StructuralError::NotAllowedForm.into());
        }
        if let Some(key_id) = addr.key_ids().into_iter().find(|id| !asp.contains_id(*id)) {
            return Err(ValueError::UnknownKeyId { index, key_id }.into());
        }
    }
    Ok(())
}

/// Looks up the outputs spent by the given inputs and checks they may be
/// spent at `spend_height`.
pub(crate) fn resolve_inputs<U: UtxoView + ?Sized>(
    tx: &Transaction,
    txid: Txid,
    indices: impl IntoIterator<Item = usize>,
    utxos: &U,
    spend_height: u64,
    params: &ChainParams,
) -> Result<Vec<ResolvedInput>, RejectReason> {
    let mut resolved = Vec::new();
    for index in indices {
        let outpoint = tx.input[index].previous_output;
        let entry = utxos
            .get(&outpoint)
            .ok_or(StructuralError::MissingInput { outpoint, txid })?;

        if OutputForm::classify(&entry.output.script_pubkey).is_unspendable() {
            return Err(StructuralError::UnspendableInput { outpoint, txid }.into());
        }

        if entry.is_coinbase && spend_height.saturating_sub(entry.height) < params.coinbase_maturity
        {
            return Err(ValueError::ImmatureCoinbase {
                outpoint,
                coinbase_height: entry.height,
                spend_height,
                maturity: params.coinbase_maturity,
            }
            .into());
        }

        resolved.push(ResolvedInput { index, entry });
    }
    Ok(resolved)
}

pub(crate) fn input_total(inputs: &[ResolvedInput]) -> u64 {
    inputs
        .iter()
        .fold(0u64, |acc, i| acc.saturating_add(i.entry.output.value.to_sat()))
}

pub(crate) fn output_total(outputs: &[TxOut]) -> u64 {
    outputs
        .iter()
        .fold(0u64, |acc, o| acc.saturating_add(o.value.to_sat()))
}

/// Checks inputs cover outputs and returns the fee.
pub(crate) fn check_fee(
    txid: Txid,
    inputs: u64,
    outputs: u64,
    max_fee: u64,
) -> Result<u64, ValueError> {
    let fee = inputs
        .checked_sub(outputs)
        .ok_or(ValueError::InsufficientInputs {
            txid,
            inputs,
            outputs,
        })?;
    if fee > max_fee {
        return Err(ValueError::FeeTooHigh { fee, max: max_fee });
    }
    Ok(fee)
}

/// Verifies the 2-of-3 authorisation of every resolved input.
pub(crate) fn check_input_signatures(
    tx: &Transaction,
    inputs: &[ResolvedInput],
    asp: &AspKeySet,
) -> Result<(), SignatureError> {
    for input in inputs {
        let prevout = &input.entry.output;
        let Some(addr) = OutputForm::classify(&prevout.script_pubkey).address().copied() else {
            return Err(SignatureError::InvalidInput {
                input: input.index,
                cause: SignatureFailure::UnsignableScript,
            });
        };
        let policy = SignerPolicy::for_address(addr, asp);
        verify_input(tx, input.index, prevout, &policy)?;
    }
    Ok(())
}

/// Full validation of a regular transaction. Returns the fee.
pub(crate) fn check_regular<U: UtxoView + ?Sized>(
    tx: &Transaction,
    txid: Txid,
    asp: &AspKeySet,
    utxos: &U,
    spend_height: u64,
    params: &ChainParams,
) -> Result<u64, RejectReason> {
    check_output_forms(tx)?;
    check_address_outputs(tx, asp)?;

    let inputs = resolve_inputs(tx, txid, 0..tx.input.len(), utxos, spend_height, params)?;
    let fee = check_fee(
        txid,
        input_total(&inputs),
        output_total(&tx.output),
        params.max_fee.to_sat(),
    )?;

    check_input_signatures(tx, &inputs, asp)?;
    Ok(fee)
}
