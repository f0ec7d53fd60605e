//! Value accounting for the issue thread.
//!
//! A single-input issue transaction mints: every address output creates new
//! funds. An issue transaction with extra inputs destroys: the extra inputs
//! are burnt into exactly one data-carrier output, with no fee.

use bitcoin::{Transaction, Txid};
use keystone_params::ChainParams;
use keystone_script::OutputForm;

use crate::{
    errors::{RejectReason, StructuralError, ValueError},
    regular::{ResolvedInput, check_fee, input_total, output_total},
};

/// Checks outputs 1.. of an issue thread transaction are value outputs.
pub(crate) fn check_issue_outputs(tx: &Transaction) -> Result<(), StructuralError> {
    let all_value_outputs = tx.output.iter().skip(1).all(|out| {
        matches!(
            OutputForm::classify(&out.script_pubkey),
            OutputForm::PayToAddress(_) | OutputForm::NullData(_)
        )
    });
    if !all_value_outputs {
        return Err(StructuralError::InvalidAdminOperation);
    }
    Ok(())
}

/// Amount minted by a single-input issue transaction.
pub(crate) fn mint_amount(
    tx: &Transaction,
    total_supply: u64,
    params: &ChainParams,
) -> Result<u64, ValueError> {
    let mut minted = 0u64;
    for (idx, out) in tx.output.iter().enumerate().skip(1) {
        match OutputForm::classify(&out.script_pubkey) {
            OutputForm::NullData(_) => return Err(ValueError::DestroyWithoutInputs),
            _ if out.value.to_sat() == 0 => return Err(ValueError::ZeroIssue(idx)),
            _ => minted = minted.saturating_add(out.value.to_sat()),
        }
    }

    let max = params.max_money.to_sat();
    let supply = total_supply.saturating_add(minted);
    if supply > max {
        return Err(ValueError::SupplyAboveMaxMoney {
            amount: minted,
            supply,
            max,
        });
    }
    Ok(minted)
}

/// Amount destroyed by an issue transaction spending `inputs` besides the
/// thread tip.
pub(crate) fn destroy_amount(
    tx: &Transaction,
    txid: Txid,
    inputs: &[ResolvedInput],
    total_supply: u64,
) -> Result<u64, RejectReason> {
    let in_total = input_total(inputs);
    let out_total = output_total(&tx.output);
    if in_total < out_total {
        return Err(ValueError::InsufficientInputs {
            txid,
            inputs: in_total,
            outputs: out_total,
        }
        .into());
    }

    let burns: Vec<u64> = tx
        .output
        .iter()
        .filter(|out| OutputForm::classify(&out.script_pubkey).is_null_data())
        .map(|out| out.value.to_sat())
        .collect();
    let &[destroyed] = burns.as_slice() else {
        return Err(StructuralError::DestroyOutputCount(burns.len()).into());
    };

    check_fee(txid, in_total, out_total, 0)?;

    if destroyed > total_supply {
        return Err(ValueError::DestroyAboveSupply {
            amount: destroyed,
            supply: total_supply,
        }
        .into());
    }
    Ok(destroyed)
}
