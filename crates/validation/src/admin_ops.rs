//! Decoding and batch application of key set operations.

use std::collections::BTreeSet;

use bitcoin::Transaction;
use keystone_admin_state::{KeySetError, KeyStore};
use keystone_primitives::ThreadId;
use keystone_script::{AdminAction, AdminOperation};

use crate::errors::StructuralError;

/// Decodes outputs 1.. of a root or provision thread transaction.
///
/// Undecodable outputs and operations that belong to another thread are
/// rejected alike.
pub(crate) fn decode_operations(
    tx: &Transaction,
    thread: ThreadId,
) -> Result<Vec<AdminOperation>, StructuralError> {
    tx.output
        .iter()
        .skip(1)
        .map(|out| {
            AdminOperation::from_script(&out.script_pubkey)
                .ok()
                .filter(|op| op.required_thread() == thread)
                .ok_or(StructuralError::InvalidAdminOperation)
        })
        .collect()
}

/// Checks that `ops` apply in order to a scratch copy of `keys`.
///
/// `keys` itself is never touched. The accepted batch is committed later
/// from the transaction's [`StateDelta`](keystone_admin_state::StateDelta),
/// which replays the same operations against the same store.
pub(crate) fn check_operations(
    ops: &[AdminOperation],
    keys: &KeyStore,
    min_keys: usize,
) -> Result<(), KeySetError> {
    // An id may not be both added and revoked within one batch.
    let added: BTreeSet<_> = ops
        .iter()
        .filter(|op| op.action() == AdminAction::Add)
        .filter_map(|op| op.target().key_id())
        .collect();
    if let Some(id) = ops
        .iter()
        .filter(|op| op.action() == AdminAction::Revoke)
        .filter_map(|op| op.target().key_id())
        .find(|id| added.contains(id))
    {
        return Err(KeySetError::AspIdAddedAndRevoked(id));
    }

    let mut scratch = keys.clone();
    for op in ops {
        if op.action() == AdminAction::Revoke && keys.count(op.category()) < min_keys {
            return Err(KeySetError::TooFewKeys { min: min_keys });
        }
        scratch.apply(op)?;
    }
    Ok(())
}
