//! Transaction validation for the admin-permissioned chain.
//!
//! Every non-coinbase transaction is routed either to the admin path, when it
//! continues one of the three admin threads, or to the regular path. Both
//! paths are pure functions of the transaction, an [`AdminState`] snapshot and
//! a [`UtxoView`]; only [`apply_in_block`] and [`apply_block`] write state.
//!
//! [`AdminState`]: keystone_admin_state::AdminState

mod admin_ops;
mod engine;
mod errors;
mod issuance;
mod regular;
mod shape;
mod signature;
mod utxo;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;


pub use engine::{ConnectedBlock, apply_block, apply_in_block, validate_for_mempool};
pub use errors::{
    BlockRejection, RejectKind, RejectReason, SignatureError, SignatureFailure, StructuralError,
    ThreadStateError, ValueError,
};
pub use utxo::{BlockUtxoView, MemUtxoView, UtxoEntry, UtxoView};
