//! Confirmed admin state: thread tips, key sets and total supply.
//!
//! The state is an explicit snapshot passed by reference. Mempool checks read
//! it, block application mutates it through [`AdminState::apply_delta`].

mod delta;
mod errors;
mod info;
mod keyset;
mod registry;
mod state;
mod store;

pub use delta::{StateDelta, TipAdvance};
pub use errors::{KeySetError, RegistryError, StateError};
pub use info::{AdminInfo, AspKeyInfo, ThreadTipInfo};
pub use keyset::{AspKeySet, KeySet};
pub use registry::ThreadRegistry;
pub use state::AdminState;
pub use store::KeyStore;
