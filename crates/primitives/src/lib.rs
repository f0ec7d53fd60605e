//! Shared primitive types for the keystone admin engine.
//!
//! Everything in here is plain data: admin keys, ASP key ids, thread
//! identities and outpoint references. Validation logic lives in the
//! `keystone-validation` crate.

pub mod category;
pub mod errors;
pub mod keys;
pub mod outref;
pub mod thread;

pub use category::KeyCategory;
pub use errors::KeyParseError;
pub use keys::{AdminPubkey, COMPRESSED_PUBKEY_LEN, KeyId};
pub use outref::OutputRef;
pub use thread::ThreadId;

