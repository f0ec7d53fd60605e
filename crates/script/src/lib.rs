//! Locking scripts recognised by the admin engine: thread continuation
//! outputs, pay-to-address outputs and data-carrier outputs holding admin
//! operations.

pub mod address;
pub mod admin;
pub mod classify;
pub mod errors;
pub mod nulldata;
pub mod thread;

pub use address::{ADDRESS_THRESHOLD, Address, OP_CHECKSAFEMULTISIG};
pub use admin::{AdminAction, AdminOperation, KeyTarget};
pub use classify::OutputForm;
pub use errors::ScriptError;
pub use nulldata::{MAX_NULL_DATA_PAYLOAD, null_data_payload, null_data_script};
pub use thread::{OP_CHECKTHREAD, parse_thread_script, thread_script};
