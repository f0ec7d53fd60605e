//! Output script classification.

use bitcoin::Script;
use keystone_primitives::ThreadId;

use crate::{address::Address, nulldata::null_data_payload, thread::parse_thread_script};

/// The recognised forms of an output locking script.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputForm<'a> {
    /// Thread continuation output.
    Thread(ThreadId),
    PayToAddress(Address),
    /// Data-carrier output with its payload.
    NullData(&'a [u8]),
    NonStandard,
}

impl<'a> OutputForm<'a> {
    pub fn classify(script: &'a Script) -> Self {
        if let Some(thread) = parse_thread_script(script) {
            return OutputForm::Thread(thread);
        }
        if let Some(addr) = Address::from_script(script) {
            return OutputForm::PayToAddress(addr);
        }
        if let Some(payload) = null_data_payload(script) {
            return OutputForm::NullData(payload);
        }
        OutputForm::NonStandard
    }

    pub fn is_null_data(&self) -> bool {
        matches!(self, OutputForm::NullData(_))
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            OutputForm::PayToAddress(addr) => Some(addr),
            _ => None,
        }
    }

    /// Whether an output of this form can never be spent by a regular input.
    pub fn is_unspendable(&self) -> bool {
        matches!(self, OutputForm::NullData(_) | OutputForm::Thread(_))
    }
}
