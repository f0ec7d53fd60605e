//! Administrative thread identities.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// One of the three channels of administrative authority.
///
/// Each thread is represented on chain by a single unspent "tip" output whose
/// spender is allowed to perform the thread's next administrative action.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThreadId {
    /// Governs the provision and issue key sets.
    Root,
    /// Governs the validate and ASP key sets.
    Provision,
    /// Mints and destroys the native currency.
    Issue,
}

impl ThreadId {
    pub const ALL: [ThreadId; 3] = [ThreadId::Root, ThreadId::Provision, ThreadId::Issue];

    /// Numeric thread index, as carried in the thread script.
    pub fn index(self) -> u8 {
        match self {
            ThreadId::Root => 0,
            ThreadId::Provision => 1,
            ThreadId::Issue => 2,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(ThreadId::Root),
            1 => Some(ThreadId::Provision),
            2 => Some(ThreadId::Issue),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreadId::Root => "root",
            ThreadId::Provision => "provision",
            ThreadId::Issue => "issue",
        };
        f.write_str(name)
    }
}
