//! Admin key set categories.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::ThreadId;

/// One of the four mutable admin key collections.
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
pub enum KeyCategory {
    Provision,
    Issue,
    Validate,
    Asp,
}

impl KeyCategory {
    pub const ALL: [KeyCategory; 4] = [
        KeyCategory::Provision,
        KeyCategory::Issue,
        KeyCategory::Validate,
        KeyCategory::Asp,
    ];

    /// The thread whose transactions may add or revoke keys in this category.
    pub fn managing_thread(self) -> ThreadId {
        match self {
            KeyCategory::Provision | KeyCategory::Issue => ThreadId::Root,
            KeyCategory::Validate | KeyCategory::Asp => ThreadId::Provision,
        }
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyCategory::Provision => "provision",
            KeyCategory::Issue => "issue",
            KeyCategory::Validate => "validate",
            KeyCategory::Asp => "asp",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managing_thread() {
        assert_eq!(KeyCategory::Provision.managing_thread(), ThreadId::Root);
        assert_eq!(KeyCategory::Issue.managing_thread(), ThreadId::Root);
        assert_eq!(KeyCategory::Validate.managing_thread(), ThreadId::Provision);
        assert_eq!(KeyCategory::Asp.managing_thread(), ThreadId::Provision);
    }
}
