//! Read-only view of the admin state, as reported to operators.

use keystone_primitives::{AdminPubkey, KeyId, OutputRef, ThreadId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTipInfo {
    pub thread: ThreadId,
    pub outpoint: OutputRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspKeyInfo {
    pub keyid: KeyId,
    pub pubkey: AdminPubkey,
}

/// Snapshot of thread tips, key sets and supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminInfo {
    pub height: u64,
    /// Ordered by thread index.
    pub threadtips: Vec<ThreadTipInfo>,
    pub provisionkeys: Vec<AdminPubkey>,
    pub issuekeys: Vec<AdminPubkey>,
    pub validatekeys: Vec<AdminPubkey>,
    pub aspkeys: Vec<AspKeyInfo>,
    /// Zero if no ASP key was ever assigned.
    pub lastkeyid: KeyId,
    /// In base units.
    pub totalsupply: u64,
}
