use borsh::{BorshDeserialize, BorshSerialize};
use keystone_primitives::{OutputRef, ThreadId};
use keystone_script::AdminOperation;

/// Movement of a thread tip caused by an admin transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TipAdvance {
    pub thread: ThreadId,
    pub spent: OutputRef,
    pub new: OutputRef,
}

/// Admin state changes produced by one accepted transaction.
///
/// Regular transactions produce an empty delta.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct StateDelta {
    pub tip_advance: Option<TipAdvance>,

    /// Key set operations in output order.
    pub key_diffs: Vec<AdminOperation>,

    /// Signed change of the total supply in base units.
    pub supply_delta: i64,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        self.tip_advance.is_none() && self.key_diffs.is_empty() && self.supply_delta == 0
    }
}
