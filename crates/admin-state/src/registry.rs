//! Per-thread continuation tips.

use borsh::{BorshDeserialize, BorshSerialize};
use keystone_params::GenesisThreadTips;
use keystone_primitives::{OutputRef, ThreadId};

use crate::errors::RegistryError;

/// Tracks the single live tip outpoint of every admin thread.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ThreadRegistry {
    /// Indexed by [`ThreadId::index`].
    tips: [OutputRef; 3],
}

impl ThreadRegistry {
    pub fn new(genesis: &GenesisThreadTips) -> Self {
        Self {
            tips: ThreadId::ALL.map(|thread| genesis.get(thread)),
        }
    }

    pub fn current_tip(&self, thread: ThreadId) -> OutputRef {
        self.tips[thread.index() as usize]
    }

    /// Returns the thread whose live tip is `outref`, if any.
    pub fn thread_for(&self, outref: &OutputRef) -> Option<ThreadId> {
        ThreadId::ALL
            .into_iter()
            .find(|thread| self.current_tip(*thread) == *outref)
    }

    /// Moves the tip of `thread` from `spent` to `new`.
    pub fn advance(
        &mut self,
        thread: ThreadId,
        spent: OutputRef,
        new: OutputRef,
    ) -> Result<(), RegistryError> {
        let slot = &mut self.tips[thread.index() as usize];
        if *slot != spent {
            return Err(RegistryError::StaleTip {
                thread,
                expected: *slot,
                got: spent,
            });
        }
        *slot = new;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, OutputRef)> + '_ {
        ThreadId::ALL
            .into_iter()
            .map(|thread| (thread, self.current_tip(thread)))
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{Txid, hashes::Hash};

    use super::*;

    fn tip(n: u8) -> OutputRef {
        OutputRef::new(Txid::from_byte_array([n; 32]), 0)
    }

    fn registry() -> ThreadRegistry {
        ThreadRegistry::new(&GenesisThreadTips {
            root: tip(1),
            provision: tip(2),
            issue: tip(3),
        })
    }

    #[test]
    fn test_lookup() {
        let reg = registry();
        assert_eq!(reg.current_tip(ThreadId::Provision), tip(2));
        assert_eq!(reg.thread_for(&tip(3)), Some(ThreadId::Issue));
        assert_eq!(reg.thread_for(&tip(4)), None);
    }

    #[test]
    fn test_advance() {
        let mut reg = registry();
        reg.advance(ThreadId::Root, tip(1), tip(9)).unwrap();
        assert_eq!(reg.current_tip(ThreadId::Root), tip(9));
        assert_eq!(reg.thread_for(&tip(1)), None);
        assert_eq!(reg.thread_for(&tip(9)), Some(ThreadId::Root));
    }

    #[test]
    fn test_advance_stale_tip() {
        let mut reg = registry();
        let err = reg.advance(ThreadId::Issue, tip(1), tip(9)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::StaleTip {
                thread: ThreadId::Issue,
                expected: tip(3),
                got: tip(1),
            }
        );
        assert_eq!(reg.current_tip(ThreadId::Issue), tip(3));
    }
}
