use keystone_primitives::{KeyId, OutputRef, ThreadId};
use thiserror::Error;

/// Rejections raised while mutating a key set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeySetError {
    #[error("tries to remove non-existing key")]
    MissingKey,

    #[error("key exists already in admin set")]
    KeyExists,

    #[error("keyID {0} exists already in admin set. Operation rejected.")]
    AspIdExists(KeyId),

    #[error("keyID {id} rejected. should be {expected}")]
    AspIdOutOfOrder { id: KeyId, expected: KeyId },

    #[error("keyID {0} is not valid. It does not exist in admin set.")]
    AspIdMissing(KeyId),

    #[error("keyID {0} does not match key, can not be revoked in transaction")]
    AspKeyMismatch(KeyId),

    #[error("keyID {0} can not be revoked in transaction")]
    AspIdAddedAndRevoked(KeyId),

    #[error("keyID space exhausted")]
    AspIdExhausted,

    #[error("invalid chain state, at least {min} keys required for thread")]
    TooFewKeys { min: usize },
}

/// Rejections raised by the thread registry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("spends stale thread tip {got} of {thread} thread, current tip is {expected}")]
    StaleTip {
        thread: ThreadId,
        expected: OutputRef,
        got: OutputRef,
    },
}

/// Failures replaying a [`StateDelta`](crate::StateDelta) onto a state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    #[error(transparent)]
    KeySet(#[from] KeySetError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("total supply out of range")]
    SupplyOutOfRange,
}
