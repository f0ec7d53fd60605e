//! Rejection taxonomy.
//!
//! Every rejection is terminal: re-validating the same transaction against
//! the same state yields the same reason.

use bitcoin::{OutPoint, Txid};
use keystone_admin_state::{KeySetError, RegistryError, StateError};
use keystone_primitives::KeyId;
use thiserror::Error;

/// Why a transaction was not accepted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("TX rejected: {0}")]
    Structural(#[from] StructuralError),

    #[error("TX rejected: {0}")]
    ThreadState(#[from] ThreadStateError),

    #[error("TX rejected: {0}")]
    KeySet(#[from] KeySetError),

    #[error("TX rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("TX rejected: {0}")]
    Value(#[from] ValueError),
}

/// Stable coarse classification of a [`RejectReason`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RejectKind {
    Structural,
    ThreadState,
    KeySet,
    Signature,
    Value,
}

impl RejectReason {
    pub fn kind(&self) -> RejectKind {
        match self {
            RejectReason::Structural(_) => RejectKind::Structural,
            RejectReason::ThreadState(_) => RejectKind::ThreadState,
            RejectReason::KeySet(_) => RejectKind::KeySet,
            RejectReason::Signature(_) => RejectKind::Signature,
            RejectReason::Value(_) => RejectKind::Value,
        }
    }
}

impl From<RegistryError> for RejectReason {
    fn from(value: RegistryError) -> Self {
        RejectReason::ThreadState(value.into())
    }
}

impl From<StateError> for RejectReason {
    fn from(value: StateError) -> Self {
        match value {
            StateError::KeySet(e) => RejectReason::KeySet(e),
            StateError::Registry(e) => e.into(),
            StateError::SupplyOutOfRange => ValueError::SupplyOutOfRange.into(),
        }
    }
}

/// A block transaction failed validation, so the whole block is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("block transaction {index} ({txid}) rejected: {reason}")]
pub struct BlockRejection {
    /// Position among the block's non-coinbase transactions.
    pub index: usize,
    pub txid: Txid,
    pub reason: RejectReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("coinbase transaction")]
    Coinbase,

    #[error("transaction contains duplicate inputs")]
    DuplicateInputs,

    #[error("transaction output {0}: admin output only allowed at position 0.")]
    ThreadOutputPosition(usize),

    #[error("admin transaction with invalid admin operation found.")]
    InvalidAdminOperation,

    #[error("admin transaction with more than 1 input.")]
    TooManyInputs,

    #[error("admin transaction with no admin operations.")]
    NoAdminOperations,

    #[error(
        "admin transaction destroying funds must have exactly one data-carrier output, found {0}"
    )]
    DestroyOutputCount(usize),

    #[error("transaction is not of an allowed form")]
    NotAllowedForm,

    #[error(
        "output {outpoint} referenced from transaction {txid} either does not exist or has \
         already been spent"
    )]
    MissingInput { outpoint: OutPoint, txid: Txid },

    #[error("transaction {txid} tries to spend unspendable output {outpoint}")]
    UnspendableInput { outpoint: OutPoint, txid: Txid },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ThreadStateError {
    #[error(
        "transaction {0} spends admin output, yet does not continue admin thread. Should have \
         admin output at position 0."
    )]
    NotContinued(Txid),

    #[error("transaction {0} is spending wrong thread.")]
    WrongThread(Txid),

    #[error("transaction {0} spends more than one thread tip")]
    MultipleTips(Txid),

    #[error("admin transaction does not spend thread tip")]
    TipNotSpent,

    #[error("admin transaction must spend thread tip with input 0")]
    TipNotFirstInput,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Only the input index is rendered; the cause is kept for logging.
    #[error("failed to validate input {input}")]
    InvalidInput {
        input: usize,
        cause: SignatureFailure,
    },
}

/// Detail of a failed input authorisation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignatureFailure {
    #[error("witness is not a list of key and signature pairs")]
    MalformedWitness,

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature hash type is not SIGHASH_ALL")]
    SighashType,

    #[error("signature does not verify")]
    BadSignature,

    #[error("signer is not allowed to sign this input")]
    UnknownSigner,

    #[error("signer appears more than once")]
    DuplicateSigner,

    #[error("{have} signers of {need} required")]
    NotEnoughSigners { have: usize, need: usize },

    #[error("spent output script cannot be signed for")]
    UnsignableScript,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error(
        "total value of all transaction outputs is {total} which is higher than max allowed \
         value of {max}"
    )]
    OutputsAboveMaxMoney { total: u64, max: u64 },

    #[error("admin transaction with non-zero value output #{0}.")]
    NonZeroAdminOutput(usize),

    #[error("trying to issue 0 at output #{0}")]
    ZeroIssue(usize),

    #[error(
        "issuing {amount} would raise total supply to {supply} which is higher than max allowed \
         value of {max}"
    )]
    SupplyAboveMaxMoney { amount: u64, supply: u64, max: u64 },

    #[error("admin transaction tries to destroy funds without spending any")]
    DestroyWithoutInputs,

    #[error("destroying {amount} exceeds total supply of {supply}")]
    DestroyAboveSupply { amount: u64, supply: u64 },

    #[error(
        "total value of all transaction inputs for transaction {txid} is {inputs} which is less \
         than the amount spent of {outputs}"
    )]
    InsufficientInputs { txid: Txid, inputs: u64, outputs: u64 },

    #[error("output {index} has unknown keyID {key_id}")]
    UnknownKeyId { index: usize, key_id: KeyId },

    #[error("transaction fee {fee} is greater than the maximum fee limit {max}")]
    FeeTooHigh { fee: u64, max: u64 },

    #[error(
        "tried to spend coinbase transaction output {outpoint} from height {coinbase_height} at \
         height {spend_height} before required maturity of {maturity} blocks"
    )]
    ImmatureCoinbase {
        outpoint: OutPoint,
        coinbase_height: u64,
        spend_height: u64,
        maturity: u64,
    },

    #[error("total supply out of range")]
    SupplyOutOfRange,
}
