use keystone_primitives::KeyParseError;
use thiserror::Error;

/// Failures decoding or building the scripts the engine recognises.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script is not a data-carrier script")]
    NotNullData,

    #[error("empty admin payload")]
    EmptyPayload,

    #[error("unknown admin opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("admin payload for opcode {op:#04x} must be {expected} bytes, got {got}")]
    PayloadLength { op: u8, expected: usize, got: usize },

    #[error("invalid key in admin payload: {0}")]
    InvalidKey(#[from] KeyParseError),

    #[error("data-carrier payload of {0} bytes exceeds limit of 80 bytes")]
    PayloadTooLarge(usize),
}
