use thiserror::Error;

/// Errors from parsing admin key material.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("expected 33 byte compressed key, got {0} bytes")]
    InvalidLength(usize),

    #[error("bytes do not encode a valid secp256k1 point")]
    InvalidKey,
}
