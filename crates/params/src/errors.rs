use std::io;

use keystone_primitives::AdminPubkey;
use thiserror::Error;
use toml::de::Error as TomlError;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("toml: {0}")]
    Toml(#[from] TomlError),

    #[error("min_thread_keys must be at least 1")]
    ZeroMinThreadKeys,

    #[error("root key set has {have} keys, at least {need} required")]
    TooFewRootKeys { have: usize, need: usize },

    #[error("duplicate key {key} in {set}")]
    DuplicateKey { set: &'static str, key: AdminPubkey },

    #[error("genesis thread tips must be distinct outpoints")]
    SharedThreadTip,

    #[error("max_fee exceeds max_money")]
    MaxFeeAboveMaxMoney,

    #[error("asp_base_key_id must be nonzero")]
    ZeroAspBaseKeyId,
}
