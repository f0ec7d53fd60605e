//! Consensus parameters for the admin engine, loaded from TOML.

mod errors;
mod params;
pub mod serde_helpers;

pub use errors::ParamsError;
pub use params::{
    ChainParams, DEFAULT_ASP_BASE_KEY_ID, DEFAULT_COINBASE_MATURITY, DEFAULT_MAX_FEE,
    DEFAULT_MAX_MONEY, DEFAULT_MIN_THREAD_KEYS, GenesisThreadTips,
};
