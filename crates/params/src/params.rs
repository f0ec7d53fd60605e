use std::{collections::BTreeSet, fs, path::Path};

use bitcoin::Amount;
use keystone_primitives::{AdminPubkey, KeyId, OutputRef, ThreadId};
use serde::{Deserialize, Serialize};

use crate::{errors::ParamsError, serde_helpers::serde_amount_sat};

/// Default value for `max_money`: 21 million coins of 1e8 base units.
pub const DEFAULT_MAX_MONEY: Amount = Amount::from_sat(2_100_000_000_000_000);

/// Default value for `max_fee` on regular transactions.
pub const DEFAULT_MAX_FEE: Amount = Amount::from_sat(5_000_000);

/// Default number of blocks before a coinbase output may be spent.
pub const DEFAULT_COINBASE_MATURITY: u64 = 100;

/// Default minimum number of keys the governing set of a thread must hold.
pub const DEFAULT_MIN_THREAD_KEYS: usize = 2;

/// Default id handed to the first ASP key.
pub const DEFAULT_ASP_BASE_KEY_ID: KeyId = KeyId::new(1);

fn default_max_money() -> Amount {
    DEFAULT_MAX_MONEY
}

fn default_max_fee() -> Amount {
    DEFAULT_MAX_FEE
}

fn default_coinbase_maturity() -> u64 {
    DEFAULT_COINBASE_MATURITY
}

fn default_min_thread_keys() -> usize {
    DEFAULT_MIN_THREAD_KEYS
}

fn default_asp_base_key_id() -> KeyId {
    DEFAULT_ASP_BASE_KEY_ID
}

/// Genesis outpoints of the three admin threads.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GenesisThreadTips {
    pub root: OutputRef,
    pub provision: OutputRef,
    pub issue: OutputRef,
}

impl GenesisThreadTips {
    pub fn get(&self, thread: ThreadId) -> OutputRef {
        match thread {
            ThreadId::Root => self.root,
            ThreadId::Provision => self.provision,
            ThreadId::Issue => self.issue,
        }
    }
}

/// Consensus parameters for the admin engine.
///
/// Root keys are fixed for the lifetime of the chain; every other key set
/// starts from the genesis lists given here and evolves through admin
/// transactions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Keys that must all sign root thread transactions.
    pub root_keys: Vec<AdminPubkey>,

    /// ASP keys registered at genesis, assigned ids from `asp_base_key_id` in
    /// order.
    #[serde(default)]
    pub genesis_asp_keys: Vec<AdminPubkey>,

    #[serde(default)]
    pub genesis_provision_keys: Vec<AdminPubkey>,

    #[serde(default)]
    pub genesis_issue_keys: Vec<AdminPubkey>,

    #[serde(default)]
    pub genesis_validate_keys: Vec<AdminPubkey>,

    pub genesis_thread_tips: GenesisThreadTips,

    /// Ceiling for any single output, any transaction's output total and the
    /// total supply.
    #[serde(with = "serde_amount_sat", default = "default_max_money")]
    pub max_money: Amount,

    /// Largest fee a regular transaction may pay.
    #[serde(with = "serde_amount_sat", default = "default_max_fee")]
    pub max_fee: Amount,

    #[serde(default = "default_coinbase_maturity")]
    pub coinbase_maturity: u64,

    #[serde(default = "default_min_thread_keys")]
    pub min_thread_keys: usize,

    #[serde(default = "default_asp_base_key_id")]
    pub asp_base_key_id: KeyId,
}

impl ChainParams {
    /// Parses params from TOML and checks they are well formed.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let params: ChainParams = toml::from_str(s)?;
        params.check_well_formed()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Checks invariants serde cannot express.
    pub fn check_well_formed(&self) -> Result<(), ParamsError> {
        if self.min_thread_keys == 0 {
            return Err(ParamsError::ZeroMinThreadKeys);
        }

        if self.root_keys.len() < self.min_thread_keys {
            return Err(ParamsError::TooFewRootKeys {
                have: self.root_keys.len(),
                need: self.min_thread_keys,
            });
        }

        for (name, keys) in [
            ("root_keys", &self.root_keys),
            ("genesis_provision_keys", &self.genesis_provision_keys),
            ("genesis_issue_keys", &self.genesis_issue_keys),
            ("genesis_validate_keys", &self.genesis_validate_keys),
        ] {
            let mut seen = BTreeSet::new();
            if let Some(dup) = keys.iter().find(|k| !seen.insert(**k)) {
                return Err(ParamsError::DuplicateKey {
                    set: name,
                    key: *dup,
                });
            }
        }

        let tips = &self.genesis_thread_tips;
        if tips.root == tips.provision || tips.root == tips.issue || tips.provision == tips.issue
        {
            return Err(ParamsError::SharedThreadTip);
        }

        if self.max_fee > self.max_money {
            return Err(ParamsError::MaxFeeAboveMaxMoney);
        }

        if self.asp_base_key_id.get() == 0 {
            return Err(ParamsError::ZeroAspBaseKeyId);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bitcoin::{Txid, hashes::Hash};
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    use super::*;

    fn key(seed: u8) -> AdminPubkey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        PublicKey::from_secret_key(SECP256K1, &sk).into()
    }

    fn tip(n: u8) -> OutputRef {
        OutputRef::new(Txid::from_byte_array([n; 32]), 0)
    }

    fn minimal_toml() -> String {
        format!(
            r#"
root_keys = ["{}", "{}"]
genesis_asp_keys = ["{}", "{}"]

[genesis_thread_tips]
root = "{}"
provision = "{}"
issue = "{}"
"#,
            key(1),
            key(2),
            key(1),
            key(2),
            tip(1),
            tip(2),
            tip(3),
        )
    }

    #[test]
    fn test_defaults_applied() {
        let params = ChainParams::from_toml_str(&minimal_toml()).unwrap();
        assert_eq!(params.max_money, DEFAULT_MAX_MONEY);
        assert_eq!(params.max_fee, DEFAULT_MAX_FEE);
        assert_eq!(params.coinbase_maturity, 100);
        assert_eq!(params.min_thread_keys, 2);
        assert_eq!(params.asp_base_key_id, KeyId::new(1));
        assert_eq!(params.root_keys, vec![key(1), key(2)]);
        assert_eq!(params.genesis_thread_tips.get(ThreadId::Issue), tip(3));
        assert!(params.genesis_provision_keys.is_empty());
    }

    #[test]
    fn test_overrides() {
        let raw = format!("max_fee = 10\ncoinbase_maturity = 5\n{}", minimal_toml());
        let params = ChainParams::from_toml_str(&raw).unwrap();
        assert_eq!(params.max_fee, Amount::from_sat(10));
        assert_eq!(params.coinbase_maturity, 5);
    }

    #[test]
    fn test_too_few_root_keys() {
        let mut params = ChainParams::from_toml_str(&minimal_toml()).unwrap();
        params.root_keys.truncate(1);
        assert!(matches!(
            params.check_well_formed(),
            Err(ParamsError::TooFewRootKeys { have: 1, need: 2 })
        ));
    }

    #[test]
    fn test_duplicate_root_key() {
        let mut params = ChainParams::from_toml_str(&minimal_toml()).unwrap();
        params.root_keys.push(key(1));
        assert!(matches!(
            params.check_well_formed(),
            Err(ParamsError::DuplicateKey { set: "root_keys", .. })
        ));
    }

    #[test]
    fn test_shared_thread_tip() {
        let mut params = ChainParams::from_toml_str(&minimal_toml()).unwrap();
        params.genesis_thread_tips.issue = params.genesis_thread_tips.root;
        assert!(matches!(
            params.check_well_formed(),
            Err(ParamsError::SharedThreadTip)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal_toml().as_bytes()).unwrap();
        let params = ChainParams::load(file.path()).unwrap();
        assert_eq!(params.genesis_asp_keys.len(), 2);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ChainParams::from_toml_str("root_keys = 5"),
            Err(ParamsError::Toml(_))
        ));
    }
}
