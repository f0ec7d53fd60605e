use borsh::{BorshDeserialize, BorshSerialize};
use keystone_primitives::{AdminPubkey, KeyCategory};
use keystone_script::{AdminOperation, KeyTarget};

use crate::{
    errors::KeySetError,
    keyset::{AspKeySet, KeySet},
};

/// The four mutable admin key collections.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct KeyStore {
    provision: KeySet,
    issue: KeySet,
    validate: KeySet,
    asp: AspKeySet,
}

impl KeyStore {
    pub fn new(provision: KeySet, issue: KeySet, validate: KeySet, asp: AspKeySet) -> Self {
        Self {
            provision,
            issue,
            validate,
            asp,
        }
    }

    pub fn provision(&self) -> &KeySet {
        &self.provision
    }

    pub fn issue(&self) -> &KeySet {
        &self.issue
    }

    pub fn validate(&self) -> &KeySet {
        &self.validate
    }

    pub fn asp(&self) -> &AspKeySet {
        &self.asp
    }

    /// Number of live keys in `category`.
    pub fn count(&self, category: KeyCategory) -> usize {
        match category {
            KeyCategory::Provision => self.provision.len(),
            KeyCategory::Issue => self.issue.len(),
            KeyCategory::Validate => self.validate.len(),
            KeyCategory::Asp => self.asp.len(),
        }
    }

    /// Live keys of `category`, ASP keys in id order.
    pub fn keys(&self, category: KeyCategory) -> Vec<AdminPubkey> {
        match category {
            KeyCategory::Provision => self.provision.iter().copied().collect(),
            KeyCategory::Issue => self.issue.iter().copied().collect(),
            KeyCategory::Validate => self.validate.iter().copied().collect(),
            KeyCategory::Asp => self.asp.iter().map(|(_, k)| *k).collect(),
        }
    }

    /// Applies a single operation. On error the store is unchanged.
    pub fn apply(&mut self, op: &AdminOperation) -> Result<(), KeySetError> {
        match op {
            AdminOperation::Add(target) => match *target {
                KeyTarget::Provision(key) => self.provision.add(key),
                KeyTarget::Issue(key) => self.issue.add(key),
                KeyTarget::Validate(key) => self.validate.add(key),
                KeyTarget::Asp(key, id) => self.asp.add(key, id),
            },
            AdminOperation::Revoke(target) => match target {
                KeyTarget::Provision(key) => self.provision.revoke(key),
                KeyTarget::Issue(key) => self.issue.revoke(key),
                KeyTarget::Validate(key) => self.validate.revoke(key),
                KeyTarget::Asp(key, id) => self.asp.revoke(key, *id),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use keystone_primitives::KeyId;
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    use super::*;

    fn key(seed: u8) -> AdminPubkey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        PublicKey::from_secret_key(SECP256K1, &sk).into()
    }

    fn store() -> KeyStore {
        KeyStore::new(
            KeySet::new([key(1), key(2)]),
            KeySet::new([key(3)]),
            KeySet::default(),
            AspKeySet::with_keys(KeyId::new(1), [key(4), key(5)]).unwrap(),
        )
    }

    #[test]
    fn test_apply_routes_by_category() {
        let mut store = store();
        store
            .apply(&AdminOperation::Add(KeyTarget::Validate(key(6))))
            .unwrap();
        store
            .apply(&AdminOperation::Revoke(KeyTarget::Provision(key(1))))
            .unwrap();
        store
            .apply(&AdminOperation::Add(KeyTarget::Asp(key(6), KeyId::new(3))))
            .unwrap();

        assert_eq!(store.count(KeyCategory::Validate), 1);
        assert_eq!(store.count(KeyCategory::Provision), 1);
        assert_eq!(store.keys(KeyCategory::Asp), vec![key(4), key(5), key(6)]);
        assert_eq!(store.count(KeyCategory::Issue), 1);
    }

    #[test]
    fn test_apply_error_leaves_store() {
        let mut store = store();
        let before = store.clone();
        assert_eq!(
            store.apply(&AdminOperation::Revoke(KeyTarget::Issue(key(9)))),
            Err(KeySetError::MissingKey)
        );
        assert_eq!(store, before);
    }
}
