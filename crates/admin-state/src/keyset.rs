//! Key collections mutated by admin operations.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use keystone_primitives::{AdminPubkey, KeyId};

use crate::errors::KeySetError;

/// An unordered set of admin keys with no duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct KeySet {
    keys: BTreeSet<AdminPubkey>,
}

impl KeySet {
    pub fn new(keys: impl IntoIterator<Item = AdminPubkey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: &AdminPubkey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdminPubkey> {
        self.keys.iter()
    }

    pub fn add(&mut self, key: AdminPubkey) -> Result<(), KeySetError> {
        if !self.keys.insert(key) {
            return Err(KeySetError::KeyExists);
        }
        Ok(())
    }

    pub fn revoke(&mut self, key: &AdminPubkey) -> Result<(), KeySetError> {
        if !self.keys.remove(key) {
            return Err(KeySetError::MissingKey);
        }
        Ok(())
    }
}

/// ASP keys indexed by sequentially assigned ids.
///
/// Ids are handed out strictly in order starting at `base`. The last assigned
/// id is remembered even after its key is revoked so that no id is ever
/// reused.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AspKeySet {
    keys: BTreeMap<KeyId, AdminPubkey>,
    base: KeyId,
    last_key_id: Option<KeyId>,
}

impl AspKeySet {
    pub fn empty(base: KeyId) -> Self {
        Self {
            keys: BTreeMap::new(),
            base,
            last_key_id: None,
        }
    }

    /// Registers `keys` under consecutive ids starting at `base`.
    pub fn with_keys(
        base: KeyId,
        keys: impl IntoIterator<Item = AdminPubkey>,
    ) -> Result<Self, KeySetError> {
        let mut set = Self::empty(base);
        for key in keys {
            let id = set.next_key_id()?;
            set.add(key, id)?;
        }
        Ok(set)
    }

    pub fn base(&self) -> KeyId {
        self.base
    }

    pub fn last_key_id(&self) -> Option<KeyId> {
        self.last_key_id
    }

    /// The only id the next add may use.
    pub fn next_key_id(&self) -> Result<KeyId, KeySetError> {
        match self.last_key_id {
            Some(last) => last.checked_next().ok_or(KeySetError::AspIdExhausted),
            None => Ok(self.base),
        }
    }

    pub fn get(&self, id: KeyId) -> Option<&AdminPubkey> {
        self.keys.get(&id)
    }

    pub fn contains_id(&self, id: KeyId) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyId, &AdminPubkey)> {
        self.keys.iter().map(|(id, key)| (*id, key))
    }

    pub fn add(&mut self, key: AdminPubkey, id: KeyId) -> Result<(), KeySetError> {
        if self.keys.contains_key(&id) {
            return Err(KeySetError::AspIdExists(id));
        }
        let expected = self.next_key_id()?;
        if id != expected {
            return Err(KeySetError::AspIdOutOfOrder { id, expected });
        }
        self.keys.insert(id, key);
        self.last_key_id = Some(id);
        Ok(())
    }

    pub fn revoke(&mut self, key: &AdminPubkey, id: KeyId) -> Result<(), KeySetError> {
        match self.keys.get(&id) {
            None => Err(KeySetError::AspIdMissing(id)),
            Some(held) if held != key => Err(KeySetError::AspKeyMismatch(id)),
            Some(_) => {
                self.keys.remove(&id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    use super::*;

    fn key(seed: u8) -> AdminPubkey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        PublicKey::from_secret_key(SECP256K1, &sk).into()
    }

    #[test]
    fn test_key_set_add_revoke() {
        let mut set = KeySet::new([key(1)]);
        assert_eq!(set.add(key(1)), Err(KeySetError::KeyExists));
        set.add(key(2)).unwrap();
        assert_eq!(set.len(), 2);

        set.revoke(&key(1)).unwrap();
        assert_eq!(set.revoke(&key(1)), Err(KeySetError::MissingKey));
        assert!(!set.contains(&key(1)));
        assert!(set.contains(&key(2)));
    }

    #[test]
    fn test_asp_genesis_ids() {
        let set = AspKeySet::with_keys(KeyId::new(1), [key(1), key(2)]).unwrap();
        assert_eq!(set.get(KeyId::new(1)), Some(&key(1)));
        assert_eq!(set.get(KeyId::new(2)), Some(&key(2)));
        assert_eq!(set.last_key_id(), Some(KeyId::new(2)));
        assert_eq!(set.next_key_id(), Ok(KeyId::new(3)));
    }

    #[test]
    fn test_asp_empty_starts_at_base() {
        let set = AspKeySet::empty(KeyId::new(5));
        assert_eq!(set.next_key_id(), Ok(KeyId::new(5)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_asp_add_out_of_order() {
        let mut set = AspKeySet::with_keys(KeyId::new(1), [key(1), key(2)]).unwrap();
        assert_eq!(
            set.add(key(3), KeyId::new(4)),
            Err(KeySetError::AspIdOutOfOrder {
                id: KeyId::new(4),
                expected: KeyId::new(3)
            })
        );
        assert_eq!(
            set.add(key(3), KeyId::new(2)),
            Err(KeySetError::AspIdExists(KeyId::new(2)))
        );
        set.add(key(3), KeyId::new(3)).unwrap();
    }

    #[test]
    fn test_asp_same_key_under_several_ids() {
        let mut set = AspKeySet::with_keys(KeyId::new(1), [key(1), key(2)]).unwrap();
        set.add(key(1), KeyId::new(3)).unwrap();
        assert_eq!(set.len(), 3);
        set.revoke(&key(1), KeyId::new(1)).unwrap();
        assert_eq!(set.get(KeyId::new(3)), Some(&key(1)));
    }

    #[test]
    fn test_asp_revoke() {
        let mut set = AspKeySet::with_keys(KeyId::new(1), [key(1), key(2), key(3)]).unwrap();
        assert_eq!(
            set.revoke(&key(3), KeyId::new(7)),
            Err(KeySetError::AspIdMissing(KeyId::new(7)))
        );
        assert_eq!(
            set.revoke(&key(1), KeyId::new(3)),
            Err(KeySetError::AspKeyMismatch(KeyId::new(3)))
        );
        set.revoke(&key(3), KeyId::new(3)).unwrap();

        // Revoked ids are never handed out again.
        assert_eq!(set.next_key_id(), Ok(KeyId::new(4)));
        assert_eq!(
            set.add(key(3), KeyId::new(3)),
            Err(KeySetError::AspIdOutOfOrder {
                id: KeyId::new(3),
                expected: KeyId::new(4)
            })
        );
    }

    #[test]
    fn test_borsh_roundtrip_keeps_high_water_mark() {
        let mut set = AspKeySet::with_keys(KeyId::new(1), [key(1), key(2), key(3)]).unwrap();
        set.revoke(&key(3), KeyId::new(3)).unwrap();
        let decoded: AspKeySet = borsh::from_slice(&borsh::to_vec(&set).unwrap()).unwrap();
        assert_eq!(decoded, set);
        assert_eq!(decoded.next_key_id(), Ok(KeyId::new(4)));
    }

    #[derive(Clone, Debug)]
    enum AspStep {
        Add { seed: u8, skew: i8 },
        Revoke { pick: usize },
    }

    fn asp_step() -> impl Strategy<Value = AspStep> {
        prop_oneof![
            (1u8..20, -2i8..3).prop_map(|(seed, skew)| AspStep::Add { seed, skew }),
            any::<usize>().prop_map(|pick| AspStep::Revoke { pick }),
        ]
    }

    proptest! {
        // Assigned ids always form the contiguous range base..=last and live
        // ids never leave it.
        #[test]
        fn proptest_asp_ids_contiguous(steps in proptest::collection::vec(asp_step(), 0..40)) {
            let base = KeyId::new(1);
            let mut set = AspKeySet::empty(base);
            let mut assigned: Vec<KeyId> = Vec::new();

            for step in steps {
                match step {
                    AspStep::Add { seed, skew } => {
                        let next = set.next_key_id().unwrap().get() as i64;
                        let id = KeyId::new((next + skew as i64).max(0) as u32);
                        if set.add(key(seed), id).is_ok() {
                            assigned.push(id);
                        }
                    }
                    AspStep::Revoke { pick } => {
                        let live: Vec<_> = set.iter().map(|(id, k)| (id, *k)).collect();
                        if !live.is_empty() {
                            let (id, k) = live[pick % live.len()];
                            set.revoke(&k, id).unwrap();
                        }
                    }
                }

                let expected: Vec<KeyId> =
                    (0..assigned.len() as u32).map(|i| KeyId::new(base.get() + i)).collect();
                prop_assert_eq!(&assigned, &expected);
                prop_assert_eq!(set.last_key_id(), assigned.last().copied());
                for (id, _) in set.iter() {
                    prop_assert!(assigned.contains(&id));
                }
            }
        }
    }
}
