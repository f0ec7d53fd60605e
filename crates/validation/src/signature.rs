//! Input authorisation.
//!
//! The witness of an input is a flat list of `(compressed pubkey, DER
//! signature ‖ sighash byte)` pairs. Each signature commits to the segwit v0
//! digest of the input, computed over the spent output's script and value
//! with `SIGHASH_ALL`.

use std::collections::BTreeSet;

use bitcoin::{
    EcdsaSighashType, Transaction, TxOut, ecdsa, hashes::Hash, sighash::SighashCache,
};
use keystone_admin_state::AspKeySet;
use keystone_primitives::AdminPubkey;
use keystone_script::{ADDRESS_THRESHOLD, Address};
use secp256k1::{Message, SECP256K1};

use crate::errors::{SignatureError, SignatureFailure};

/// Who may sign an input and how many of them must.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SignerPolicy {
    /// Every key of the set must sign.
    All(BTreeSet<AdminPubkey>),

    /// At least `threshold` distinct keys matching the address slots must sign.
    Address {
        address: Address,
        /// Live ASP keys for the two id slots. A revoked id yields `None`.
        asp_keys: [Option<AdminPubkey>; 2],
        threshold: usize,
    },
}

impl SignerPolicy {
    /// Resolves the signers of an address against the current ASP keys.
    pub(crate) fn for_address(address: Address, asp: &AspKeySet) -> Self {
        let asp_keys = address.key_ids().map(|id| asp.get(id).copied());
        SignerPolicy::Address {
            address,
            asp_keys,
            threshold: ADDRESS_THRESHOLD,
        }
    }

    fn allows(&self, key: &AdminPubkey) -> bool {
        match self {
            SignerPolicy::All(keys) => keys.contains(key),
            SignerPolicy::Address {
                address, asp_keys, ..
            } => key.key_hash() == *address.owner() || asp_keys.contains(&Some(*key)),
        }
    }

    fn required(&self) -> usize {
        match self {
            SignerPolicy::All(keys) => keys.len(),
            SignerPolicy::Address { threshold, .. } => *threshold,
        }
    }
}

/// Checks the witness of input `input` against `policy`.
pub(crate) fn verify_input(
    tx: &Transaction,
    input: usize,
    prevout: &TxOut,
    policy: &SignerPolicy,
) -> Result<(), SignatureError> {
    check_witness(tx, input, prevout, policy)
        .map_err(|cause| SignatureError::InvalidInput { input, cause })
}

fn check_witness(
    tx: &Transaction,
    input: usize,
    prevout: &TxOut,
    policy: &SignerPolicy,
) -> Result<(), SignatureFailure> {
    let witness = &tx
        .input
        .get(input)
        .ok_or(SignatureFailure::MalformedWitness)?
        .witness;
    if witness.len() % 2 != 0 {
        return Err(SignatureFailure::MalformedWitness);
    }

    let sighash = SighashCache::new(tx)
        .p2wsh_signature_hash(
            input,
            &prevout.script_pubkey,
            prevout.value,
            EcdsaSighashType::All,
        )
        .map_err(|_| SignatureFailure::MalformedWitness)?;
    let msg = Message::from_digest(sighash.to_byte_array());

    let items: Vec<&[u8]> = witness.iter().collect();
    let mut signers = BTreeSet::new();
    for pair in items.chunks_exact(2) {
        let key =
            AdminPubkey::from_slice(pair[0]).map_err(|_| SignatureFailure::MalformedWitness)?;
        let sig = ecdsa::Signature::from_slice(pair[1])
            .map_err(|_| SignatureFailure::MalformedSignature)?;
        if sig.sighash_type != EcdsaSighashType::All {
            return Err(SignatureFailure::SighashType);
        }
        if !policy.allows(&key) {
            return Err(SignatureFailure::UnknownSigner);
        }
        SECP256K1
            .verify_ecdsa(&msg, &sig.signature, key.inner())
            .map_err(|_| SignatureFailure::BadSignature)?;
        if !signers.insert(key) {
            return Err(SignatureFailure::DuplicateSigner);
        }
    }

    let need = policy.required();
    if signers.len() < need {
        return Err(SignatureFailure::NotEnoughSigners {
            have: signers.len(),
            need,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bitcoin::{Amount, OutPoint, ScriptBuf, Txid, Witness};
    use keystone_primitives::{KeyId, ThreadId};
    use keystone_script::thread_script;

    use super::*;
    use crate::test_utils::{TestKey, sign_input, spend_tx};

    fn thread_prevout() -> TxOut {
        TxOut {
            value: Amount::ZERO,
            script_pubkey: thread_script(ThreadId::Root),
        }
    }

    fn all_of(keys: &[&TestKey]) -> SignerPolicy {
        SignerPolicy::All(keys.iter().map(|k| k.pubkey()).collect())
    }

    fn unsigned() -> Transaction {
        spend_tx(
            vec![OutPoint::new(Txid::from_byte_array([1; 32]), 0)],
            vec![TxOut {
                value: Amount::ZERO,
                script_pubkey: ScriptBuf::new(),
            }],
        )
    }

    #[test]
    fn test_all_signers_required() {
        let (a, b) = (TestKey::from_seed(1), TestKey::from_seed(2));
        let prevout = thread_prevout();
        let policy = all_of(&[&a, &b]);

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&a, &b]);
        assert_eq!(verify_input(&tx, 0, &prevout, &policy), Ok(()));

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&a]);
        assert_eq!(
            verify_input(&tx, 0, &prevout, &policy),
            Err(SignatureError::InvalidInput {
                input: 0,
                cause: SignatureFailure::NotEnoughSigners { have: 1, need: 2 }
            })
        );
    }

    #[test]
    fn test_outsider_and_duplicate_signers() {
        let (a, b, c) = (
            TestKey::from_seed(1),
            TestKey::from_seed(2),
            TestKey::from_seed(3),
        );
        let prevout = thread_prevout();
        let policy = all_of(&[&a, &b]);

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&a, &b, &c]);
        assert!(matches!(
            verify_input(&tx, 0, &prevout, &policy),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::UnknownSigner,
                ..
            })
        ));

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&a, &a]);
        assert!(matches!(
            verify_input(&tx, 0, &prevout, &policy),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::DuplicateSigner,
                ..
            })
        ));
    }

    #[test]
    fn test_signature_commits_to_prevout_value() {
        let (a, b) = (TestKey::from_seed(1), TestKey::from_seed(2));
        let prevout = thread_prevout();
        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&a, &b]);

        let other = TxOut {
            value: Amount::from_sat(1),
            ..prevout
        };
        assert!(matches!(
            verify_input(&tx, 0, &other, &all_of(&[&a, &b])),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::BadSignature,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_witness() {
        let a = TestKey::from_seed(1);
        let prevout = thread_prevout();
        let mut tx = unsigned();
        tx.input[0].witness = Witness::from_slice(&[a.pubkey().to_bytes().to_vec()]);
        assert!(matches!(
            verify_input(&tx, 0, &prevout, &all_of(&[&a])),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::MalformedWitness,
                ..
            })
        ));

        tx.input[0].witness =
            Witness::from_slice(&[a.pubkey().to_bytes().to_vec(), vec![0x30, 0x01, 0x01]]);
        assert!(matches!(
            verify_input(&tx, 0, &prevout, &all_of(&[&a])),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::MalformedSignature,
                ..
            })
        ));
    }

    #[test]
    fn test_address_two_of_three() {
        let (owner, asp1, asp2) = (
            TestKey::from_seed(1),
            TestKey::from_seed(2),
            TestKey::from_seed(3),
        );
        let asp = AspKeySet::with_keys(KeyId::new(1), [asp1.pubkey(), asp2.pubkey()]).unwrap();
        let addr = Address::new(owner.pubkey().key_hash(), [KeyId::new(1), KeyId::new(2)]);
        let prevout = TxOut {
            value: Amount::from_sat(1000),
            script_pubkey: addr.to_script(),
        };
        let policy = SignerPolicy::for_address(addr, &asp);

        for pair in [[&owner, &asp1], [&owner, &asp2], [&asp1, &asp2]] {
            let mut tx = unsigned();
            sign_input(&mut tx, 0, &prevout, &pair);
            assert_eq!(verify_input(&tx, 0, &prevout, &policy), Ok(()));
        }

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&owner]);
        assert!(verify_input(&tx, 0, &prevout, &policy).is_err());
    }

    #[test]
    fn test_address_revoked_slot_contributes_no_signer() {
        let (owner, asp1, asp2) = (
            TestKey::from_seed(1),
            TestKey::from_seed(2),
            TestKey::from_seed(3),
        );
        let mut asp =
            AspKeySet::with_keys(KeyId::new(1), [asp1.pubkey(), asp2.pubkey()]).unwrap();
        asp.revoke(&asp2.pubkey(), KeyId::new(2)).unwrap();
        let addr = Address::new(owner.pubkey().key_hash(), [KeyId::new(1), KeyId::new(2)]);
        let prevout = TxOut {
            value: Amount::from_sat(1000),
            script_pubkey: addr.to_script(),
        };
        let policy = SignerPolicy::for_address(addr, &asp);

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&owner, &asp2]);
        assert!(matches!(
            verify_input(&tx, 0, &prevout, &policy),
            Err(SignatureError::InvalidInput {
                cause: SignatureFailure::UnknownSigner,
                ..
            })
        ));

        let mut tx = unsigned();
        sign_input(&mut tx, 0, &prevout, &[&owner, &asp1]);
        assert_eq!(verify_input(&tx, 0, &prevout, &policy), Ok(()));
    }
}
