//! Pay-to-address scripts.
//!
//! An address locks funds to a 2-of-3 over the owner key and two ASP keys
//! referenced by id:
//!
//! ```text
//! OP_2 <owner key hash:20> <key id:u32 LE> <key id:u32 LE> OP_3 OP_CHECKSAFEMULTISIG
//! ```

use bitcoin::{PubkeyHash, Script, ScriptBuf, hashes::Hash};
use keystone_primitives::KeyId;

/// Opcode terminating an address script.
pub const OP_CHECKSAFEMULTISIG: u8 = 0xba;

/// Signatures required to spend an address output.
pub const ADDRESS_THRESHOLD: usize = 2;

const OP_2: u8 = 0x52;
const OP_3: u8 = 0x53;
const HASH_PUSH: u8 = 20;
const KEY_ID_PUSH: u8 = 4;

/// Encoded length of an address script.
pub const ADDRESS_SCRIPT_LEN: usize = 34;

/// A decoded pay-to-address locking script.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    owner: PubkeyHash,
    key_ids: [KeyId; 2],
}

impl Address {
    pub fn new(owner: PubkeyHash, key_ids: [KeyId; 2]) -> Self {
        Self { owner, key_ids }
    }

    /// HASH160 of the owner's compressed key.
    pub fn owner(&self) -> &PubkeyHash {
        &self.owner
    }

    pub fn key_ids(&self) -> [KeyId; 2] {
        self.key_ids
    }

    /// An address naming the same ASP id twice has only two distinct signers
    /// and is never an allowed output.
    pub fn has_distinct_key_ids(&self) -> bool {
        self.key_ids[0] != self.key_ids[1]
    }

    pub fn to_script(&self) -> ScriptBuf {
        let mut buf = Vec::with_capacity(ADDRESS_SCRIPT_LEN);
        buf.push(OP_2);
        buf.push(HASH_PUSH);
        buf.extend_from_slice(self.owner.as_byte_array());
        for id in self.key_ids {
            buf.push(KEY_ID_PUSH);
            buf.extend_from_slice(&id.to_le_bytes());
        }
        buf.push(OP_3);
        buf.push(OP_CHECKSAFEMULTISIG);
        ScriptBuf::from_bytes(buf)
    }

    /// Recognises an address script by its exact byte layout.
    pub fn from_script(script: &Script) -> Option<Self> {
        let bytes = script.as_bytes();
        if bytes.len() != ADDRESS_SCRIPT_LEN {
            return None;
        }

        let (head, rest) = bytes.split_at(2);
        if head != [OP_2, HASH_PUSH] {
            return None;
        }
        let (hash, rest) = rest.split_at(20);
        let (id1, rest) = read_key_id(rest)?;
        let (id2, rest) = read_key_id(rest)?;
        if rest != [OP_3, OP_CHECKSAFEMULTISIG] {
            return None;
        }

        let owner = PubkeyHash::from_slice(hash).ok()?;
        Some(Self::new(owner, [id1, id2]))
    }
}

fn read_key_id(buf: &[u8]) -> Option<(KeyId, &[u8])> {
    match buf {
        [KEY_ID_PUSH, a, b, c, d, rest @ ..] => {
            Some((KeyId::from_le_bytes([*a, *b, *c, *d]), rest))
        }
        _ => None,
    }
}
