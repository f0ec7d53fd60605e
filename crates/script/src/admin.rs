//! Admin operation payloads carried in data-carrier outputs.
//!
//! Wire format of the single push following `OP_RETURN`:
//!
//! ```text
//! op:u8 | pubkey:33 | key_id:u32 LE (ASP operations only)
//! ```

use bitcoin::{Script, ScriptBuf};
use borsh::{BorshDeserialize, BorshSerialize};
use keystone_primitives::{AdminPubkey, COMPRESSED_PUBKEY_LEN, KeyCategory, KeyId, ThreadId};

use crate::{
    errors::ScriptError,
    nulldata::{null_data_payload, null_data_script},
};

/// Whether an operation adds or removes a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum AdminAction {
    Add,
    Revoke,
}

/// The key an operation acts on, tagged by category.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum KeyTarget {
    Provision(AdminPubkey),
    Issue(AdminPubkey),
    Validate(AdminPubkey),
    Asp(AdminPubkey, KeyId),
}

impl KeyTarget {
    pub fn category(&self) -> KeyCategory {
        match self {
            KeyTarget::Provision(_) => KeyCategory::Provision,
            KeyTarget::Issue(_) => KeyCategory::Issue,
            KeyTarget::Validate(_) => KeyCategory::Validate,
            KeyTarget::Asp(..) => KeyCategory::Asp,
        }
    }

    pub fn key(&self) -> &AdminPubkey {
        match self {
            KeyTarget::Provision(k)
            | KeyTarget::Issue(k)
            | KeyTarget::Validate(k)
            | KeyTarget::Asp(k, _) => k,
        }
    }

    pub fn key_id(&self) -> Option<KeyId> {
        match self {
            KeyTarget::Asp(_, id) => Some(*id),
            _ => None,
        }
    }
}

/// A single key set mutation decoded from one output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum AdminOperation {
    Add(KeyTarget),
    Revoke(KeyTarget),
}

// Opcode dispatch table.
const OPCODES: [(u8, AdminAction, KeyCategory); 8] = [
    (0x01, AdminAction::Add, KeyCategory::Issue),
    (0x02, AdminAction::Revoke, KeyCategory::Issue),
    (0x03, AdminAction::Add, KeyCategory::Provision),
    (0x04, AdminAction::Revoke, KeyCategory::Provision),
    (0x11, AdminAction::Add, KeyCategory::Validate),
    (0x12, AdminAction::Revoke, KeyCategory::Validate),
    (0x13, AdminAction::Add, KeyCategory::Asp),
    (0x14, AdminAction::Revoke, KeyCategory::Asp),
];

const KEY_ID_LEN: usize = 4;

fn lookup_opcode(op: u8) -> Option<(AdminAction, KeyCategory)> {
    OPCODES
        .iter()
        .find(|(code, ..)| *code == op)
        .map(|(_, action, category)| (*action, *category))
}

fn opcode_for(action: AdminAction, category: KeyCategory) -> u8 {
    OPCODES
        .iter()
        .find(|(_, a, c)| *a == action && *c == category)
        .map(|(code, ..)| *code)
        .unwrap_or_else(|| unreachable!("opcode table covers every action and category"))
}

fn payload_len(category: KeyCategory) -> usize {
    match category {
        KeyCategory::Asp => 1 + COMPRESSED_PUBKEY_LEN + KEY_ID_LEN,
        _ => 1 + COMPRESSED_PUBKEY_LEN,
    }
}

impl AdminOperation {
    pub fn new(action: AdminAction, target: KeyTarget) -> Self {
        match action {
            AdminAction::Add => AdminOperation::Add(target),
            AdminAction::Revoke => AdminOperation::Revoke(target),
        }
    }

    pub fn action(&self) -> AdminAction {
        match self {
            AdminOperation::Add(_) => AdminAction::Add,
            AdminOperation::Revoke(_) => AdminAction::Revoke,
        }
    }

    pub fn target(&self) -> &KeyTarget {
        match self {
            AdminOperation::Add(t) | AdminOperation::Revoke(t) => t,
        }
    }

    pub fn category(&self) -> KeyCategory {
        self.target().category()
    }

    /// The thread authorised to carry this operation.
    pub fn required_thread(&self) -> ThreadId {
        self.category().managing_thread()
    }

    pub fn opcode(&self) -> u8 {
        opcode_for(self.action(), self.category())
    }

    /// Serializes the operation into its raw payload.
    pub fn encode_payload(&self) -> Vec<u8> {
        let target = self.target();
        let mut buf = Vec::with_capacity(payload_len(target.category()));
        buf.push(self.opcode());
        buf.extend_from_slice(&target.key().to_bytes());
        if let Some(id) = target.key_id() {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        buf
    }

    /// Decodes a raw payload, rejecting unknown opcodes and any length other
    /// than the exact one the opcode calls for.
    pub fn decode_payload(buf: &[u8]) -> Result<Self, ScriptError> {
        let (&op, _) = buf.split_first().ok_or(ScriptError::EmptyPayload)?;
        let (action, category) = lookup_opcode(op).ok_or(ScriptError::UnknownOpcode(op))?;

        let expected = payload_len(category);
        if buf.len() != expected {
            return Err(ScriptError::PayloadLength {
                op,
                expected,
                got: buf.len(),
            });
        }

        let key_end = 1 + COMPRESSED_PUBKEY_LEN;
        let key = AdminPubkey::from_slice(&buf[1..key_end])?;
        let target = match category {
            KeyCategory::Provision => KeyTarget::Provision(key),
            KeyCategory::Issue => KeyTarget::Issue(key),
            KeyCategory::Validate => KeyTarget::Validate(key),
            KeyCategory::Asp => {
                let mut id = [0u8; KEY_ID_LEN];
                id.copy_from_slice(&buf[key_end..]);
                KeyTarget::Asp(key, KeyId::from_le_bytes(id))
            }
        };

        Ok(Self::new(action, target))
    }

    /// Builds the data-carrier script holding this operation.
    pub fn to_script(&self) -> ScriptBuf {
        // Admin payloads are at most 38 bytes, well under the data-carrier limit.
        null_data_script(&self.encode_payload())
            .unwrap_or_else(|_| unreachable!("admin payload fits a data-carrier output"))
    }

    /// Decodes an operation from an output script.
    pub fn from_script(script: &Script) -> Result<Self, ScriptError> {
        let payload = null_data_payload(script).ok_or(ScriptError::NotNullData)?;
        Self::decode_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    use super::*;

    fn key(seed: u8) -> AdminPubkey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        PublicKey::from_secret_key(SECP256K1, &sk).into()
    }

    #[test]
    fn test_payload_layout() {
        let k = key(1);
        let op = AdminOperation::Add(KeyTarget::Asp(k, KeyId::new(3)));
        let payload = op.encode_payload();
        assert_eq!(payload.len(), 38);
        assert_eq!(payload[0], 0x13);
        assert_eq!(&payload[1..34], &k.to_bytes());
        assert_eq!(&payload[34..], &[3, 0, 0, 0]);

        let op = AdminOperation::Revoke(KeyTarget::Provision(k));
        let payload = op.encode_payload();
        assert_eq!(payload.len(), 34);
        assert_eq!(payload[0], 0x04);
    }

    #[test]
    fn test_every_opcode_decodes_from_script() {
        let k = key(2);
        let ops = [
            AdminOperation::Add(KeyTarget::Issue(k)),
            AdminOperation::Revoke(KeyTarget::Issue(k)),
            AdminOperation::Add(KeyTarget::Provision(k)),
            AdminOperation::Revoke(KeyTarget::Provision(k)),
            AdminOperation::Add(KeyTarget::Validate(k)),
            AdminOperation::Revoke(KeyTarget::Validate(k)),
            AdminOperation::Add(KeyTarget::Asp(k, KeyId::new(9))),
            AdminOperation::Revoke(KeyTarget::Asp(k, KeyId::new(9))),
        ];
        for op in ops {
            assert_eq!(AdminOperation::from_script(&op.to_script()), Ok(op));
        }
    }

    #[test]
    fn test_unknown_opcode() {
        let mut payload = AdminOperation::Add(KeyTarget::Issue(key(3))).encode_payload();
        payload[0] = 0x05;
        assert_eq!(
            AdminOperation::decode_payload(&payload),
            Err(ScriptError::UnknownOpcode(0x05))
        );
    }

    #[test]
    fn test_length_must_match_opcode() {
        // An ASP opcode without its key id.
        let mut payload = AdminOperation::Add(KeyTarget::Validate(key(4))).encode_payload();
        payload[0] = 0x13;
        assert_eq!(
            AdminOperation::decode_payload(&payload),
            Err(ScriptError::PayloadLength {
                op: 0x13,
                expected: 38,
                got: 34
            })
        );

        // A non-ASP opcode with trailing bytes.
        let mut payload = AdminOperation::Add(KeyTarget::Validate(key(4))).encode_payload();
        payload.push(0);
        assert!(matches!(
            AdminOperation::decode_payload(&payload),
            Err(ScriptError::PayloadLength { got: 35, .. })
        ));
    }

    #[test]
    fn test_garbage_payloads() {
        assert_eq!(
            AdminOperation::decode_payload(&[]),
            Err(ScriptError::EmptyPayload)
        );
        assert_eq!(
            AdminOperation::decode_payload(&hex::decode("deadbeef").unwrap()),
            Err(ScriptError::UnknownOpcode(0xde))
        );

        let mut bad_key = vec![0x11, 0x02];
        bad_key.extend_from_slice(&[0xff; 32]);
        assert!(matches!(
            AdminOperation::decode_payload(&bad_key),
            Err(ScriptError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_from_script_requires_nulldata() {
        let script = ScriptBuf::from_bytes(vec![0x00, 0xbb]);
        assert_eq!(
            AdminOperation::from_script(&script),
            Err(ScriptError::NotNullData)
        );
    }

    #[test]
    fn test_required_thread() {
        let k = key(5);
        assert_eq!(
            AdminOperation::Add(KeyTarget::Issue(k)).required_thread(),
            ThreadId::Root
        );
        assert_eq!(
            AdminOperation::Revoke(KeyTarget::Asp(k, KeyId::new(1))).required_thread(),
            ThreadId::Provision
        );
    }
}
