//! Admin public keys and ASP key identifiers.

use std::{cmp::Ordering, fmt, str::FromStr};

use bitcoin::{CompressedPublicKey, PubkeyHash};
use borsh::{
    BorshDeserialize, BorshSerialize,
    io::{self, Read, Write},
};
use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::errors::KeyParseError;

/// Length of a compressed secp256k1 public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// A compressed secp256k1 public key held in one of the admin key sets.
///
/// Serialized as the 33-byte SEC1 compressed encoding (borsh) or its hex
/// string (serde).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdminPubkey(PublicKey);

impl AdminPubkey {
    pub fn new(key: PublicKey) -> Self {
        Self(key)
    }

    /// Parses a 33-byte compressed encoding.  Uncompressed keys are rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyParseError> {
        if bytes.len() != COMPRESSED_PUBKEY_LEN {
            return Err(KeyParseError::InvalidLength(bytes.len()));
        }
        PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyParseError::InvalidKey)
    }

    pub fn inner(&self) -> &PublicKey {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; COMPRESSED_PUBKEY_LEN] {
        self.0.serialize()
    }

    /// HASH160 of the compressed encoding, as used by address owner slots.
    pub fn key_hash(&self) -> PubkeyHash {
        CompressedPublicKey(self.0).pubkey_hash()
    }
}

impl From<PublicKey> for AdminPubkey {
    fn from(value: PublicKey) -> Self {
        Self(value)
    }
}

// Ordered by encoding so that key set iteration is deterministic across nodes.
impl PartialOrd for AdminPubkey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AdminPubkey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl fmt::Display for AdminPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for AdminPubkey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyParseError::InvalidHex)?;
        Self::from_slice(&bytes)
    }
}

impl BorshSerialize for AdminPubkey {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

impl BorshDeserialize for AdminPubkey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; COMPRESSED_PUBKEY_LEN];
        reader.read_exact(&mut buf)?;
        Self::from_slice(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Serialize for AdminPubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AdminPubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Sequence id under which an ASP key is registered.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct KeyId(u32);

impl KeyId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id following this one, if it fits.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl From<u32> for KeyId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use secp256k1::{SECP256K1, SecretKey};

    use super::*;

    fn key(seed: u8) -> AdminPubkey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        AdminPubkey::new(PublicKey::from_secret_key(SECP256K1, &sk))
    }

    #[test]
    fn test_hex_parse_matches_display() {
        let pk = key(7);
        let parsed: AdminPubkey = pk.to_string().parse().unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn test_rejects_uncompressed_encoding() {
        let sk = SecretKey::from_slice(&[3; 32]).unwrap();
        let uncompressed = PublicKey::from_secret_key(SECP256K1, &sk).serialize_uncompressed();
        assert_eq!(
            AdminPubkey::from_slice(&uncompressed),
            Err(KeyParseError::InvalidLength(65))
        );
    }

    #[test]
    fn test_rejects_point_off_curve() {
        let mut bytes = [0xffu8; COMPRESSED_PUBKEY_LEN];
        bytes[0] = 0x02;
        assert_eq!(AdminPubkey::from_slice(&bytes), Err(KeyParseError::InvalidKey));
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let pk = key(9);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{pk}\""));
        let back: AdminPubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_borsh_encoding_is_raw_key_bytes() {
        let pk = key(11);
        let encoded = borsh::to_vec(&pk).unwrap();
        assert_eq!(encoded, pk.to_bytes().to_vec());
        assert_eq!(borsh::from_slice::<AdminPubkey>(&encoded).unwrap(), pk);
    }

    #[test]
    fn test_key_id_next() {
        assert_eq!(KeyId::new(3).checked_next(), Some(KeyId::new(4)));
        assert_eq!(KeyId::new(u32::MAX).checked_next(), None);
    }
}
