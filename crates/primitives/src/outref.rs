//! Borsh-friendly wrapper around [`OutPoint`].

use std::fmt;

use bitcoin::{OutPoint, Txid, hashes::Hash};
use borsh::{
    BorshDeserialize, BorshSerialize,
    io::{self, Read, Write},
};
use serde::{Deserialize, Serialize};

/// Reference to a transaction output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRef(OutPoint);

impl OutputRef {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self(OutPoint::new(txid, vout))
    }

    pub fn outpoint(&self) -> &OutPoint {
        &self.0
    }

    pub fn txid(&self) -> Txid {
        self.0.txid
    }

    pub fn vout(&self) -> u32 {
        self.0.vout
    }
}

impl From<OutPoint> for OutputRef {
    fn from(value: OutPoint) -> Self {
        Self(value)
    }
}

impl From<OutputRef> for OutPoint {
    fn from(value: OutputRef) -> Self {
        value.0
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl BorshSerialize for OutputRef {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.0.txid.as_byte_array())?;
        BorshSerialize::serialize(&self.0.vout, writer)
    }
}

impl BorshDeserialize for OutputRef {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut txid = [0u8; 32];
        reader.read_exact(&mut txid)?;
        let vout = u32::deserialize_reader(reader)?;
        Ok(Self::new(Txid::from_byte_array(txid), vout))
    }
}
