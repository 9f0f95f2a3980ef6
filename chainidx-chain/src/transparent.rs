//! Transparent (Bitcoin-inherited) transaction inputs, outputs, and scripts.

pub mod address;
pub mod script;

pub use address::Address;
pub use script::Script;

use std::io;

use serde::{Deserialize, Serialize};

use crate::compactint::CompactInt;
use crate::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};
use crate::transaction;

/// The sequence number a coinbase input carries if none is set explicitly.
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Arbitrary data a miner embeds in a coinbase transaction's synthetic input.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseData(pub Vec<u8>);

impl AsRef<[u8]> for CoinbaseData {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl CoinbaseData {
    pub fn serialized_size(&self) -> usize {
        CompactInt::size(self.0.len()) + self.0.len()
    }
}

impl std::fmt::Debug for CoinbaseData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CoinbaseData")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

/// A reference to a specific output of a specific transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct OutPoint {
    /// The transaction containing the referenced output.
    pub hash: transaction::Hash,
    /// Index of the referenced output within that transaction.
    pub index: u32,
}

impl OutPoint {
    pub const fn len() -> usize {
        36
    }

    /// The coinbase sentinel outpoint: an all-zero hash with index `0xFFFFFFFF`.
    pub fn is_coinbase_sentinel(&self) -> bool {
        self.hash.0 == [0u8; 32] && self.index == 0xffff_ffff
    }
}

impl BitcoinSerialize for OutPoint {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        self.hash.bitcoin_serialize(&mut target)?;
        self.index.bitcoin_serialize(&mut target)
    }
}

impl BitcoinDeserialize for OutPoint {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(OutPoint {
            hash: transaction::Hash::bitcoin_deserialize(&mut reader)?,
            index: u32::bitcoin_deserialize(&mut reader)?,
        })
    }
}

/// A transparent transaction input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// Spends a previous transaction's output.
    PrevOut {
        outpoint: OutPoint,
        unlock_script: Script,
        sequence: u32,
    },
    /// The single synthetic input of a coinbase transaction, creating new
    /// coin value rather than spending an existing output.
    Coinbase { data: CoinbaseData, sequence: u32 },
}

impl Input {
    pub fn len(&self) -> usize {
        match self {
            Input::PrevOut {
                unlock_script,
                sequence: _,
                ..
            } => OutPoint::len() + unlock_script.serialized_size() + 4,
            Input::Coinbase { data, sequence: _ } => OutPoint::len() + data.serialized_size() + 4,
        }
    }
}

impl BitcoinSerialize for Input {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        match self {
            Input::PrevOut {
                outpoint,
                unlock_script,
                sequence,
            } => {
                outpoint.bitcoin_serialize(&mut target)?;
                unlock_script.bitcoin_serialize(&mut target)?;
                sequence.bitcoin_serialize(&mut target)
            }
            Input::Coinbase { data, sequence } => {
                OutPoint {
                    hash: transaction::Hash([0u8; 32]),
                    index: 0xffff_ffff,
                }
                .bitcoin_serialize(&mut target)?;
                CompactInt::from(data.0.len()).bitcoin_serialize(&mut target)?;
                target.write_all(&data.0)?;
                sequence.bitcoin_serialize(&mut target)
            }
        }
    }
}

impl BitcoinDeserialize for Input {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let outpoint = OutPoint::bitcoin_deserialize(&mut reader)?;
        if outpoint.is_coinbase_sentinel() {
            let len = CompactInt::bitcoin_deserialize(&mut reader)?.value() as usize;
            let mut data = vec![0u8; len];
            io::Read::read_exact(&mut reader, &mut data)?;
            Ok(Input::Coinbase {
                data: CoinbaseData(data),
                sequence: u32::bitcoin_deserialize(&mut reader)?,
            })
        } else {
            Ok(Input::PrevOut {
                outpoint,
                unlock_script: Script::bitcoin_deserialize(&mut reader)?,
                sequence: u32::bitcoin_deserialize(&mut reader)?,
            })
        }
    }
}

/// A transparent transaction output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct Output {
    /// The output's value, in the chain's base unit (e.g. satoshis).
    pub value: i64,
    /// The locking script that defines the conditions under which this
    /// output can be spent.
    pub lock_script: Script,
}

impl Output {
    pub fn len(&self) -> usize {
        8 + self.lock_script.serialized_size()
    }
}

impl BitcoinSerialize for Output {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        self.value.bitcoin_serialize(&mut target)?;
        self.lock_script.bitcoin_serialize(&mut target)
    }
}

impl BitcoinDeserialize for Output {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Output {
            value: i64::bitcoin_deserialize(&mut reader)?,
            lock_script: Script::bitcoin_deserialize(&mut reader)?,
        })
    }
}
