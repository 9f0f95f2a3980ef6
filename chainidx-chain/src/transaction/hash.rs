use std::{fmt, io};

use serde::{Deserialize, Serialize};

use crate::serialization::{sha256d, BitcoinDeserialize, BitcoinSerialize, SerializationError};

use super::Transaction;

/// A transaction hash (sha256d of the non-witness serialization).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero sentinel used as the previous-outpoint hash of a
    /// coinbase input, and as the synthetic tx hash of the genesis
    /// coinbase record this indexer writes at startup.
    pub const COINBASE_SENTINEL: Hash = Hash([0u8; 32]);
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed_bytes = self.0;
        reversed_bytes.reverse();
        f.write_str(&hex::encode(&reversed_bytes))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed_bytes = self.0;
        reversed_bytes.reverse();
        f.debug_tuple("transaction::Hash")
            .field(&hex::encode(&reversed_bytes))
            .finish()
    }
}

impl BitcoinSerialize for Hash {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(&self.0)
    }
}

impl BitcoinDeserialize for Hash {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Hash(<[u8; 32]>::bitcoin_deserialize(&mut reader)?))
    }
}

impl<'a> From<&'a Transaction> for Hash {
    fn from(tx: &'a Transaction) -> Self {
        let mut hash_writer = sha256d::Writer::default();
        tx.bitcoin_serialize_non_witness(&mut hash_writer)
            .expect("hashing a transaction is infallible");
        Self(hash_writer.finish())
    }
}

impl std::str::FromStr for Hash {
    type Err = SerializationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        if hex::decode_to_slice(s, &mut bytes[..]).is_err() {
            Err(SerializationError::Parse("hex decoding error"))
        } else {
            bytes.reverse();
            Ok(Hash(bytes))
        }
    }
}
