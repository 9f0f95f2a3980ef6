use std::{fmt, io};

use serde::{Deserialize, Serialize};

use crate::serialization::{sha256d, BitcoinDeserialize, BitcoinSerialize, SerializationError};

use super::Header;

/// A hash of a block, used to identify blocks and link blocks into a chain.
///
/// Technically this is the sha256d hash of a block *header*, but since the
/// header includes the transaction Merkle root, it binds the entire
/// contents of the block and is used to identify entire blocks.
///
/// Displayed in big-endian byte order, following the `u256` convention
/// Bitcoin-family chains use for block and transaction hashes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub fn from_bytes(bytes: [u8; 32]) -> Hash {
        Hash(bytes)
    }
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
        f.debug_tuple("block::Hash")
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
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        Ok(Hash(<[u8; 32]>::bitcoin_deserialize(&mut reader)?))
    }
}

impl<'a> From<&'a Header> for Hash {
    fn from(header: &'a Header) -> Self {
        let mut hash_writer = sha256d::Writer::default();
        header
            .bitcoin_serialize(&mut hash_writer)
            .expect("hashing a header is infallible");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrips_through_from_str() {
        let hash = Hash([7u8; 32]);
        let text = hash.to_string();
        let parsed: Hash = text.parse().unwrap();
        assert_eq!(hash, parsed);
    }
}
