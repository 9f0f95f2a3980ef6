use bytes::Buf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serialization::{sha256d, BitcoinDeserialize, BitcoinSerialize, SerializationError};

use super::Hash;

/// A block header: the 80-byte, hashable summary of a block's contents.
///
/// Blocks chain together purely through `previous_block_hash`. Each points
/// backwards to its parent, all the way to the genesis block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The block's version field.
    pub version: i32,

    /// The hash of the previous block, chaining this block to its parent.
    pub previous_block_hash: Hash,

    /// The root of the transaction Merkle tree, binding the header to the
    /// block's transactions.
    pub merkle_root: [u8; 32],

    /// Unix epoch time (UTC) when the miner started hashing this header.
    pub time: DateTime<Utc>,

    /// The target threshold this header's hash must not exceed, encoded in
    /// Bitcoin's compact `nBits` format.
    pub bits: u32,

    /// Arbitrary field miners vary to search for a hash under `bits`.
    pub nonce: u32,
}

impl Header {
    /// Length of a serialized header in bytes.
    pub const fn len() -> usize {
        80
    }

    pub fn new(
        version: i32,
        previous_block_hash: Hash,
        merkle_root: [u8; 32],
        time: DateTime<Utc>,
        bits: u32,
        nonce: u32,
    ) -> Header {
        Header {
            version,
            previous_block_hash,
            merkle_root,
            time,
            bits,
            nonce,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }

    /// Deserializes a header from a `Buf`, hashing the raw 80 bytes directly
    /// rather than re-serializing the parsed fields to compute the hash.
    pub fn deserialize_from_buf<B: Buf>(mut src: B) -> Result<Self, SerializationError> {
        if src.remaining() < Header::len() {
            return Err(SerializationError::Parse(
                "not enough bytes in block header",
            ));
        }
        let raw = src.copy_to_bytes(Header::len());
        let mut hash_writer = sha256d::Writer::default();
        hash_writer.write_all(&raw[..])?;
        let _own_hash = Hash::from_bytes(hash_writer.finish());

        let mut cursor = std::io::Cursor::new(raw);
        Ok(Header {
            version: i32::bitcoin_deserialize(&mut cursor)?,
            previous_block_hash: Hash::bitcoin_deserialize(&mut cursor)?,
            merkle_root: <[u8; 32]>::bitcoin_deserialize(&mut cursor)?,
            time: <DateTime<Utc>>::bitcoin_deserialize(&mut cursor)?,
            bits: u32::bitcoin_deserialize(&mut cursor)?,
            nonce: u32::bitcoin_deserialize(&mut cursor)?,
        })
    }
}

impl BitcoinSerialize for Header {
    fn bitcoin_serialize<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
        self.version.bitcoin_serialize(&mut target)?;
        self.previous_block_hash.bitcoin_serialize(&mut target)?;
        self.merkle_root.bitcoin_serialize(&mut target)?;
        self.time.bitcoin_serialize(&mut target)?;
        self.bits.bitcoin_serialize(&mut target)?;
        self.nonce.bitcoin_serialize(&mut target)?;
        Ok(())
    }
}

impl BitcoinDeserialize for Header {
    fn bitcoin_deserialize<R: std::io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Header {
            version: i32::bitcoin_deserialize(&mut reader)?,
            previous_block_hash: Hash::bitcoin_deserialize(&mut reader)?,
            merkle_root: <[u8; 32]>::bitcoin_deserialize(&mut reader)?,
            time: <DateTime<Utc>>::bitcoin_deserialize(&mut reader)?,
            bits: u32::bitcoin_deserialize(&mut reader)?,
            nonce: u32::bitcoin_deserialize(&mut reader)?,
        })
    }
}
