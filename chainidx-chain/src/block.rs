//! Blocks and block-related structures (heights, headers, hashes).

mod hash;
mod header;
mod height;

use std::{convert::TryInto, fmt, io::Read, sync::Arc};

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};

pub use hash::Hash;
pub use header::Header;
pub use height::Height;

use crate::compactint::CompactInt;
use crate::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};
use crate::transaction::Transaction;

/// Upper bound on a serialized block's size, used only to sanity-check an
/// attacker-controlled transaction count before allocating for it. Generous
/// enough to cover every supported chain family's consensus block-size limit.
const MAX_BLOCK_BYTES: u64 = 32_000_000;

/// A block: a header plus its list of transactions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Arc<Transaction>>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("hash", &self.hash().to_string())
            .field("tx_count", &self.transactions.len())
            .finish()
    }
}

impl Block {
    /// Computes the hash of this block (the hash of its header).
    pub fn hash(&self) -> Hash {
        Hash::from(&self.header)
    }

    /// Parses a block out of a growable buffer, hashing the header directly
    /// off the wire bytes rather than re-serializing it.
    pub fn deserialize_from_buf(src: &mut BytesMut) -> Result<Self, SerializationError> {
        let header = Header::deserialize_from_buf(src.split_to(Header::len()))?;

        let mut body = src.reader().take(MAX_BLOCK_BYTES - Header::len() as u64);
        let tx_count = CompactInt::bitcoin_deserialize(&mut body)?.value();

        // Sanity check to prevent a malicious peer from making us allocate
        // for an implausibly large transaction count: every transaction
        // needs at least one input, and an input is at least 36 bytes.
        if tx_count > MAX_BLOCK_BYTES / 36 {
            return Err(SerializationError::Parse(
                "block contained too many transactions for each to have at least one input",
            ));
        }
        let mut transactions = Vec::with_capacity(
            tx_count
                .try_into()
                .expect("usize::MAX must be greater than MAX_BLOCK_BYTES / 36"),
        );
        for _ in 0..tx_count {
            transactions.push(<Arc<Transaction>>::bitcoin_deserialize(&mut body)?);
        }

        Ok(Block {
            header,
            transactions,
        })
    }
}

impl BitcoinSerialize for Block {
    fn bitcoin_serialize<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
        self.header.bitcoin_serialize(&mut target)?;
        self.transactions.bitcoin_serialize(&mut target)?;
        Ok(())
    }
}

impl<T: BitcoinSerialize> BitcoinSerialize for Arc<T> {
    fn bitcoin_serialize<W: std::io::Write>(&self, target: W) -> Result<(), std::io::Error> {
        (**self).bitcoin_serialize(target)
    }
}

impl<T: BitcoinDeserialize> BitcoinDeserialize for Arc<T> {
    fn bitcoin_deserialize<R: Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Arc::new(T::bitcoin_deserialize(reader)?))
    }
}

impl BitcoinDeserialize for Block {
    fn bitcoin_deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let header = Header::bitcoin_deserialize(&mut reader)?;
        let transactions = Vec::<Arc<Transaction>>::bitcoin_deserialize(&mut reader)?;
        Ok(Block {
            header,
            transactions,
        })
    }
}
