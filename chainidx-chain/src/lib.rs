//! Wire-level chain types shared by the peer driver, the sync manager, and
//! the storage layer: hashes, heights, block/transaction shapes, the
//! transparent (Bitcoin-inherited) input/output/address types, and the
//! per-network `ChainParams` that parameterize address encoding and
//! genesis data across supported chain families.

pub mod block;
pub mod compactint;
pub mod parameters;
pub mod serialization;
pub mod transaction;
pub mod transparent;

pub use serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};
