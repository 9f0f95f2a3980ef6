//! The persisted index record shapes. These are distinct from the wire
//! shapes in `chainidx_chain`: ingestion maps one onto the other.

use serde::{Deserialize, Serialize};

/// A block as recorded in the index: either the accepted representative of
/// its height on the main chain, or a retained orphan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: String,
    pub height: u64,
    pub previous_hash: String,
    pub version: i32,
    pub merkle_root: String,
    /// Unix epoch seconds, taken from the header's timestamp field.
    pub time: i64,
    pub bits: u32,
    pub nonce: u32,
    pub is_orphan: bool,
    pub tx_hashes: Vec<String>,
}

/// A confirmed transaction, as recorded in the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub version: i32,
    pub lock_time: u32,
    /// The containing block's hash. Cleared (empty string) while the
    /// transaction's block is orphaned.
    pub block_hash: String,
    pub vin: Vec<Vin>,
    pub vout: Vec<Vout>,
}

/// A transaction input, recording what it spends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vin {
    pub prev_tx_hash: String,
    pub prev_tx_index: u32,
    pub sequence: u32,
    /// Hex-encoded unlocking script (empty for a coinbase input).
    pub script_sig: String,
    /// Comma-joined hex-encoded witness stack items, empty if none.
    pub witness: String,
}

impl Vin {
    /// The coinbase sentinel outpoint this `Vin` spends, if it is one.
    pub fn is_coinbase(&self) -> bool {
        self.prev_tx_hash == "0".repeat(64) && self.prev_tx_index == 0xffff_ffff
    }
}

/// One confirmed spend: a previously-unspent outpoint now consumed by
/// `spending_tx_hash`. Used by [`crate::storage::Storage::remove_utxos`]
/// instead of the parallel-array form a non-typed language would use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spend {
    pub prev_tx_hash: String,
    pub prev_tx_index: u32,
    pub spending_tx_hash: String,
}

/// A transaction output, and its resolved spender address if standard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vout {
    pub tx_hash: String,
    pub index: u32,
    /// Hex-encoded locking script.
    pub script_pubkey: String,
    pub value: i64,
    /// The script template name (`pubkeyhash`, `scripthash`, `nulldata`, ...).
    pub script_type: String,
    /// Resolved spender address, or empty if the script is non-standard or
    /// has no address encoding (e.g. a witness script hash on this indexer).
    pub address: String,
}
