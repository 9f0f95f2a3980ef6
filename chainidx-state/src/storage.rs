//! Typed operations on blocks, transactions, and the UTXO/address indexes,
//! built on top of the flat [`crate::kv::Kv`] byte map.

use std::collections::HashSet;

use chainidx_chain::parameters::ChainParams;
use tracing::trace;

use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::kv::Kv;
use crate::model::{Block, Spend, Transaction, Vout};
use crate::schema;

pub struct Storage {
    kv: Kv,
}

impl Storage {
    pub fn open(config: &Config, params: &ChainParams) -> Result<Storage> {
        let db = config.sled_config(params).open()?;
        let tree = db.open_tree(b"index")?;
        Ok(Storage { kv: Kv::new(tree) })
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: Vec<u8>) -> Result<T> {
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    // ---- blocks ----

    pub fn block_exists(&self, hash: &str) -> Result<bool> {
        Ok(self.kv.get(schema::block_by_hash_key(hash))?.is_some())
    }

    pub fn get_block(&self, hash: &str) -> Result<Option<Block>> {
        match self.kv.get(schema::block_by_hash_key(hash))? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        match self.kv.get(schema::block_by_height_key(height))? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_orphan_block(&self, hash: &str) -> Result<Option<Block>> {
        match self.kv.get(schema::orphan_by_hash_key(hash))? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_orphan_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        match self.kv.get(schema::orphan_by_height_key(height))? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolves each height to its main-chain block, in input order.
    pub fn get_blocks(&self, heights: &[u64]) -> Result<Vec<Option<Block>>> {
        let keys = heights
            .iter()
            .map(|h| schema::block_by_height_key(*h))
            .collect();
        self.kv
            .get_multi(keys)?
            .into_iter()
            .map(|entry| entry.map(Self::decode).transpose())
            .collect()
    }

    /// Fetches every main-chain (or, if `orphans`, orphan) block whose
    /// height falls in `[start, end]`, skipping heights with no entry.
    pub fn get_blocks_range(&self, start: u64, end: u64, orphans: bool) -> Result<Vec<Block>> {
        let mut out = Vec::new();
        for height in start..=end {
            let block = if orphans {
                self.get_orphan_block_by_height(height)?
            } else {
                self.get_block_by_height(height)?
            };
            if let Some(block) = block {
                out.push(block);
            }
        }
        Ok(out)
    }

    pub fn put_block(&self, block: &Block) -> Result<()> {
        trace!(hash = %block.hash, height = block.height, "writing main-chain block");
        let bytes = Self::encode(block)?;
        self.kv.put(schema::block_by_hash_key(&block.hash), &bytes)?;
        self.kv
            .put(schema::block_by_height_key(block.height), &bytes)?;
        Ok(())
    }

    pub fn put_orphan_block(&self, block: &Block) -> Result<()> {
        trace!(hash = %block.hash, height = block.height, "writing orphan block");
        let bytes = Self::encode(block)?;
        self.kv
            .put(schema::orphan_by_hash_key(&block.hash), &bytes)?;
        self.kv
            .put(schema::orphan_by_height_key(block.height), &bytes)?;
        Ok(())
    }

    /// Deletes a block's main-chain entries. Used when orphaning during
    /// reorganization, immediately followed by `put_orphan_block`.
    pub fn remove_main_chain_block(&self, block: &Block) -> Result<()> {
        self.kv.delete(schema::block_by_hash_key(&block.hash))?;
        self.kv.delete(schema::block_by_height_key(block.height))?;
        Ok(())
    }

    /// Deletes a block's orphan entries. Used when un-orphaning during
    /// reorganization, immediately followed by `put_block`.
    pub fn remove_orphan_block(&self, block: &Block) -> Result<()> {
        self.kv.delete(schema::orphan_by_hash_key(&block.hash))?;
        self.kv
            .delete(schema::orphan_by_height_key(block.height))?;
        Ok(())
    }

    // ---- transactions ----

    pub fn get_tx(&self, hash: &str) -> Result<Option<Transaction>> {
        match self.kv.get(schema::tx_by_hash_key(hash))? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_txs(&self, hashes: &[String]) -> Result<Vec<Option<Transaction>>> {
        let keys = hashes.iter().map(|h| schema::tx_by_hash_key(h)).collect();
        self.kv
            .get_multi(keys)?
            .into_iter()
            .map(|entry| entry.map(Self::decode).transpose())
            .collect()
    }

    pub fn put_tx(&self, tx: &Transaction) -> Result<()> {
        let bytes = Self::encode(tx)?;
        self.kv.put(schema::tx_by_hash_key(&tx.hash), bytes)?;
        Ok(())
    }

    pub fn put_txs(&self, txs: &[Transaction]) -> Result<()> {
        let entries = txs
            .iter()
            .map(|tx| Ok((schema::tx_by_hash_key(&tx.hash), Self::encode(tx)?)))
            .collect::<Result<Vec<_>>>()?;
        self.kv.put_multi(entries)
    }

    // ---- UTXOs & address index ----

    /// Materializes the outputs a newly-accepted block produced: a UTXO
    /// entry, its `"pk"` inverse, and the address-touch index entry for
    /// each output with a resolved address.
    pub fn put_utxos(&self, outputs: &[Vout]) -> Result<()> {
        let mut entries = Vec::with_capacity(outputs.len() * 2);
        for output in outputs {
            entries.push((
                schema::utxo_key(&output.script_pubkey, &output.tx_hash, output.index),
                Self::encode(output)?,
            ));
            entries.push((
                schema::pk_inverse_key(&output.tx_hash, output.index),
                output.script_pubkey.clone().into_bytes(),
            ));
            if !output.address.is_empty() {
                entries.push((
                    schema::address_index_key(&output.script_pubkey, &output.tx_hash),
                    output.tx_hash.clone().into_bytes(),
                ));
            }
        }
        self.kv.put_multi(entries)
    }

    /// Applies a set of confirmed spends: looks up each spent outpoint's
    /// script-pubkey via the `"pk"` inverse, deletes its UTXO entry, and
    /// records the spending transaction in the address-touch index.
    /// Coinbase sentinel outpoints are skipped.
    pub fn remove_utxos(&self, spends: &[Spend]) -> Result<()> {
        let real_spends: Vec<&Spend> = spends
            .iter()
            .filter(|s| !(s.prev_tx_hash == "0".repeat(64) && s.prev_tx_index == 0xffff_ffff))
            .collect();
        if real_spends.is_empty() {
            return Ok(());
        }

        let pk_keys = real_spends
            .iter()
            .map(|s| schema::pk_inverse_key(&s.prev_tx_hash, s.prev_tx_index))
            .collect();
        let scripts = self.kv.get_multi(pk_keys)?;

        let mut deletes = Vec::new();
        let mut inserts = Vec::new();
        for (spend, script) in real_spends.iter().zip(scripts) {
            let script = match script {
                Some(bytes) => String::from_utf8(bytes)
                    .map_err(|_| StorageError::Corrupt("non-utf8 script in pk inverse index".into()))?,
                None => continue,
            };
            deletes.push(schema::utxo_key(
                &script,
                &spend.prev_tx_hash,
                spend.prev_tx_index,
            ));
            inserts.push((
                schema::address_index_key(&script, &spend.spending_tx_hash),
                spend.spending_tx_hash.clone().into_bytes(),
            ));
        }

        self.kv.delete_multi(deletes)?;
        self.kv.put_multi(inserts)
    }

    /// Reverses `remove_utxos` for the given outputs: re-materializes their
    /// UTXO entries. Used when orphaning a block whose transactions spent
    /// them, restoring the outputs those spends had consumed.
    pub fn restore_utxos(&self, outputs: &[Vout]) -> Result<()> {
        self.put_utxos(outputs)
    }

    /// Reverses `put_utxos` for the given outputs: deletes their UTXO entry
    /// and `"pk"` inverse. Used when a block that produced them is orphaned
    /// during reorganization. The address-touch index entry is left alone —
    /// the address legitimately was touched by this transaction regardless
    /// of the block's later fate.
    pub fn remove_outputs(&self, outputs: &[Vout]) -> Result<()> {
        let mut deletes = Vec::with_capacity(outputs.len() * 2);
        for output in outputs {
            deletes.push(schema::utxo_key(
                &output.script_pubkey,
                &output.tx_hash,
                output.index,
            ));
            deletes.push(schema::pk_inverse_key(&output.tx_hash, output.index));
        }
        self.kv.delete_multi(deletes)
    }

    pub fn get_utxos_by_script(&self, script_pubkey_hex: &str) -> Result<Vec<Vout>> {
        self.kv
            .scan_prefix(schema::utxo_prefix(script_pubkey_hex))?
            .into_iter()
            .map(|(_, value)| Self::decode(value))
            .collect()
    }

    pub fn get_txs_of_script(&self, script_pubkey_hex: &str) -> Result<Vec<Transaction>> {
        let entries = self
            .kv
            .scan_prefix(schema::address_index_prefix(script_pubkey_hex))?;

        let mut seen = HashSet::new();
        let mut hashes = Vec::new();
        for (_, value) in entries {
            let hash = String::from_utf8(value)
                .map_err(|_| StorageError::Corrupt("non-utf8 tx hash in address index".into()))?;
            if seen.insert(hash.clone()) {
                hashes.push(hash);
            }
        }

        self.get_txs(&hashes)?
            .into_iter()
            .map(|tx| tx.ok_or_else(|| StorageError::TxNotFound("address index entry with no tx row".into())))
            .collect()
    }

    // ---- chain tip ----

    pub fn get_latest_height(&self) -> Result<u64> {
        match self.kv.get(schema::latest_height_key())? {
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| StorageError::LatestHeightAbsent)?;
                text.parse().map_err(|_| StorageError::LatestHeightAbsent)
            }
            None => Err(StorageError::LatestHeightAbsent),
        }
    }

    pub fn set_latest_height(&self, height: u64) -> Result<()> {
        self.kv
            .put(schema::latest_height_key(), height.to_string().into_bytes())
    }

    pub fn get_latest_tip_hash(&self) -> Result<String> {
        let height = self
            .get_latest_height()
            .map_err(|_| StorageError::TipHashAbsent)?;
        self.get_block_by_height(height)?
            .map(|b| b.hash)
            .ok_or(StorageError::TipHashAbsent)
    }
}
