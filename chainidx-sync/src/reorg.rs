//! Chain reorganization: switching the main chain from one branch to a
//! longer competing branch.
//!
//! Orphaning a block restores the UTXOs its transactions spent and removes
//! the ones it produced; un-orphaning one does the reverse. Together these
//! exactly mirror normal ingestion's `put_utxos`/`remove_utxos` pair run in
//! the opposite direction, so reorganizing never leaves the UTXO set out of
//! sync with whichever branch is currently main.

use tracing::info;

use chainidx_state::model::{Spend, Vout};
use chainidx_state::Storage;

use crate::error::{Result, SyncError};

/// Walks backward from `start_previous_hash` through the orphan chain until
/// a main-chain block is reached, returning its height — the common
/// ancestor of the orphan branch and the current main chain.
pub fn find_common_ancestor_height(storage: &Storage, start_previous_hash: &str) -> Result<u64> {
    let mut hash = start_previous_hash.to_owned();
    loop {
        if let Some(block) = storage.get_block(&hash)? {
            return Ok(block.height);
        }
        match storage.get_orphan_block(&hash)? {
            Some(orphan) => hash = orphan.previous_hash,
            None => return Err(SyncError::OrphanAncestorMissing),
        }
    }
}

/// Switches the main chain from the current branch, which runs through
/// `(ancestor_height, main_tip_height]`, to the orphan branch running
/// through `(ancestor_height, orphan_branch_height]`.
///
/// The caller is responsible for storing the block that triggered the
/// reorg (the new tip beyond `orphan_branch_height`) as a normal main-chain
/// extension afterward — this function only flips the status of blocks
/// already present in storage.
pub fn reorganize(
    storage: &Storage,
    ancestor_height: u64,
    main_tip_height: u64,
    orphan_branch_height: u64,
) -> Result<()> {
    info!(
        ancestor_height,
        main_tip_height, orphan_branch_height, "reorganizing"
    );

    for height in (ancestor_height + 1)..=main_tip_height {
        let block = match storage.get_block_by_height(height)? {
            Some(block) => block,
            None => continue,
        };
        orphan_block(storage, height, &block.hash, &block.tx_hashes)?;
    }

    for height in (ancestor_height + 1)..=orphan_branch_height {
        let block = match storage.get_orphan_block_by_height(height)? {
            Some(block) => block,
            None => continue,
        };
        unorphan_block(storage, height, &block.hash, &block.tx_hashes)?;
    }

    Ok(())
}

/// Demotes a main-chain block to orphan status: restores the UTXOs its
/// transactions' inputs consumed, removes the UTXO entries its own outputs
/// produced, and clears each transaction's `block_hash`.
fn orphan_block(
    storage: &Storage,
    height: u64,
    hash: &str,
    tx_hashes: &[String],
) -> Result<()> {
    let mut block = storage
        .get_block(hash)?
        .ok_or(SyncError::OrphanAncestorMissing)?;
    storage.remove_main_chain_block(&block)?;
    block.is_orphan = true;
    storage.put_orphan_block(&block)?;

    let mut restored = Vec::new();
    let mut produced = Vec::new();
    for tx_hash in tx_hashes {
        let mut tx = match storage.get_tx(tx_hash)? {
            Some(tx) => tx,
            None => continue,
        };
        for vin in &tx.vin {
            if vin.is_coinbase() {
                continue;
            }
            if let Some(funding_tx) = storage.get_tx(&vin.prev_tx_hash)? {
                if let Some(output) = funding_tx
                    .vout
                    .into_iter()
                    .find(|o| o.index == vin.prev_tx_index)
                {
                    restored.push(output);
                }
            }
        }
        produced.extend(tx.vout.clone());
        tx.block_hash = String::new();
        storage.put_tx(&tx)?;
    }
    storage.restore_utxos(&restored)?;
    storage.remove_outputs(&produced)?;

    info!(height, hash, "orphaned block");
    Ok(())
}

/// Promotes an orphan block to main-chain status: the inverse of
/// `orphan_block`. Re-materializes the UTXOs its transactions produced,
/// then applies its transactions' spends against them.
fn unorphan_block(
    storage: &Storage,
    height: u64,
    hash: &str,
    tx_hashes: &[String],
) -> Result<()> {
    let mut block = storage
        .get_orphan_block(hash)?
        .ok_or(SyncError::OrphanAncestorMissing)?;
    storage.remove_orphan_block(&block)?;
    block.is_orphan = false;
    storage.put_block(&block)?;

    let mut produced: Vec<Vout> = Vec::new();
    let mut spends: Vec<Spend> = Vec::new();
    for tx_hash in tx_hashes {
        let mut tx = match storage.get_tx(tx_hash)? {
            Some(tx) => tx,
            None => continue,
        };
        produced.extend(tx.vout.clone());
        for vin in &tx.vin {
            if vin.is_coinbase() {
                continue;
            }
            spends.push(Spend {
                prev_tx_hash: vin.prev_tx_hash.clone(),
                prev_tx_index: vin.prev_tx_index,
                spending_tx_hash: tx_hash.clone(),
            });
        }
        tx.block_hash = hash.to_owned();
        storage.put_tx(&tx)?;
    }
    storage.put_utxos(&produced)?;
    storage.remove_utxos(&spends)?;

    info!(height, hash, "un-orphaned block");
    Ok(())
}
