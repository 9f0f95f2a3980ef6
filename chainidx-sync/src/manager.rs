//! The sync manager: bootstraps the genesis block, maintains a peer
//! session, and drives block ingestion (including orphan handling and
//! reorganization) against storage.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tracing::{info, info_span, warn};

use chainidx_chain::block as chain_block;
use chainidx_chain::parameters::ChainParams;
use chainidx_network::{Message, Peer};
use chainidx_state::Storage;

use crate::error::{Backoff, Result, SyncError};
use crate::{ingest, locator, reorg};

/// A round's worth of `getblocks` replies before the request driver rebuilds
/// its locator from the (by-then-advanced) tip.
const BLOCKS_PER_ROUND: u32 = 500;

/// A round-level watchdog: if no block arrives in this long, the request
/// driver gives up waiting and rebuilds the locator anyway.
const ROUND_WATCHDOG: Duration = Duration::from_secs(60);

/// Everything the sync manager needs to drive a peer session.
#[derive(Clone)]
pub struct SyncConfig {
    pub peer_addr: SocketAddr,
    pub chain_params: ChainParams,
}

pub struct SyncManager {
    config: SyncConfig,
    storage: Storage,
}

impl SyncManager {
    pub fn new(config: SyncConfig, storage: Storage) -> SyncManager {
        SyncManager { config, storage }
    }

    /// Runs forever: bootstraps genesis once, then maintains a peer
    /// session, reconnecting with exponential backoff on every disconnect.
    /// Returns only on a storage failure, which is unrecoverable.
    pub async fn run(&self) -> Result<()> {
        bootstrap_genesis(&self.storage, &self.config.chain_params)?;

        let mut backoff = Backoff::new();
        loop {
            match self.run_session().await {
                Ok(()) => backoff.reset(),
                Err(SyncError::Storage(e)) => {
                    return Err(SyncError::Storage(e));
                }
                Err(e) => {
                    warn!(error = %e, "peer session ended, will reconnect");
                }
            }
            let wait = backoff.next();
            info!(?wait, "waiting before reconnecting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Runs one peer session to completion: connects, ingests blocks as
    /// they arrive, and returns once the peer disconnects or the consumer
    /// hits a fatal storage error.
    async fn run_session(&self) -> Result<()> {
        let peer = Peer::connect(self.config.peer_addr, self.config.chain_params.clone()).await?;

        let (block_tx, mut block_rx) = mpsc::unbounded_channel::<Arc<chain_block::Block>>();
        peer.on_message(move |msg| {
            if let Message::Block(block) = msg {
                let _ = block_tx.send(block);
            }
        });

        let processed = Arc::new(Notify::new());

        let consumer = async {
            while let Some(block) = block_rx.recv().await {
                let span = info_span!("ingest", hash = %block.hash());
                let _enter = span.enter();
                match ingest_block(&self.storage, &self.config.chain_params, &block) {
                    Ok(()) => {}
                    Err(e @ SyncError::Storage(_)) => return Err(e),
                    Err(e) => warn!(error = %e, "failed to ingest block, continuing"),
                }
                processed.notify_one();
            }
            Ok(())
        };

        let driver = async {
            while peer.connected() {
                let tip = self.storage.get_latest_height().unwrap_or(0);
                let heights = locator::locator_heights(tip);
                let locator = self
                    .storage
                    .get_blocks(&heights)
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .filter_map(|b| b.hash.parse::<chain_block::Hash>().ok())
                    .collect::<Vec<_>>();

                peer.push_get_blocks(locator, None);

                let mut received = 0u32;
                while received < BLOCKS_PER_ROUND && peer.connected() {
                    tokio::select! {
                        _ = processed.notified() => received += 1,
                        _ = tokio::time::sleep(ROUND_WATCHDOG) => break,
                    }
                }
            }
        };

        tokio::select! {
            res = consumer => res,
            _ = driver => Ok(()),
            _ = peer.wait_for_disconnect() => Ok(()),
        }
    }
}

/// Writes the genesis block and its sentinel coinbase transaction if
/// storage doesn't already have them, per the startup algorithm.
pub fn bootstrap_genesis(storage: &Storage, params: &ChainParams) -> Result<()> {
    let genesis_hash = params.genesis_hash().to_string();
    if storage.get_block(&genesis_hash)?.is_some() {
        return Ok(());
    }

    info!(hash = %genesis_hash, "bootstrapping genesis block");
    let header = &params.genesis_header;
    let sentinel_hash = "0".repeat(64);

    let genesis_block = chainidx_state::model::Block {
        hash: genesis_hash.clone(),
        height: 0,
        previous_hash: sentinel_hash.clone(),
        version: header.version,
        merkle_root: hex::encode(header.merkle_root),
        time: header.time.timestamp(),
        bits: header.bits,
        nonce: header.nonce,
        is_orphan: false,
        tx_hashes: vec![sentinel_hash.clone()],
    };
    storage.put_block(&genesis_block)?;

    let sentinel_tx = chainidx_state::model::Transaction {
        hash: sentinel_hash,
        version: 1,
        lock_time: 0,
        block_hash: genesis_hash,
        vin: Vec::new(),
        vout: Vec::new(),
    };
    storage.put_tx(&sentinel_tx)?;
    storage.set_latest_height(0)?;
    Ok(())
}

/// Applies one received block to storage: idempotency checks, parent
/// resolution (the main-chain/orphan/reorg cases), write-set application,
/// and tip advancement.
pub fn ingest_block(
    storage: &Storage,
    params: &ChainParams,
    wire_block: &chain_block::Block,
) -> Result<()> {
    let hash = wire_block.hash().to_string();

    if storage.block_exists(&hash)? {
        return Ok(());
    }
    if storage.get_orphan_block(&hash)?.is_some() {
        return Ok(());
    }

    let previous_hash = wire_block.header.previous_block_hash.to_string();

    let height = if let Some(prev) = storage.get_block(&previous_hash)? {
        let tip_height = storage.get_latest_height()?;
        if tip_height >= prev.height + 1 {
            store_orphan(storage, params, wire_block, prev.height + 1)?;
            return Ok(());
        }
        prev.height + 1
    } else if let Some(orphan_parent) = storage.get_orphan_block(&previous_hash)? {
        let tip_height = storage.get_latest_height()?;
        if tip_height <= orphan_parent.height + 1 {
            let ancestor_height = reorg::find_common_ancestor_height(storage, &previous_hash)?;
            reorg::reorganize(storage, ancestor_height, tip_height, orphan_parent.height)?;
            orphan_parent.height + 1
        } else {
            store_orphan(storage, params, wire_block, orphan_parent.height + 1)?;
            return Ok(());
        }
    } else {
        warn!(%hash, "received block with unresolvable parent; skipping");
        return Ok(());
    };

    let write_set = ingest::build_block_write_set(params, wire_block, height, false);
    storage.put_block(&write_set.block)?;
    storage.put_utxos(&write_set.new_outputs)?;
    storage.put_txs(&write_set.transactions)?;
    storage.remove_utxos(&write_set.spends)?;
    storage.set_latest_height(height)?;
    info!(height, %hash, "accepted block");
    Ok(())
}

/// Stores a block as an orphan: no UTXO effects, transactions carry an
/// empty `block_hash`.
fn store_orphan(
    storage: &Storage,
    params: &ChainParams,
    wire_block: &chain_block::Block,
    height: u64,
) -> Result<()> {
    let write_set = ingest::build_block_write_set(params, wire_block, height, true);
    storage.put_orphan_block(&write_set.block)?;
    storage.put_txs(&write_set.transactions)?;
    info!(height, hash = %write_set.block.hash, "stored orphan block");
    Ok(())
}
