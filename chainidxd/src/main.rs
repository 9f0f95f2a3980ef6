//! `chainidxd` — connects to a single Bitcoin-family peer, syncs block
//! history into an embedded key-value store, and serves the read contract
//! a JSON-RPC layer would sit on top of.

mod config;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

use chainidx_chain::parameters::ChainParams;
use chainidx_state::Storage;
use chainidx_sync::{SyncConfig, SyncManager};

use config::Config;

#[derive(Parser, Debug)]
#[clap(name = "chainidxd", about = "Bitcoin-family block-chain indexer")]
struct Cli {
    /// Path to a TOML config file. DB_PATH / PEER_URL / NETWORK / CHAIN
    /// environment variables override whatever it sets.
    #[clap(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).wrap_err("failed to load configuration")?;

    tracing::info!(
        db_path = %config.db_path.display(),
        peer = %config.peer_addr,
        network = %config.network,
        "starting chainidxd",
    );

    let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start async runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let chain_params = ChainParams::for_family(config.chain, config.network);

    let storage_config = chainidx_state::Config {
        db_path: config.db_path,
        flush_every_ms: Some(1000),
    };
    let storage = Storage::open(&storage_config, &chain_params)
        .wrap_err("failed to open storage database")?;

    let sync_config = SyncConfig {
        peer_addr: config.peer_addr,
        chain_params,
    };
    let manager = SyncManager::new(sync_config, storage);

    manager
        .run()
        .await
        .wrap_err("sync manager exited with an unrecoverable error")
}
