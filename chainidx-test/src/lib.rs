//! Shared test fixtures: a tracing subscriber installed once per process,
//! and a throwaway sled-backed [`chainidx_state::Storage`] for tests that
//! need real persistence rather than mocks.

use std::sync::Once;

use chainidx_chain::parameters::ChainParams;
use chainidx_state::{Config, Storage};

static INIT: Once = Once::new();

/// Installs a test-scoped `tracing` subscriber. Safe to call from every
/// test; only the first call takes effect.
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "chainidx=debug".to_owned()),
            )
            .try_init();
    });
}

/// Opens a `Storage` rooted in a freshly-created temp directory, for the
/// given chain. The directory is removed when the returned guard drops.
pub fn temp_storage(params: &ChainParams) -> (Storage, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir for test storage");
    let config = Config {
        db_path: dir.path().to_path_buf(),
        flush_every_ms: None,
    };
    let storage = Storage::open(&config, params).expect("failed to open test storage");
    (storage, dir)
}
