//! Storage configuration: where the sled database lives on disk, and how
//! aggressively it flushes its write-ahead log.

use std::path::PathBuf;

use chainidx_chain::parameters::{ChainFamily, ChainParams};

/// Storage configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory under which a per-(family, network) sled database is
    /// opened.
    pub db_path: PathBuf,
    /// How often sled flushes its write-ahead log, in milliseconds.
    /// `None` uses sled's own default. Bulk sync favors a longer interval
    /// (or disabling the throttle entirely) to avoid the flush becoming the
    /// ingest bottleneck; see `chainidx_sync::manager`.
    pub flush_every_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            db_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chainidx"),
            flush_every_ms: Some(1000),
        }
    }
}

impl Config {
    /// Builds the sled configuration for the given chain's database,
    /// rooted at a subdirectory named for its family and network.
    pub fn sled_config(&self, params: &ChainParams) -> sled::Config {
        let path = self
            .db_path
            .join(family_dir(params.family))
            .join(params.network.to_string());

        let mut config = sled::Config::new().path(path);
        if let Some(ms) = self.flush_every_ms {
            config = config.flush_every_ms(Some(ms));
        }
        config
    }
}

fn family_dir(family: ChainFamily) -> &'static str {
    match family {
        ChainFamily::Bitcoin => "bitcoin",
        ChainFamily::Dogecoin => "dogecoin",
        ChainFamily::Litecoin => "litecoin",
    }
}
