//! Daemon configuration: a TOML file on disk, overridable by the
//! `DB_PATH` / `PEER_URL` / `NETWORK` environment variables named in the
//! external-interfaces contract.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use chainidx_chain::parameters::{ChainFamily, Network};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("invalid peer address {0:?}: {1}")]
    PeerAddr(String, std::net::AddrParseError),
    #[error("unknown network {0:?}, expected one of mainnet, testnet, regtest")]
    Network(String),
    #[error("unknown chain {0:?}, expected one of bitcoin, dogecoin, litecoin")]
    Chain(String),
}

/// On-disk / environment representation. Every field is optional so a
/// partial config file can be layered under environment overrides and
/// built-in defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub db_path: Option<PathBuf>,
    pub peer_url: Option<String>,
    pub network: Option<String>,
    pub chain: Option<String>,
}

impl RawConfig {
    fn from_file(path: &Path) -> Result<RawConfig, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_owned(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_owned(), e))
    }

    /// Lays environment variables over whatever was already set (by a
    /// config file or the type's defaults).
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("DB_PATH") {
            self.db_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("PEER_URL") {
            self.peer_url = Some(v);
        }
        if let Ok(v) = std::env::var("NETWORK") {
            self.network = Some(v);
        }
        if let Ok(v) = std::env::var("CHAIN") {
            self.chain = Some(v);
        }
    }
}

/// Fully resolved configuration the daemon runs with.
#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub peer_addr: SocketAddr,
    pub network: Network,
    pub chain: ChainFamily,
}

impl Config {
    /// Builds the effective configuration: built-in defaults, then an
    /// optional TOML file, then environment variables, each layer
    /// overriding the last.
    pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut raw = match config_path {
            Some(path) => RawConfig::from_file(path)?,
            None => RawConfig::default(),
        };
        raw.apply_env();

        let network = match raw.network.as_deref().unwrap_or("mainnet") {
            "mainnet" => Network::Mainnet,
            "testnet" => Network::Testnet,
            "regtest" => Network::Regtest,
            other => return Err(ConfigError::Network(other.to_owned())),
        };
        let chain = match raw.chain.as_deref().unwrap_or("bitcoin") {
            "bitcoin" => ChainFamily::Bitcoin,
            "dogecoin" => ChainFamily::Dogecoin,
            "litecoin" => ChainFamily::Litecoin,
            other => return Err(ConfigError::Chain(other.to_owned())),
        };
        let peer_url = raw
            .peer_url
            .unwrap_or_else(|| "127.0.0.1:8333".to_owned());
        let peer_addr = peer_url
            .parse()
            .map_err(|e| ConfigError::PeerAddr(peer_url, e))?;
        let db_path = raw.db_path.unwrap_or_else(default_db_path);

        Ok(Config {
            db_path,
            peer_addr,
            network,
            chain,
        })
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chainidx")
}
