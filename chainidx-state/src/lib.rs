//! The embedded storage layer: a sled-backed ordered byte map, the flat key
//! schema built on top of it, and the typed block/transaction/UTXO/address
//! operations the sync manager and RPC read surface both call through.

pub mod config;
pub mod error;
pub mod kv;
pub mod model;
pub mod schema;
pub mod storage;

pub use config::Config;
pub use error::{Result, StorageError};
pub use storage::Storage;
