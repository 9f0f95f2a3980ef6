//! Storage-layer error kinds.

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] sled::Error),

    #[error("no row found for key {0:?}")]
    NotFound(Vec<u8>),

    #[error("malformed stored record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("corrupt index entry: {0}")]
    Corrupt(String),

    #[error("no latest height has been recorded yet")]
    LatestHeightAbsent,

    #[error("no chain tip hash has been recorded yet")]
    TipHashAbsent,

    #[error("no transaction found for hash {0}")]
    TxNotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
