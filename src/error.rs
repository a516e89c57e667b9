//! Error types for the client-side sync machinery and the backing stores.

use thiserror::Error;

use crate::room::RoomCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCodeError {
    #[error("room code must be {expected} digits, got {actual} characters")]
    WrongLength { expected: usize, actual: usize },

    #[error("room code must contain digits only")]
    NotDigits,
}

/// Room document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} has no document")]
    NotFound(RoomCode),

    #[error("network is disabled")]
    Offline,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    Socket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("store rejected request with status {0}")]
    Rejected(u16),

    #[error("invalid store address: {0}")]
    Address(#[from] url::ParseError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Blob store errors.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("blob store rejected request with status {0}")]
    Rejected(u16),
}

pub type BlobResult<T> = std::result::Result<T, BlobError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider rejected request with status {0}")]
    Rejected(u16),

    #[error("invalid identity address: {0}")]
    Address(#[from] url::ParseError),
}

/// Per-file outcome of the file exchange channel.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{name} is too large ({size} bytes, max {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("failed to upload {name}: {source}")]
    Upload {
        name: String,
        #[source]
        source: BlobError,
    },

    #[error("failed to register {name}: {source}")]
    Commit {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("could not remove {name}: {source}")]
    Remove {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("could not clear room: {0}")]
    Clear(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no identity has been established yet")]
    NotReady,

    #[error("client is offline")]
    Offline,

    #[error(transparent)]
    Store(#[from] StoreError),
}
