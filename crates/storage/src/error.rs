use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("corrupt entry {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("storage queue closed")]
    QueueClosed,

    #[error("{0}")]
    Other(String),
}
