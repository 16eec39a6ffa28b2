use thiserror::Error;

/// Errors surfaced by a [`crate::storage::engine::Engine`] or a
/// [`crate::contract::TxnKv`] implementation.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type CResult<T> = Result<T, KvError>;
