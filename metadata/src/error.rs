use kv::error::KvError;
use thiserror::Error;

/// Error kinds surfaced to callers of the [`crate::table::MetaTable`].
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The KV write failed; a reload was attempted. `reload_error` is set
    /// only if that reload also failed, in which case the table is
    /// poisoned until [`crate::table::MetaTable::force_reload`] succeeds.
    #[error("store unavailable: {source}{}", reload_error.as_ref().map(|e| format!(" (reload also failed: {e})")).unwrap_or_default())]
    StoreUnavailable { source: KvError, reload_error: Option<Box<MetaError>> },

    /// Decode failure or referential integrity violation during recovery.
    /// Fatal: never recovered locally.
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// A record failed to decode from its textual encoding.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}
