use thiserror::Error;

/// The bounded error set from spec.md §7. Per-file and per-source failures
/// during a scan are recovered locally (see `scanner`); these variants are
/// for operations that must surface to the caller.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("a scan is already running")]
    ScanBusy,

    #[error("no sources configured")]
    NoSources,

    #[error("source already exists: {0}")]
    DuplicateSource(String),

    #[error("encryption key is missing or unreadable; stored credentials cannot be recovered")]
    KeyLost,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
