//! Error types for the data layer.
//!
//! Both the identity key/value store and the record sinks report failures
//! through [`DbError`]. Callers in the tracking core never surface these;
//! they are reduced to diagnostics at the call boundary.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A query against the record tables failed.
    #[error("record sink query failed: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Creating or upgrading the record tables failed.
    #[error("record table migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Reading or writing the identity file failed.
    #[error("identity storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The identity file or a metadata payload was not valid JSON.
    #[error("malformed JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock guarding in-process state was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),

    /// The backend could not be reached (network, quota, storage disabled).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write (permissions, row-level policy).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The sink was configured with an unusable value (e.g. a bad URL).
    #[error("sink misconfigured: {0}")]
    Config(String),
}
