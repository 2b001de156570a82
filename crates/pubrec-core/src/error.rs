use thiserror::Error;

/// Error conditions callers are expected to branch on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No index loaded; call index() or load() first")]
    NotReady,

    #[error("An index build is already running for collection '{0}'")]
    BuildLocked(String),
}

/// Per-record failures during normalization and catalog loading. Never
/// fatal: the record is skipped, logged, and counted.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unparseable record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("record has no usable id")]
    MissingId,
}
