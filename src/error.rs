use thiserror::Error;

/// Rejected while building a diff engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("target text must contain at least one character")]
    InvalidTarget,
}

/// Raised by the trimmed mean when no weight survives trimming
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrimError {
    #[error("trimmed middle of the series is empty")]
    EmptyMiddle,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("session elapsed time must be positive, got {0}")]
    NonPositiveElapsed(f64),

    #[error("session has no completion time for position {0}")]
    Unstamped(usize),
}

/// Failures of the statistics store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Everything a practice session can fail with
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_wraps_sqlite_errors() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.to_string().starts_with("persistence error"));
    }

    #[test]
    fn session_error_is_transparent() {
        let err: SessionError = DiffError::InvalidTarget.into();
        assert_eq!(
            err.to_string(),
            "target text must contain at least one character"
        );
    }
}
