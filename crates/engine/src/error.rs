use thiserror::Error;

use repos::error::RepoError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller error: the report cannot be accepted as submitted. Not
    /// worth retrying unchanged.
    #[error("invalid crash report: {0}")]
    InvalidReport(String),

    #[error("not found")]
    NotFound,

    /// Transient storage failure. The caller owns the retry policy.
    #[error("store unavailable: {0}")]
    StoreUnavailable(RepoError),
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound() => EngineError::NotFound,
            other => EngineError::StoreUnavailable(other),
        }
    }
}
