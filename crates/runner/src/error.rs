use crate::record::CandidateRecord;
use fragment_extract::ExtractError;
use std::time::Duration;
use thiserror::Error;

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Failure reported by the remote execution context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The evaluated script threw
    #[error("remote evaluation failed: {0}")]
    Evaluation(String),

    /// The context went away (closed page, crashed worker)
    #[error("remote context is closed")]
    Closed,

    /// Value could not be transferred across the boundary
    #[error("value is not transferable: {0}")]
    Transfer(String),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    /// The registry never learned about the file within the retry ceiling
    #[error(
        "registry entry '{content_hash}' did not appear after {attempts} attempt(s) over {waited:?}; \
         re-run extraction and make sure the remote context loads the registry"
    )]
    RegistryTimeout {
        content_hash: String,
        attempts: u32,
        waited: Duration,
    },

    /// The generated module has no fragment under the requested key
    #[error(
        "no fragment matches {requested} in module '{content_hash}'\n  \
         expected tokens: {preview}\n  \
         candidates:\n{candidates}\n  \
         hint: give the call an explicit label, e.g. bridge('name', () => ...), so it is matched by name"
    )]
    UnmatchedFunction {
        content_hash: String,
        requested: String,
        preview: String,
        candidates: CandidateRecord,
    },

    /// The remote context rejected a script or the fragment threw
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A value coming back did not have the expected shape
    #[error("failed to decode remote value: {0}")]
    Decode(#[from] serde_json::Error),

    /// Fingerprinting the requested code failed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Invalid retry policy
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
