use fragment_extract::ExtractError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for code generation
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors raised while writing generated modules or the registry
#[derive(Error, Debug)]
pub enum CodegenError {
    /// Filesystem operation failed
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The analysis was rejected or a previous module could not be read back
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Source path does not live under the project root
    #[error("{} is outside the project root {}", path.display(), root.display())]
    OutsideProject { path: PathBuf, root: PathBuf },

    /// Path has no parent directory to write into
    #[error("{} has no parent directory", .0.display())]
    NoParent(PathBuf),
}

impl CodegenError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
