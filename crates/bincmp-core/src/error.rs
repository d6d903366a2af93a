use std::path::PathBuf;
use thiserror::Error;

pub type BincmpResult<T> = Result<T, BincmpError>;

#[derive(Debug, Error)]
pub enum BincmpError {
    /// A read failed for a reason other than the file being absent
    /// (permission denied, device error, file shrinking mid-read).
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl BincmpError {
    pub fn io_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}
