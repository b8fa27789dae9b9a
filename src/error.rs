use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("working directory {}: {reason}", path.display())]
    WorkingDirectory { path: PathBuf, reason: String },
    #[error("disk usage query failed for {}: {source}", path.display())]
    Probe { path: PathBuf, source: io::Error },
    #[error("cannot walk {}: {source}", path.display())]
    Walk { path: PathBuf, source: io::Error },
    #[error("failed to delete {}: {source}", path.display())]
    Deletion { path: PathBuf, source: io::Error },
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) | Error::WorkingDirectory { .. } => 2,
            Error::Probe { .. } | Error::Unsupported(_) => 3,
            Error::Deletion { .. } => 4,
            Error::Io(_) | Error::Walk { .. } => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
