//! Error types for rollfile

/// Rollfile error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Writer is closed")]
    WriterClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for rollfile
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IoError(io) => io,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
