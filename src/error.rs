//! Error types for the monitor

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Monitor error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed arguments or parameter-store entries
    #[error("Configuration error: {0}")]
    Config(String),

    /// Map image undecodable or zero-dimensioned
    #[error("Map load error: {0}")]
    Map(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Display window error
    #[error("Window error: {0}")]
    Window(String),

    /// Malformed frame or payload on the pose service
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<minifb::Error> for Error {
    fn from(e: minifb::Error) -> Self {
        Error::Window(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(e.to_string())
    }
}
