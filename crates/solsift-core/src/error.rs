use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("access restricted: {0}")]
    AccessRestricted(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::HttpStatus(status.as_u16()),
            None => Self::Transport(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
