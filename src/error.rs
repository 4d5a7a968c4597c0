//! Error types for wilayah.
//!
//! Each concern has its own error enum. None of them is fatal to the
//! cascade: fetch errors are logged and the affected option list stays as
//! it was.

use thiserror::Error;

/// Failure fetching one level's option list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Connection, timeout or body read failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body was not the expected `{"data": [...]}` shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The query or base URL could not be turned into a request.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl FetchError {
    pub fn http(status: u16, url: impl Into<String>) -> Self {
        FetchError::Http {
            status,
            url: url.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        FetchError::Decode(message.into())
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        FetchError::InvalidQuery(message.into())
    }
}

/// Session persistence failure.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file exists but does not hold a token and user id.
    #[error("Malformed session file: {message}")]
    Malformed { message: String },
}

impl SessionError {
    pub fn malformed(message: impl Into<String>) -> Self {
        SessionError::Malformed {
            message: message.into(),
        }
    }
}

/// A single rejected command field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure applying a listing command.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Invalid command: {0}")]
    Validation(#[from] ValidationError),

    /// No session is loaded; edits require a signed-in user.
    #[error("Not signed in")]
    Unauthenticated,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Configuration file failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl ConfigError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
