//! Error types for fuelsync-core

use thiserror::Error;

/// Result type alias using fuelsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], used by callers to decide whether a
/// failure aborts the whole run, one vehicle pass, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid settings; fatal before any network I/O.
    Configuration,
    /// An expected remote entity is absent; fatal for one vehicle pass.
    NotFound,
    /// Timeout or HTTP failure talking to a remote service.
    Transport,
    /// A typed equality was attempted against a non-fillup value.
    Type,
    /// Malformed data read from a backup, an API payload, or the filesystem.
    Input,
}

/// Errors that can occur in fuelsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from a remote API
    #[error("API error: {0}")]
    Api(String),

    /// Equality comparison against a value that is not a fillup record
    #[error("'==' not supported between {expected} and {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Backup archive error
    #[error("Backup archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Config file parse error
    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Yaml(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Http(_) | Self::Api(_) => ErrorKind::Transport,
            Self::TypeMismatch { .. } => ErrorKind::Type,
            Self::InvalidInput(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Csv(_)
            | Self::Archive(_) => ErrorKind::Input,
        }
    }

    /// True when the error came from a request timing out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(error) if error.is_timeout())
    }
}
