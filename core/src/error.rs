//! Error types for Mailweave Core

use crate::email::MessageKey;

/// Result type alias for Mailweave operations
pub type MailweaveResult<T> = Result<T, MailweaveError>;

/// Main error type for Mailweave
#[derive(Debug, thiserror::Error)]
pub enum MailweaveError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database migration error
    #[error("Database migration error: {0}")]
    DatabaseMigration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timestamp formatting errors
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Fetch source errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A thread was requested from an email that is itself a reply
    #[error("Email {key} is a reply to {in_reply_to} and cannot start a thread")]
    NotTopLevel {
        key: MessageKey,
        in_reply_to: MessageKey,
    },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid state errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Generic errors
    #[error("Error: {0}")]
    Generic(String),
}

impl MailweaveError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a new generic error
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Check if this error came from the storage layer
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::DatabaseMigration(_) | Self::Io(_)
        )
    }

    /// Check if this error signals caller misuse rather than an environmental failure
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::NotTopLevel { .. } | Self::InvalidState(_))
    }
}
