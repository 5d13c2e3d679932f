//! Error types shared across the JetStream workspace.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, JetStreamError>;

/// Top-level JetStream error.
#[derive(Debug, Error)]
pub enum JetStreamError {
    /// Configuration loading/parsing problems.
    #[error("Config error: {0}")]
    Config(String),

    /// Batch ingestion problems (CSV parsing, missing fields).
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Notification channel problems (Telegram API).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Outbound event delivery problems.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Encryption/credential problems.
    #[error("Security error: {0}")]
    Security(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
