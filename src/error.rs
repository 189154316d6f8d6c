//! Error types for ipwatch.

use thiserror::Error;

/// Result type alias for ipwatch.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record name could not be mapped to a provider identifier.
    #[error("Resolution error ({provider}): {message}")]
    Resolution { provider: String, message: String },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// IP detection error.
    #[error("IP detection failed: {0}")]
    IpDetection(String),

    /// A provider rejected or never received an update call.
    #[error("Update of {record} via {provider} failed: {cause}")]
    UpdateFailed {
        provider: String,
        record: String,
        cause: String,
    },

    /// A notification channel failed to deliver.
    #[error("Notification via {channel} failed: {message}")]
    Notification { channel: String, message: String },

    /// IP cache error.
    #[error("IP cache error: {0}")]
    Cache(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    pub(crate) fn resolution(provider: &str, message: impl Into<String>) -> Self {
        DdnsError::Resolution {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn update_failed(provider: &str, record: &str, cause: impl ToString) -> Self {
        DdnsError::UpdateFailed {
            provider: provider.to_string(),
            record: record.to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn notification(channel: &str, message: impl ToString) -> Self {
        DdnsError::Notification {
            channel: channel.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error must stop the process before the poll loop starts.
    ///
    /// Everything else is transient: it is logged and the loop carries on
    /// at the next interval.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DdnsError::Config(_) | DdnsError::Resolution { .. })
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
