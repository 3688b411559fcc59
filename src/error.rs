//! Error types for the whale watcher

use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, WatcherError>;

#[derive(Error, Debug)]
pub enum WatcherError {

    // =============================
    // Startup
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Upstream API Errors (retryable)
    // =============================

    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    pub fn parse<S: Into<String>>(message: S) -> Self {
        WatcherError::Parse(message.into())
    }

    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        WatcherError::Api {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_readable() {
        let err = WatcherError::api(503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "API error: Service Unavailable (status: 503)"
        );

        let err = WatcherError::Config("Missing key in config: DOBBY_API_KEY".to_string());
        assert!(err.to_string().contains("DOBBY_API_KEY"));
    }
}
