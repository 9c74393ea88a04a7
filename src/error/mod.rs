//! Error types for Parley.

pub mod unified;

pub use unified::{ErrorKind, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("{0}")]
    ConfigMissing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Please enter a question.")]
    EmptyInput,

    #[error("A response is already in progress; wait for it to finish")]
    Busy,

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream interrupted after {rendered_chars} characters: {source}")]
    PartialStream {
        rendered_chars: usize,
        #[source]
        source: Box<ParleyError>,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ParleyError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a mid-stream fault that arrived after `rendered_chars` characters
    /// were already shown. A fault before any text stays unwrapped.
    pub fn interrupted(rendered_chars: usize, source: ParleyError) -> Self {
        if rendered_chars == 0 {
            return source;
        }
        Self::PartialStream {
            rendered_chars,
            source: Box::new(source),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigMissing(_) | Self::Configuration(_) => ErrorKind::ConfigMissing,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Busy => ErrorKind::Busy,
            Self::Io(_) => ErrorKind::Internal,
            _ => ErrorKind::FetchFailed,
        }
    }

    /// Whether the fault happened after part of the answer was rendered.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialStream { .. })
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => (500..=599).contains(status),
            Self::PartialStream { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Suggest a recovery action.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::ConfigMissing(_) | Self::Configuration(_) => {
                RecoverySuggestion::CheckConfiguration
            }
            Self::Authentication(_) => RecoverySuggestion::CheckCredentials,
            Self::Api { status: 401 | 403, .. } => RecoverySuggestion::CheckCredentials,
            Self::EmptyInput => RecoverySuggestion::EditInput,
            Self::Busy => RecoverySuggestion::WaitForCompletion,
            Self::Timeout(_) => RecoverySuggestion::IncreaseTimeout,
            Self::PartialStream { source, .. } => source.recovery_suggestion(),
            other if other.is_retryable() => RecoverySuggestion::RetryWithBackoff,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
