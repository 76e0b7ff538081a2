//! Error types for the documentation assistant

use thiserror::Error;

/// Errors raised while talking to the assistant backend
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No key in the environment or the keyring
    #[error("API key not configured. Set ANTHROPIC_API_KEY or run :assistant-key <key>")]
    ApiKeyNotFound,

    #[error("Failed to access keyring: {0}")]
    Keyring(String),

    /// Key does not look like an Anthropic key
    #[error("Invalid API key format. Key should start with 'sk-ant-'")]
    InvalidApiKey,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status from the messages endpoint
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    /// The response carried no text
    #[error("The assistant returned an empty answer")]
    EmptyResponse,

    #[error("Request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssistantError {
    /// Whether asking again might work
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AssistantError::RateLimited { .. }
                | AssistantError::Request(_)
                | AssistantError::Cancelled
                | AssistantError::EmptyResponse
        )
    }

    /// Whether the user has to supply a new key
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            AssistantError::ApiKeyNotFound
                | AssistantError::InvalidApiKey
                | AssistantError::Api { status: 401, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_requires_reauth() {
        let err = AssistantError::Api { status: 401, message: "bad key".into() };
        assert!(err.requires_reauth());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn rate_limit_is_recoverable() {
        let err = AssistantError::RateLimited { retry_after_seconds: 30 };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Rate limited. Retry after 30 seconds");
    }
}
