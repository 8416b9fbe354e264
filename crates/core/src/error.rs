//! Error types for the termagent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type, and each type has its own
//! propagation policy inside the agent loop:
//!
//! - [`ProtocolError`] and [`ToolError`] are absorbed into the conversation
//!   as observations so the model can self-correct.
//! - [`ProviderError`] either triggers a model fallback or aborts the query.

use thiserror::Error;

/// The top-level error type for the layers outside the agent loop: setup,
/// input, and commands run from the CLI.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Terminal input ---
    #[error("Input error: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single-message query ended without an answer.
    #[error("Query aborted: {0}")]
    Aborted(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the model endpoint.
///
/// HTTP statuses are mapped onto dedicated variants by
/// [`ProviderError::from_status`]; the agent loop only ever asks
/// [`ProviderError::is_fallback_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Rate limited or quota exhausted (status 429): {0}")]
    RateLimited(String),

    #[error("Access forbidden (status 403): {0}")]
    PermissionDenied(String),

    #[error("Invalid request or unsupported model (status {status_code}): {message}")]
    InvalidRequest { status_code: u16, message: String },

    #[error("Authentication failed (status 401): {0}")]
    Unauthenticated(String),

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Malformed response from provider: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status returned by the endpoint.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => Self::RateLimited(message),
            403 => Self::PermissionDenied(message),
            401 => Self::Unauthenticated(message),
            400 | 404 => Self::InvalidRequest {
                status_code,
                message,
            },
            _ => Self::Api {
                status_code,
                message,
            },
        }
    }

    /// Whether switching to the next model candidate may get past this error.
    ///
    /// Quota and permission problems are usually scoped to a model, so the
    /// same transcript is resubmitted elsewhere. Everything else is fatal for
    /// the current query.
    pub fn is_fallback_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::PermissionDenied(_))
    }

    /// The HTTP status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimited(_) => Some(429),
            Self::PermissionDenied(_) => Some(403),
            Self::Unauthenticated(_) => Some(401),
            Self::InvalidRequest { status_code, .. } | Self::Api { status_code, .. } => {
                Some(*status_code)
            }
            Self::InvalidResponse(_)
            | Self::NotConfigured(_)
            | Self::Timeout(_)
            | Self::Network(_) => None,
        }
    }

    /// A short operator hint for the error class.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "You have exceeded your API quota or rate limit.",
            Self::PermissionDenied(_) => "Your API key might not have permission for this model.",
            Self::InvalidRequest { .. } => "Invalid request format or unsupported model.",
            Self::Unauthenticated(_) => "Invalid API key. Please check your configuration.",
            Self::Api { .. } => "Unhandled status code from the model endpoint.",
            Self::InvalidResponse(_) => "The endpoint returned a response that could not be read.",
            Self::NotConfigured(_) => "The provider is not configured.",
            Self::Timeout(_) => "The model endpoint did not answer in time.",
            Self::Network(_) => "Could not reach the model endpoint.",
        }
    }
}

/// Failures resolving or running a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Tool '{0}' is not available")]
    NotFound(String),

    #[error("{tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("{tool_name} timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

/// A model response that is not a valid step record.
///
/// Recoverable: the loop feeds `reason` back to the model as an observation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Protocol violation: {reason}")]
pub struct ProtocolError {
    /// The raw text the model returned.
    pub raw: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ProtocolError {
    pub fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ProviderError::from_status(429, "slow down"),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            ProviderError::from_status(403, "forbidden"),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from_status(401, "bad key"),
            ProviderError::Unauthenticated(_)
        ));
        assert!(matches!(
            ProviderError::from_status(400, "bad request"),
            ProviderError::InvalidRequest { status_code: 400, .. }
        ));
        assert!(matches!(
            ProviderError::from_status(503, "unavailable"),
            ProviderError::Api { status_code: 503, .. }
        ));
    }

    #[test]
    fn only_quota_and_permission_are_retryable() {
        assert!(ProviderError::from_status(429, "").is_fallback_retryable());
        assert!(ProviderError::from_status(403, "").is_fallback_retryable());
        assert!(!ProviderError::from_status(401, "").is_fallback_retryable());
        assert!(!ProviderError::from_status(400, "").is_fallback_retryable());
        assert!(!ProviderError::from_status(500, "").is_fallback_retryable());
        assert!(!ProviderError::Network("refused".into()).is_fallback_retryable());
    }

    #[test]
    fn status_code_roundtrips_through_classification() {
        for status in [400, 401, 403, 404, 429, 500, 502] {
            assert_eq!(
                ProviderError::from_status(status, "x").status_code(),
                Some(status)
            );
        }
        assert_eq!(ProviderError::Timeout("t".into()).status_code(), None);
    }

    #[test]
    fn tool_not_found_message_names_the_tool() {
        let err = ToolError::NotFound("getStockPrice".into());
        assert_eq!(err.to_string(), "Tool 'getStockPrice' is not available");
    }

    #[test]
    fn provider_error_wraps_into_top_level() {
        let err: Error = ProviderError::from_status(429, "Too many requests").into();
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn io_error_wraps_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only home");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: read-only home");
    }

    #[test]
    fn config_error_message() {
        let err = Error::Config {
            message: "no API key".into(),
        };
        assert_eq!(err.to_string(), "Configuration error: no API key");
    }
}
