//! Error types for the Voiceflow API clients and configuration.

use thiserror::Error;

/// Errors raised while talking to the Voiceflow runtime or transcripts APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint URL '{url}': {reason}")]
    Url { url: String, reason: String },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// A short setup hint for well-known failure statuses.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ApiError::Http(e) if e.is_timeout() => {
                Some("Request timed out - check your internet connection")
            }
            ApiError::Http(e) if e.is_connect() => {
                Some("Connection error - check your internet connection")
            }
            _ => status_hint(self.status()?),
        }
    }
}

/// Hint text for a status code returned by either endpoint.
pub fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Check your project ID and version ID"),
        401 | 403 => Some("Check your API key authorization"),
        404 => Some("Project not found - check your API key and make sure the agent is published"),
        _ => None,
    }
}

/// Configuration problems detected before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Voiceflow API key is not set")]
    MissingApiKey,

    #[error("API key format appears to be incorrect (should start with '{expected}')")]
    MalformedApiKey { expected: &'static str },

    #[error("{field} must start with http:// or https:// (got '{value}')")]
    InvalidUrl { field: &'static str, value: String },

    #[error("timeout_secs must be greater than 0")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_hints() {
        assert_eq!(status_hint(400), Some("Check your project ID and version ID"));
        assert_eq!(status_hint(401), Some("Check your API key authorization"));
        assert!(status_hint(404).unwrap().contains("published"));
        assert_eq!(status_hint(500), None);
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            endpoint: "runtime",
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "runtime returned status 401: Unauthorized");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.hint(), Some("Check your API key authorization"));
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err = ApiError::Decode {
            endpoint: "runtime",
            message: "expected an array of traces".to_string(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.hint(), None);
    }
}
