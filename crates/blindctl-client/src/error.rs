//! Error types for device communication.

use blindctl_core::Retryable;
use thiserror::Error;

/// Any failure to complete a request or keep the log socket open.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection refused, reset, or DNS failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {0}s: {1}")]
    Timeout(u64, String),

    /// Device answered with a non-2xx status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Body was not the JSON shape the caller expected
    #[error("Malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },

    /// Request payload could not be encoded
    #[error("Failed to encode request for {endpoint}: {message}")]
    Encode { endpoint: String, message: String },

    /// WebSocket protocol or I/O failure
    #[error("WebSocket error: {0}")]
    Socket(String),

    /// URL could not be built or parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetworkError {
    /// Classify a reqwest failure.
    pub fn from_reqwest(endpoint: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs, endpoint.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_decode() {
            Self::Malformed {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }

    /// Classify a WebSocket failure.
    pub fn from_socket(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Url(e) => Self::InvalidUrl(e.to_string()),
            WsError::Io(e) => Self::ConnectionFailed(e.to_string()),
            other => Self::Socket(other.to_string()),
        }
    }

    /// Build an error from a non-2xx status code.
    pub fn from_http_status(endpoint: &str, status: u16, body: &str) -> Self {
        Self::Status {
            endpoint: endpoint.to_string(),
            status,
            body: body.to_string(),
        }
    }

    /// Check if this error is a network-level failure rather than a bad answer.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_, _) | Self::Socket(_)
        )
    }

    /// Get a user-friendly error message.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::ConnectionFailed(_) => "Device unreachable. Check the network.".to_string(),
            Self::Timeout(secs, _) => format!("Device did not answer within {secs}s."),
            Self::Status { status, .. } => format!("Device rejected the request (HTTP {status})."),
            Self::Malformed { .. } => "Device sent an unexpected response.".to_string(),
            Self::Encode { .. } => "Request could not be encoded.".to_string(),
            Self::Socket(_) => "Log stream interrupted.".to_string(),
            Self::InvalidUrl(url) => format!("Invalid device URL: {url}"),
        }
    }
}

impl Retryable for NetworkError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) | Self::Timeout(_, _) | Self::Socket(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Malformed { .. } | Self::Encode { .. } | Self::InvalidUrl(_) => false,
        }
    }
}

/// Result type for device communication.
pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(NetworkError::ConnectionFailed("refused".into()).is_retryable());
        assert!(NetworkError::Timeout(5, "/remotes".into()).is_retryable());
        assert!(NetworkError::Socket("reset".into()).is_retryable());
    }

    #[test]
    fn test_status_retryable_only_for_server_errors() {
        assert!(NetworkError::from_http_status("/remotes", 503, "busy").is_retryable());
        assert!(!NetworkError::from_http_status("/remotes", 400, "bad").is_retryable());
    }

    #[test]
    fn test_bad_url_is_not_retryable() {
        let err = NetworkError::InvalidUrl("nope".into());
        assert!(!err.is_retryable());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_friendly_messages() {
        assert!(
            NetworkError::Timeout(5, "/remotes".into())
                .friendly_message()
                .contains("5s")
        );
        assert!(
            NetworkError::from_http_status("/remotes/action", 404, "")
                .friendly_message()
                .contains("404")
        );
    }
}
