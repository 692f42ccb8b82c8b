use serde_json::Value;
use thiserror::Error;

/// Result type for FPP operations
pub type Result<T> = std::result::Result<T, FppError>;

/// Errors that can occur when talking to an FPP device
///
/// Every variant belongs to an [`ErrorKind`]. Kinds form a small hierarchy
/// (see [`ErrorKind::parent`]), so callers can match either the exact kind or
/// a broader category with [`FppError::is`]:
///
/// ```
/// use fpp_client::{ErrorKind, FppError};
///
/// let err = FppError::ConnectionTimeout {
///     message: "Timeout occurred while connecting to FPP device at fpp.local".into(),
/// };
/// assert!(err.is(ErrorKind::ConnectionTimeout));
/// assert!(err.is(ErrorKind::Connection));
/// assert!(err.is(ErrorKind::Generic));
/// assert!(!err.is(ErrorKind::EmptyResponse));
/// ```
#[derive(Error, Debug)]
pub enum FppError {
    /// Catch-all device error
    #[error("{message}")]
    Generic { message: String },

    /// Device answered with a 4xx/5xx status
    ///
    /// `body` holds the decoded JSON error body, or `{"message": <text>}` when
    /// the device did not send JSON.
    #[error("FPP device returned HTTP {status}: {body}")]
    Http { status: u16, body: Value },

    /// Device answered successfully but with an empty body
    #[error("{message}")]
    EmptyResponse { message: String },

    /// Network-level failure (DNS, refused connection, reset)
    #[error("{message}")]
    Connection {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Request deadline elapsed before the device answered
    #[error("{message}")]
    ConnectionTimeout { message: String },

    /// Streaming connection terminated unexpectedly
    #[error("{message}")]
    ConnectionClosed { message: String },

    /// Device firmware version is not supported
    #[error("{message}")]
    UnsupportedVersion { message: String },

    /// Firmware upgrade failed
    #[error("{message}")]
    Upgrade { message: String },

    /// Payload did not match the expected shape
    #[error("Failed to decode {entity}: {source}")]
    Decode {
        entity: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Discriminant of an [`FppError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Generic,
    EmptyResponse,
    Connection,
    ConnectionTimeout,
    ConnectionClosed,
    UnsupportedVersion,
    Upgrade,
    Decode,
}

impl ErrorKind {
    /// The kind this kind refines, if any
    ///
    /// | kind                 | refines      |
    /// |----------------------|--------------|
    /// | `Connection`         | `Generic`    |
    /// | `ConnectionTimeout`  | `Connection` |
    /// | `ConnectionClosed`   | `Connection` |
    /// | `UnsupportedVersion` | `Generic`    |
    /// | `Upgrade`            | `Generic`    |
    ///
    /// `Generic`, `EmptyResponse` and `Decode` are roots.
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Connection | ErrorKind::UnsupportedVersion | ErrorKind::Upgrade => {
                Some(ErrorKind::Generic)
            }
            ErrorKind::ConnectionTimeout | ErrorKind::ConnectionClosed => {
                Some(ErrorKind::Connection)
            }
            ErrorKind::Generic | ErrorKind::EmptyResponse | ErrorKind::Decode => None,
        }
    }

    /// Whether `self` is `other` or transitively refines it
    pub fn refines(self, other: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl FppError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FppError::Generic { .. } | FppError::Http { .. } => ErrorKind::Generic,
            FppError::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            FppError::Connection { .. } => ErrorKind::Connection,
            FppError::ConnectionTimeout { .. } => ErrorKind::ConnectionTimeout,
            FppError::ConnectionClosed { .. } => ErrorKind::ConnectionClosed,
            FppError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            FppError::Upgrade { .. } => ErrorKind::Upgrade,
            FppError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Check whether this error is of `kind` or one of its refinements
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind().refines(kind)
    }

    /// HTTP status code, for errors raised from a 4xx/5xx response
    pub fn status(&self) -> Option<u16> {
        match self {
            FppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the transport should retry the request that produced this error
    ///
    /// Only plain connection failures qualify: timeouts, HTTP errors and
    /// decode failures are surfaced immediately.
    pub(crate) fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeout_refines_connection_and_generic() {
        assert!(ErrorKind::ConnectionTimeout.refines(ErrorKind::Connection));
        assert!(ErrorKind::ConnectionTimeout.refines(ErrorKind::Generic));
        assert!(ErrorKind::ConnectionClosed.refines(ErrorKind::Connection));
        assert!(!ErrorKind::Connection.refines(ErrorKind::ConnectionTimeout));
    }

    #[test]
    fn empty_response_and_decode_stand_alone() {
        assert!(!ErrorKind::EmptyResponse.refines(ErrorKind::Generic));
        assert!(!ErrorKind::Decode.refines(ErrorKind::Generic));
        assert_eq!(ErrorKind::EmptyResponse.parent(), None);
        assert_eq!(ErrorKind::Decode.parent(), None);
    }

    #[test]
    fn http_error_is_generic_with_status() {
        let err = FppError::Http {
            status: 500,
            body: json!({"status": "nok"}),
        };
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.status(), Some(500));
        assert!(!err.is(ErrorKind::Connection));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn only_plain_connection_errors_retry() {
        let refused = FppError::Connection {
            message: "refused".into(),
            source: None,
        };
        let timeout = FppError::ConnectionTimeout {
            message: "timeout".into(),
        };
        let http = FppError::Http {
            status: 503,
            body: json!({}),
        };
        assert!(refused.is_retryable());
        assert!(!timeout.is_retryable());
        assert!(!http.is_retryable());
    }
}
