//! Error types for memovault.

use thiserror::Error;

/// Result type alias using memovault's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for memovault operations.
///
/// Interruption is deliberately absent: a user-requested cancellation is a
/// normal terminal outcome reported through sync pass results, never an error.
#[derive(Error, Debug)]
pub enum Error {
    /// No cached token and no usable credentials to obtain one
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// Login attempt rejected by the server
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 401 on an authenticated call after the re-login retry was spent
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Transport-level unreachability (connection refused, DNS, timeout)
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Non-2xx, non-401 HTTP status from the remote service
    #[error("Server error (status {status}): {detail}")]
    Server { status: u16, detail: String },

    /// Server build lacks the requested capability (422-class response)
    #[error("Server does not support this method: {0}")]
    UnsupportedMethod(String),

    /// Async job polling exceeded its bound
    #[error("Task timed out: {0}")]
    TaskTimeout(String),

    /// Async job reported failure
    #[error("Task {task_id} failed: {detail}")]
    TaskFailed { task_id: String, detail: String },

    /// A sync pass is already running; the new request is rejected, not queued
    #[error("Sync already in progress")]
    SyncInProgress,

    /// A local search is already in flight; rapid repeated queries coalesce
    /// into the running one instead of piling up
    #[error("Search already in progress")]
    SearchInProgress,

    /// Document store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Settings or inventory persistence failed
    #[error("Persist error: {0}")]
    Persist(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build the classified error for a non-2xx HTTP status.
    ///
    /// 401 maps to `SessionExpired` so the request wrapper can trigger its
    /// single re-login retry; 422 maps to `UnsupportedMethod` only when the
    /// caller flags the request as using an optional server capability.
    pub fn from_status(status: u16, detail: impl Into<String>, optional_capability: bool) -> Self {
        let detail = detail.into();
        match status {
            401 => Error::SessionExpired(detail),
            422 if optional_capability => Error::UnsupportedMethod(detail),
            _ => Error::Server { status, detail },
        }
    }

    /// Whether a retry with the same inputs could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connectivity(_) | Error::TaskTimeout(_) => true,
            Error::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this error belongs to the authentication family.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationRequired(_)
                | Error::AuthenticationFailed(_)
                | Error::SessionExpired(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            // Errors surfaced by send() without a status are transport-level.
            Error::Connectivity(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_authentication_required() {
        let err = Error::AuthenticationRequired("no credentials configured".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication required: no credentials configured"
        );
    }

    #[test]
    fn test_error_display_authentication_failed() {
        let err = Error::AuthenticationFailed("bad password".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bad password");
    }

    #[test]
    fn test_error_display_session_expired() {
        let err = Error::SessionExpired("token rejected".to_string());
        assert_eq!(err.to_string(), "Session expired: token rejected");
    }

    #[test]
    fn test_error_display_connectivity() {
        let err = Error::Connectivity("connection refused".to_string());
        assert_eq!(err.to_string(), "Connectivity error: connection refused");
    }

    #[test]
    fn test_error_display_server() {
        let err = Error::Server {
            status: 503,
            detail: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (status 503): maintenance");
    }

    #[test]
    fn test_error_display_unsupported_method() {
        let err = Error::UnsupportedMethod("embedding search".to_string());
        assert_eq!(
            err.to_string(),
            "Server does not support this method: embedding search"
        );
    }

    #[test]
    fn test_error_display_task_timeout() {
        let err = Error::TaskTimeout("task-42".to_string());
        assert_eq!(err.to_string(), "Task timed out: task-42");
    }

    #[test]
    fn test_error_display_task_failed() {
        let err = Error::TaskFailed {
            task_id: "task-42".to_string(),
            detail: "embedding backend down".to_string(),
        };
        assert_eq!(err.to_string(), "Task task-42 failed: embedding backend down");
    }

    #[test]
    fn test_error_display_sync_in_progress() {
        assert_eq!(Error::SyncInProgress.to_string(), "Sync already in progress");
    }

    #[test]
    fn test_error_display_search_in_progress() {
        assert_eq!(
            Error::SearchInProgress.to_string(),
            "Search already in progress"
        );
    }

    #[test]
    fn test_error_display_store() {
        let err = Error::Store("read failed".to_string());
        assert_eq!(err.to_string(), "Store error: read failed");
    }

    #[test]
    fn test_error_display_persist() {
        let err = Error::Persist("write failed".to_string());
        assert_eq!(err.to_string(), "Persist error: write failed");
    }

    #[test]
    fn test_from_status_401_is_session_expired() {
        let err = Error::from_status(401, "unauthorized", false);
        assert!(matches!(err, Error::SessionExpired(_)));
    }

    #[test]
    fn test_from_status_422_optional_capability() {
        let err = Error::from_status(422, "embedding unavailable", true);
        assert!(matches!(err, Error::UnsupportedMethod(_)));
    }

    #[test]
    fn test_from_status_422_plain_is_server_error() {
        let err = Error::from_status(422, "validation failed", false);
        match err {
            Error::Server { status, .. } => assert_eq!(status, 422),
            other => panic!("Expected Server error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_status_500_is_server_error() {
        let err = Error::from_status(500, "boom", false);
        match err {
            Error::Server { status, .. } => assert_eq!(status, 500),
            other => panic!("Expected Server error, got {other:?}"),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Connectivity("down".to_string()).is_retryable());
        assert!(Error::TaskTimeout("t".to_string()).is_retryable());
        assert!(Error::Server {
            status: 502,
            detail: String::new()
        }
        .is_retryable());
        assert!(!Error::Server {
            status: 404,
            detail: String::new()
        }
        .is_retryable());
        assert!(!Error::AuthenticationFailed("no".to_string()).is_retryable());
        assert!(!Error::SyncInProgress.is_retryable());
    }

    #[test]
    fn test_is_auth() {
        assert!(Error::AuthenticationRequired(String::new()).is_auth());
        assert!(Error::AuthenticationFailed(String::new()).is_auth());
        assert!(Error::SessionExpired(String::new()).is_auth());
        assert!(!Error::Connectivity(String::new()).is_auth());
        assert!(!Error::SyncInProgress.is_auth());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::SyncInProgress;
        assert!(format!("{err:?}").contains("SyncInProgress"));
    }
}
