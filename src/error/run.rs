// Auditor run error types and constants

use crate::error::ErrorCode;
use log::error;
use serde::Serialize;
use std::fmt;

/// Run error code constants
///
/// Error code range: 3001-3006
pub struct RunErrorCodes {}

impl RunErrorCodes {
    /// URL could not be parsed or is not an http URL
    pub const INVALID_URL: i32 = 3001;

    /// Method, header or body framing could not be expressed on the wire
    pub const INVALID_REQUEST: i32 = 3002;

    /// TCP connection could not be established
    pub const CONNECT: i32 = 3003;

    /// HTTP exchange failed after connecting
    pub const PROTOCOL: i32 = 3004;

    /// Response body exceeded the configured limit
    pub const BODY_TOO_LARGE: i32 = 3005;

    /// The run's private event loop could not be used
    pub const RUNTIME: i32 = 3006;
}

/// Log a run error with structured context
///
/// Includes the numeric code and the URL the run targeted. The logging is
/// best-effort and will not panic.
pub fn log_run_error(err: &RunError, url: &str) {
    error!(
        "Auditor run failed for {}: code={}, component=AuditorRun, message={}",
        url,
        err.code(),
        err.message()
    );
}

/// Structured terminal error of an auditor run
///
/// Every variant carries a descriptive payload so a failing check can show
/// exactly what went wrong on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RunError {
    /// URL is not a valid absolute http URL
    InvalidUrl { url: String, reason: String },

    /// Request could not be built (bad method, header, or framing)
    InvalidRequest { reason: String },

    /// Connecting to the target failed
    Connect { addr: String, details: String },

    /// The HTTP exchange failed mid-flight
    Protocol { details: String },

    /// Response body exceeded the limit
    BodyTooLarge { limit: usize },

    /// Event loop setup failed or the run was invoked on a foreign loop
    Runtime { details: String },
}

impl RunError {
    fn variant(&self) -> &'static str {
        match self {
            RunError::InvalidUrl { .. } => "InvalidUrl",
            RunError::InvalidRequest { .. } => "InvalidRequest",
            RunError::Connect { .. } => "Connect",
            RunError::Protocol { .. } => "Protocol",
            RunError::BodyTooLarge { .. } => "BodyTooLarge",
            RunError::Runtime { .. } => "Runtime",
        }
    }
}

impl ErrorCode for RunError {
    fn code(&self) -> i32 {
        match self {
            RunError::InvalidUrl { .. } => RunErrorCodes::INVALID_URL,
            RunError::InvalidRequest { .. } => RunErrorCodes::INVALID_REQUEST,
            RunError::Connect { .. } => RunErrorCodes::CONNECT,
            RunError::Protocol { .. } => RunErrorCodes::PROTOCOL,
            RunError::BodyTooLarge { .. } => RunErrorCodes::BODY_TOO_LARGE,
            RunError::Runtime { .. } => RunErrorCodes::RUNTIME,
        }
    }

    fn message(&self) -> String {
        match self {
            RunError::InvalidUrl { url, reason } => {
                format!("Invalid URL '{}': {}", url, reason)
            }
            RunError::InvalidRequest { reason } => format!("Invalid request: {}", reason),
            RunError::Connect { addr, details } => {
                format!("Could not connect to {}: {}", addr, details)
            }
            RunError::Protocol { details } => format!("HTTP exchange failed: {}", details),
            RunError::BodyTooLarge { limit } => {
                format!("Response body exceeded {} bytes", limit)
            }
            RunError::Runtime { details } => format!("Run loop unavailable: {}", details),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunError::{} (code {}): {}",
            self.variant(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for RunError {}

impl From<hyper::Error> for RunError {
    fn from(err: hyper::Error) -> Self {
        RunError::Protocol {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_error_codes() {
        assert_eq!(
            RunError::InvalidUrl {
                url: "x".into(),
                reason: "y".into()
            }
            .code(),
            3001
        );
        assert_eq!(
            RunError::InvalidRequest {
                reason: "test".into()
            }
            .code(),
            3002
        );
        assert_eq!(
            RunError::Connect {
                addr: "127.0.0.1:1".into(),
                details: "refused".into()
            }
            .code(),
            3003
        );
        assert_eq!(
            RunError::Protocol {
                details: "test".into()
            }
            .code(),
            3004
        );
        assert_eq!(RunError::BodyTooLarge { limit: 1 }.code(), 3005);
        assert_eq!(
            RunError::Runtime {
                details: "test".into()
            }
            .code(),
            3006
        );
    }

    #[test]
    fn test_display_keeps_payload() {
        let err = RunError::Connect {
            addr: "127.0.0.1:9".into(),
            details: "connection refused".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("RunError::Connect (code 3003)"));
        assert!(rendered.contains("127.0.0.1:9"));
        assert!(rendered.contains("connection refused"));
    }

    #[test]
    fn test_serializes_with_tag() {
        let err = RunError::BodyTooLarge { limit: 42 };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "body_too_large");
        assert_eq!(json["limit"], 42);
    }
}
