// Classification defect raised when a message carries an unknown level

use crate::error::ErrorCode;
use std::fmt;

/// Classification error code constants
///
/// Error code range: 4001
pub struct ClassificationErrorCodes {}

impl ClassificationErrorCodes {
    /// Message level outside the recognized set
    pub const UNKNOWN_LEVEL: i32 = 4001;
}

/// A diagnostic message whose level the policy does not recognize.
///
/// This is a model/version skew between the auditor and the harness, not a
/// test-data problem, so it is never turned into a regular check failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationDefect {
    pub kind: String,
    pub level: String,
}

impl ErrorCode for ClassificationDefect {
    fn code(&self) -> i32 {
        ClassificationErrorCodes::UNKNOWN_LEVEL
    }

    fn message(&self) -> String {
        format!("unknown level '{}' on message {}", self.level, self.kind)
    }
}

impl fmt::Display for ClassificationDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "classification defect (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ClassificationDefect {}
