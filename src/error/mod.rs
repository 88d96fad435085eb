// Error types for the audit harness
//
// This module defines the structured errors an auditor run can terminate with
// and the fatal classification defect raised by the assertion policy.

mod classification;
mod run;

pub use classification::{ClassificationDefect, ClassificationErrorCodes};
pub use run::{log_run_error, RunError, RunErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so reports and logs carry the same identifiers.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
