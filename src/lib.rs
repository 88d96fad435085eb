// Audit Harness - integration tests for an HTTP semantics auditor
// Runs a blocking auditor against a local fixture server without stalling
// the fixture's event loop, then judges the auditor's findings.

// Module declarations
pub mod auditor;
pub mod bridge;
pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod message;
pub mod policy;

// Re-exports for convenience
pub use auditor::{AuditorRun, RunAdapter, RunRequest, RunState};
pub use bridge::Bridge;
pub use config::HarnessConfig;
pub use error::{ClassificationDefect, RunError};
pub use fixture::FixtureServer;
pub use harness::{CheckReport, CheckRequest, Harness};
pub use message::{DiagnosticMessage, Level, MessageKind};
pub use policy::{AssertionPolicy, CheckFailure, ExpectationSpec, Verdict, WarningPolicy};

use tracing_subscriber::EnvFilter;

/// Install the global log subscriber.
///
/// `log` records are forwarded to `tracing` and written to stderr. The filter
/// comes from `RUST_LOG` and defaults to `info`. Calling this more than once is
/// harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
