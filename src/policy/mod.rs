//! Assertion policy
//!
//! Turns a terminal [`RunState`] plus an [`ExpectationSpec`] into a pass/fail
//! [`Verdict`]. Every message is logged at a severity matching its level so a
//! failed check can be debugged from the log alone.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::auditor::RunState;
use crate::config::PolicyConfig;
use crate::error::{ClassificationDefect, ErrorCode, RunError};
use crate::message::catalog::DEFAULT_LOCALE;
use crate::message::{kinds, DiagnosticMessage, Level, MessageKind};

#[cfg(test)]
mod tests;

/// Generic reason used when a run stopped without a structured error.
pub const INCOMPLETE_REASON: &str = "unknown error; incomplete response";

/// Warning kinds allowed for every check.
///
/// Heuristic freshness depends on the file system the fixture serves from and
/// can't be fixed by the fixture, so it is always part of the base set.
/// Configuration may add kinds but never remove that one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningPolicy {
    base: BTreeSet<MessageKind>,
}

impl Default for WarningPolicy {
    fn default() -> Self {
        Self {
            base: BTreeSet::from([kinds::FRESHNESS_HEURISTIC]),
        }
    }
}

impl WarningPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new().with_additional(config.extra_allowed_warnings.iter().map(String::as_str))
    }

    /// Add kinds to the base set.
    pub fn with_additional<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<MessageKind>,
    {
        self.base.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn base(&self) -> &BTreeSet<MessageKind> {
        &self.base
    }

    /// Base set united with the caller's allowances.
    pub fn effective(&self, caller: &BTreeSet<MessageKind>) -> BTreeSet<MessageKind> {
        self.base.union(caller).cloned().collect()
    }
}

/// What one check expects. Built fresh for every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationSpec {
    expected_status: u16,
    allowed_warning_kinds: BTreeSet<MessageKind>,
}

impl Default for ExpectationSpec {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ExpectationSpec {
    pub fn new(expected_status: u16) -> Self {
        Self {
            expected_status,
            allowed_warning_kinds: BTreeSet::new(),
        }
    }

    pub fn allow(mut self, kind: impl Into<MessageKind>) -> Self {
        self.allowed_warning_kinds.insert(kind.into());
        self
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    pub fn allowed_warning_kinds(&self) -> &BTreeSet<MessageKind> {
        &self.allowed_warning_kinds
    }
}

/// Per-level message counts of a passing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub good: usize,
    pub info: usize,
    pub uri: usize,
    /// Warnings that counted against the run (always zero on a pass).
    pub warnings: usize,
    /// Warnings dropped by the allow-list.
    pub allowed_warnings: usize,
    pub bad: usize,
}

/// Why a check failed.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckFailure {
    /// The run never reached a response.
    Incomplete {
        url: String,
        error: Option<RunError>,
    },
    StatusMismatch {
        url: String,
        expected: u16,
        actual: u16,
    },
    UnexpectedDiagnostics {
        url: String,
        warnings: Vec<MessageKind>,
        errors: Vec<MessageKind>,
    },
}

impl CheckFailure {
    pub fn url(&self) -> &str {
        match self {
            CheckFailure::Incomplete { url, .. }
            | CheckFailure::StatusMismatch { url, .. }
            | CheckFailure::UnexpectedDiagnostics { url, .. } => url,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CheckFailure::Incomplete { url, error } => serde_json::json!({
                "failure": "incomplete",
                "url": url,
                "reason": self.incomplete_reason(),
                "error": error,
                "error_code": error.as_ref().map(|err| err.code()),
            }),
            CheckFailure::StatusMismatch {
                url,
                expected,
                actual,
            } => serde_json::json!({
                "failure": "status_mismatch",
                "url": url,
                "expected": expected,
                "actual": actual,
            }),
            CheckFailure::UnexpectedDiagnostics {
                url,
                warnings,
                errors,
            } => serde_json::json!({
                "failure": "unexpected_diagnostics",
                "url": url,
                "warning_count": warnings.len(),
                "error_count": errors.len(),
                "warnings": warnings,
                "errors": errors,
            }),
        }
    }

    fn incomplete_reason(&self) -> String {
        match self {
            CheckFailure::Incomplete {
                error: Some(err), ..
            } => err.to_string(),
            _ => INCOMPLETE_REASON.to_string(),
        }
    }
}

fn join_kinds(kinds: &[MessageKind]) -> String {
    kinds
        .iter()
        .map(MessageKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Incomplete { url, .. } => {
                write!(f, "{}: {}", url, self.incomplete_reason())
            }
            CheckFailure::StatusMismatch {
                url,
                expected,
                actual,
            } => write!(f, "{url}: expected status {expected}, got {actual}"),
            CheckFailure::UnexpectedDiagnostics {
                url,
                warnings,
                errors,
            } => {
                write!(
                    f,
                    "{}: Had {} unexpected warnings and {} errors",
                    url,
                    warnings.len(),
                    errors.len()
                )?;
                if !warnings.is_empty() {
                    write!(f, "; warnings: {}", join_kinds(warnings))?;
                }
                if !errors.is_empty() {
                    write!(f, "; errors: {}", join_kinds(errors))?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CheckFailure {}

/// Result of evaluating one run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass(Tally),
    Fail(CheckFailure),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass(_))
    }
}

/// Decides pass/fail for a run.
#[derive(Debug, Clone)]
pub struct AssertionPolicy {
    warnings: WarningPolicy,
    locale: String,
}

impl Default for AssertionPolicy {
    fn default() -> Self {
        Self::new(WarningPolicy::default())
    }
}

impl AssertionPolicy {
    pub fn new(warnings: WarningPolicy) -> Self {
        Self {
            warnings,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(WarningPolicy::from_config(config)).with_locale(config.locale.clone())
    }

    /// Locale used for message text in the log.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn warnings(&self) -> &WarningPolicy {
        &self.warnings
    }

    /// Evaluate a terminal run state against an expectation.
    ///
    /// # Errors
    /// A message with an unrecognized level is a defect in the message model,
    /// not a test failure, and comes back as [`ClassificationDefect`].
    pub fn evaluate(
        &self,
        state: &RunState,
        spec: &ExpectationSpec,
    ) -> Result<Verdict, ClassificationDefect> {
        let url = state.url().to_string();

        let actual = match state.response_status() {
            Some(status) if state.is_completed() => status,
            _ => {
                return Ok(Verdict::Fail(CheckFailure::Incomplete {
                    url,
                    error: state.terminal_error().cloned(),
                }));
            }
        };

        let allowed = self.warnings.effective(spec.allowed_warning_kinds());
        let mut tally = Tally::default();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for message in state.messages() {
            self.log_message(message);
            match message.level() {
                Level::Good => tally.good += 1,
                Level::Info => tally.info += 1,
                Level::Uri => tally.uri += 1,
                Level::Warning if allowed.contains(message.kind()) => tally.allowed_warnings += 1,
                Level::Warning => {
                    tally.warnings += 1;
                    warnings.push(message.kind().clone());
                }
                Level::Bad => {
                    tally.bad += 1;
                    errors.push(message.kind().clone());
                }
                Level::Unrecognized(level) => {
                    let defect = ClassificationDefect {
                        kind: message.kind().to_string(),
                        level: level.clone(),
                    };
                    log::error!("[AssertionPolicy] {}", defect);
                    return Err(defect);
                }
            }
        }

        if actual != spec.expected_status() {
            return Ok(Verdict::Fail(CheckFailure::StatusMismatch {
                url,
                expected: spec.expected_status(),
                actual,
            }));
        }

        if !warnings.is_empty() || !errors.is_empty() {
            return Ok(Verdict::Fail(CheckFailure::UnexpectedDiagnostics {
                url,
                warnings,
                errors,
            }));
        }

        Ok(Verdict::Pass(tally))
    }

    /// Lines logged for one message: the summary, then the detail text when
    /// the catalog has one.
    fn log_lines(&self, message: &DiagnosticMessage) -> Vec<String> {
        let mut lines = vec![format!(
            "{}: {} ({})",
            message.category(),
            message.summary_text(&self.locale),
            message.kind()
        )];
        let detail = message.detail_text(&self.locale);
        if !detail.is_empty() {
            lines.push(detail);
        }
        lines
    }

    fn log_message(&self, message: &DiagnosticMessage) {
        let severity = match message.level() {
            Level::Bad => log::Level::Error,
            Level::Warning => log::Level::Warn,
            Level::Good | Level::Info | Level::Uri => log::Level::Info,
            // Reported by the caller as a defect.
            Level::Unrecognized(_) => return,
        };
        for line in self.log_lines(message) {
            log::log!(severity, "{}", line);
        }
    }
}
