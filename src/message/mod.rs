//! Diagnostic message model.
//!
//! A [`DiagnosticMessage`] is one finding the auditor made about a single HTTP
//! exchange. The harness only reads the level, category and kind, and renders
//! the text for logs and reports.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod kinds;


/// Severity/classification of a finding.
///
/// `Unrecognized` exists so that a message produced by a different auditor
/// version can still be represented; the assertion policy refuses to classify
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    Good,
    Info,
    Warning,
    Bad,
    Uri,
    Unrecognized(String),
}

impl Level {
    pub fn as_str(&self) -> &str {
        match self {
            Level::Good => "good",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Bad => "bad",
            Level::Uri => "uri",
            Level::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Level::Unrecognized(_))
    }
}

impl From<&str> for Level {
    fn from(raw: &str) -> Self {
        match raw {
            "good" => Level::Good,
            "info" => Level::Info,
            "warning" => Level::Warning,
            "bad" => Level::Bad,
            "uri" => Level::Uri,
            other => Level::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Level {
    fn from(raw: String) -> Self {
        Level::from(raw.as_str())
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        match level {
            Level::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of the check that produced a message.
///
/// Allow-lists are expressed in kinds, never in message text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKind(Cow<'static, str>);

impl MessageKind {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageKind {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl From<&str> for MessageKind {
    fn from(id: &str) -> Self {
        Self(Cow::Owned(id.to_string()))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One finding about an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    level: Level,
    category: String,
    kind: MessageKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    vars: BTreeMap<String, String>,
}

impl DiagnosticMessage {
    pub fn new(level: Level, category: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            level,
            category: category.into(),
            kind,
            vars: BTreeMap::new(),
        }
    }

    /// Attach a named value used when rendering the text templates.
    pub fn with_var(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// One-line rendering in the given locale.
    pub fn summary_text(&self, locale: &str) -> String {
        match catalog::lookup(&self.kind, locale) {
            Some(text) => catalog::render(text.summary, &self.vars),
            None => self.kind.to_string(),
        }
    }

    /// Full explanation in the given locale; empty for kinds the catalog does
    /// not know.
    pub fn detail_text(&self, locale: &str) -> String {
        match catalog::lookup(&self.kind, locale) {
            Some(text) => catalog::render(text.detail, &self.vars),
            None => String::new(),
        }
    }
}
