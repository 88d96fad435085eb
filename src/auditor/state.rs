//! Terminal result of an auditor run.

use serde::Serialize;

use crate::error::RunError;
use crate::message::DiagnosticMessage;

/// What was received for the audited request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseSummary {
    pub status: u16,
    /// Response headers in wire order.
    pub headers: Vec<(String, String)>,
    #[serde(serialize_with = "serialize_body")]
    pub body: bytes::Bytes,
    /// Number of separately delivered body segments.
    pub segments: usize,
}

impl ResponseSummary {
    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn serialize_body<S: serde::Serializer>(body: &bytes::Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(body))
}

/// Terminal state of one run.
///
/// Built once by the run adapter through one of the constructors and never
/// modified afterwards. A completed state always has a response; a state that
/// did not complete never does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunState {
    url: String,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<ResponseSummary>,
    messages: Vec<DiagnosticMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    terminal_error: Option<RunError>,
}

impl RunState {
    pub fn completed(
        url: impl Into<String>,
        response: ResponseSummary,
        messages: Vec<DiagnosticMessage>,
    ) -> Self {
        Self {
            url: url.into(),
            completed: true,
            response: Some(response),
            messages,
            terminal_error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: RunError) -> Self {
        Self {
            url: url.into(),
            completed: false,
            response: None,
            messages: Vec::new(),
            terminal_error: Some(error),
        }
    }

    /// A run that stopped without a completion or a structured error.
    pub fn incomplete(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            completed: false,
            response: None,
            messages: Vec::new(),
            terminal_error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn response_status(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }

    pub fn response(&self) -> Option<&ResponseSummary> {
        self.response.as_ref()
    }

    /// Messages in discovery order.
    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn terminal_error(&self) -> Option<&RunError> {
        self.terminal_error.as_ref()
    }
}
