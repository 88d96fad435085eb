//! Test-author entry point.
//!
//! A [`Harness`] owns a running fixture, a bridge and the assertion policy.
//! Each [`Harness::check_url`] call audits one path on the fixture with a fresh
//! network round trip and turns the result into a pass or a [`CheckFailure`].

use bytes::Bytes;
use serde::Serialize;

use crate::auditor::{AuditorRun, RunAdapter, RunRequest, RunState};
use crate::bridge::Bridge;
use crate::config::HarnessConfig;
use crate::fixture::FixtureServer;
use crate::message::MessageKind;
use crate::policy::{AssertionPolicy, CheckFailure, ExpectationSpec, Tally, Verdict};

/// One check against the fixture.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    path: String,
    method: String,
    body: Option<Bytes>,
    headers: Vec<(String, String)>,
    expected_status: u16,
    allowed_warning_kinds: Vec<MessageKind>,
}

impl CheckRequest {
    /// `GET path`, expecting 200.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: "GET".to_string(),
            body: None,
            headers: Vec::new(),
            expected_status: 200,
            allowed_warning_kinds: Vec::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn allow(mut self, kind: impl Into<MessageKind>) -> Self {
        self.allowed_warning_kinds.push(kind.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn expectation(&self) -> ExpectationSpec {
        self.allowed_warning_kinds
            .iter()
            .cloned()
            .fold(ExpectationSpec::new(self.expected_status), |spec, kind| {
                spec.allow(kind)
            })
    }
}

/// Outcome of a passing check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub status: u16,
    pub tally: Tally,
    pub state: RunState,
}

pub struct Harness {
    config: HarnessConfig,
    fixture: FixtureServer,
    bridge: Bridge,
    policy: AssertionPolicy,
}

impl Harness {
    /// Start the fixture on the current runtime.
    pub async fn start(config: HarnessConfig) -> anyhow::Result<Self> {
        let fixture = FixtureServer::start(&config.fixture).await?;
        let policy = AssertionPolicy::from_config(&config.policy);
        log::info!(
            "[Harness] Ready at {} (base allow-list: {:?})",
            fixture.base_url(),
            policy.warnings().base()
        );
        Ok(Self {
            config,
            fixture,
            bridge: Bridge::new(),
            policy,
        })
    }

    pub fn fixture(&self) -> &FixtureServer {
        &self.fixture
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn policy(&self) -> &AssertionPolicy {
        &self.policy
    }

    /// Audit any URL through the bridge and return the raw terminal state.
    pub async fn run_auditor(
        &self,
        url: impl Into<String>,
        method: impl Into<String>,
        body: Option<Bytes>,
        headers: Vec<(String, String)>,
    ) -> RunState {
        let request = RunRequest {
            url: url.into(),
            method: method.into(),
            body,
            headers,
        };
        let run = AuditorRun::new(request, self.config.auditor.clone());
        self.bridge.run(run).await
    }

    /// Audit a fixture path and evaluate it.
    ///
    /// # Panics
    /// When the run contains a message with an unrecognized level. That is a
    /// defect in the message model and must not pass as an ordinary failure.
    pub async fn check_url(&self, request: CheckRequest) -> Result<CheckReport, CheckFailure> {
        let auditor = self.config.auditor.clone();
        self.check_url_with(request, move |run_request| {
            AuditorRun::new(run_request, auditor)
        })
        .await
    }

    /// Like [`Harness::check_url`], with the run adapter built by `make_run`.
    ///
    /// # Panics
    /// Same as [`Harness::check_url`].
    pub async fn check_url_with<A, F>(
        &self,
        request: CheckRequest,
        make_run: F,
    ) -> Result<CheckReport, CheckFailure>
    where
        A: RunAdapter,
        F: FnOnce(RunRequest) -> A,
    {
        let url = self.fixture.url(&request.path);
        let spec = request.expectation();
        let run_request = RunRequest {
            url: url.clone(),
            method: request.method,
            body: request.body,
            headers: request.headers,
        };
        let state = self.bridge.run(make_run(run_request)).await;

        match self.policy.evaluate(&state, &spec) {
            Ok(Verdict::Pass(tally)) => {
                log::info!("[Harness] PASS {}", url);
                Ok(CheckReport {
                    url,
                    status: state.response_status().unwrap_or_default(),
                    tally,
                    state,
                })
            }
            Ok(Verdict::Fail(failure)) => {
                log::error!("[Harness] FAIL {}", failure);
                Err(failure)
            }
            Err(defect) => panic!("classification defect: {defect}"),
        }
    }

    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.fixture.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auditor::ResponseSummary;
    use crate::message::{kinds, DiagnosticMessage, Level};

    /// Adapter double that reports a canned set of messages for any request.
    struct CannedRun {
        url: String,
        messages: Vec<DiagnosticMessage>,
    }

    impl RunAdapter for CannedRun {
        fn url(&self) -> &str {
            &self.url
        }

        fn run(self) -> RunState {
            let response = ResponseSummary {
                status: 200,
                headers: vec![("Content-Type".into(), "text/plain".into())],
                body: Bytes::from_static(b"ok"),
                segments: 1,
            };
            RunState::completed(self.url, response, self.messages)
        }
    }

    fn canned(messages: Vec<DiagnosticMessage>) -> impl FnOnce(RunRequest) -> CannedRun {
        move |request| CannedRun {
            url: request.url,
            messages,
        }
    }

    #[test]
    fn test_expectation_carries_allowances() {
        let spec = CheckRequest::new("/redirect/hello")
            .expect_status(302)
            .allow(kinds::CT_MISSING)
            .expectation();
        assert_eq!(spec.expected_status(), 302);
        assert!(spec.allowed_warning_kinds().contains(&kinds::CT_MISSING));
    }

    #[tokio::test]
    async fn test_check_with_stub_run_passes() {
        let harness = Harness::start(HarnessConfig::default())
            .await
            .expect("harness starts");
        let message = DiagnosticMessage::new(Level::Good, "connection", kinds::CL_CORRECT);

        let report = harness
            .check_url_with(CheckRequest::new("/anything"), canned(vec![message]))
            .await
            .expect("stub run passes");
        assert_eq!(report.status, 200);
        assert_eq!(report.url, harness.fixture().url("/anything"));
        assert_eq!(report.tally.good, 1);
        assert_eq!(harness.bridge().handoffs_delivered(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "classification defect")]
    async fn test_unrecognized_level_aborts_check() {
        let harness = Harness::start(HarnessConfig::default())
            .await
            .expect("harness starts");
        let rogue = DiagnosticMessage::new(Level::from("critical"), "general", kinds::CT_MISSING);

        let _ = harness
            .check_url_with(CheckRequest::new("/hello"), canned(vec![rogue]))
            .await;
    }
}
