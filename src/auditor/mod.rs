//! Auditor run adapter
//!
//! An [`AuditorRun`] audits one URL. It owns a private current-thread tokio
//! runtime, performs the exchange (plus an optional conditional follow-up),
//! runs the checks and hands back exactly one terminal [`RunState`]. It blocks
//! the calling thread, so callers on an event loop go through
//! [`crate::bridge::Bridge`].

mod checks;
mod client;
mod state;

pub use state::{ResponseSummary, RunState};

use bytes::Bytes;
use hyper::Method;

use crate::config::AuditorConfig;
use crate::error::{log_run_error, RunError};

/// Something that runs to completion on the current thread and yields one
/// terminal state.
pub trait RunAdapter: Send + 'static {
    /// URL being audited, used when the run dies without a handoff.
    fn url(&self) -> &str;

    fn run(self) -> RunState;
}

/// What to audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub url: String,
    pub method: String,
    pub body: Option<Bytes>,
    /// Sent in this order; duplicates are kept.
    pub headers: Vec<(String, String)>,
}

impl RunRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            body: None,
            headers: Vec::new(),
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
}

/// One auditor run, ready to execute.
#[derive(Debug, Clone)]
pub struct AuditorRun {
    request: RunRequest,
    config: AuditorConfig,
}

impl AuditorRun {
    pub fn new(request: RunRequest, config: AuditorConfig) -> Self {
        Self { request, config }
    }

    pub fn request(&self) -> &RunRequest {
        &self.request
    }

    async fn execute(&self) -> Result<RunState, RunError> {
        let request = &self.request;
        let target = client::Target::parse(&request.url)?;
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            RunError::InvalidRequest {
                reason: format!("invalid method '{}'", request.method),
            }
        })?;

        let exchange = client::send(
            &target,
            &method,
            &request.headers,
            request.body.as_ref(),
            &self.config,
        )
        .await?;
        log::debug!(
            "[AuditorRun] {} {} -> {} ({} body segments)",
            method,
            request.url,
            exchange.response.status,
            exchange.response.segments
        );

        let mut messages = checks::check_response(&method, &exchange);

        if self.config.validate_conditionals {
            if let Some(validator) = checks::validator_for(&method, &exchange.response) {
                let headers = client::conditional_headers(&request.headers, &validator);
                let outcome =
                    client::send(&target, &Method::GET, &headers, None, &self.config).await;
                messages.extend(checks::check_revalidation(
                    &validator,
                    &exchange.response,
                    outcome.as_ref().map(|conditional| &conditional.response),
                ));
            }
        }

        Ok(RunState::completed(
            request.url.clone(),
            exchange.response,
            messages,
        ))
    }
}

impl RunAdapter for AuditorRun {
    fn url(&self) -> &str {
        &self.request.url
    }

    /// Drive the run on a private runtime until it reaches a terminal state.
    ///
    /// Refuses to run on a thread that is already inside a tokio runtime,
    /// since blocking there would stall that loop.
    fn run(self) -> RunState {
        let url = self.request.url.clone();

        if tokio::runtime::Handle::try_current().is_ok() {
            let err = RunError::Runtime {
                details: "refusing to block a thread that drives an event loop".to_string(),
            };
            log_run_error(&err, &url);
            return RunState::failed(url, err);
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let err = RunError::Runtime {
                    details: err.to_string(),
                };
                log_run_error(&err, &url);
                return RunState::failed(url, err);
            }
        };

        log::info!("[AuditorRun] Auditing {} {}", self.request.method, url);
        match runtime.block_on(self.execute()) {
            Ok(state) => {
                log::info!(
                    "[AuditorRun] Completed {} with {} messages",
                    url,
                    state.messages().len()
                );
                state
            }
            Err(err) => {
                log_run_error(&err, &url);
                RunState::failed(url, err)
            }
        }
    }
}
