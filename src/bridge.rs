//! Concurrency bridge
//!
//! Runs a blocking [`RunAdapter`] on a dedicated OS thread and suspends the
//! calling task until the adapter's terminal state is handed back. The
//! caller's event loop keeps serving other tasks (the fixture server among
//! them) for the whole run.
//!
//! Handoff goes through a `tokio::sync::oneshot` channel: the worker sends
//! the finished [`RunState`] exactly once, which is the only wake-up the
//! waiting task gets. After the wake-up the worker thread is joined off the
//! loop with `spawn_blocking`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tokio::sync::oneshot;

use crate::auditor::{RunAdapter, RunState};
use crate::error::{log_run_error, RunError};

/// Bridges blocking auditor runs onto an async caller.
///
/// One bridge can serve any number of sequential or concurrent runs; the
/// counters cover all of them.
#[derive(Debug, Default)]
pub struct Bridge {
    runs_started: AtomicU64,
    handoffs_delivered: AtomicU64,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker threads started.
    pub fn runs_started(&self) -> u64 {
        self.runs_started.load(Ordering::SeqCst)
    }

    /// Number of terminal states handed back to a waiting caller.
    pub fn handoffs_delivered(&self) -> u64 {
        self.handoffs_delivered.load(Ordering::SeqCst)
    }

    /// Run `adapter` to completion without blocking the calling loop.
    ///
    /// No timeout: a run that never finishes keeps the caller waiting.
    pub async fn run<A: RunAdapter>(&self, adapter: A) -> RunState {
        let url = adapter.url().to_string();
        let run_id = self.runs_started.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel::<RunState>();

        let spawned = thread::Builder::new()
            .name(format!("auditor-run-{run_id}"))
            .spawn(move || {
                let state = adapter.run();
                if tx.send(state).is_err() {
                    log::warn!("[Bridge] Caller went away before run {} handed off", run_id);
                }
            });

        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                let err = RunError::Runtime {
                    details: format!("failed to spawn worker thread: {err}"),
                };
                log_run_error(&err, &url);
                return RunState::failed(url, err);
            }
        };
        tracing::debug!(run_id, url = %url, "[Bridge] Worker started");

        let state = match rx.await {
            Ok(state) => {
                self.handoffs_delivered.fetch_add(1, Ordering::SeqCst);
                state
            }
            Err(_) => {
                log::error!(
                    "[Bridge] Run {} for {} ended without a terminal state",
                    run_id,
                    url
                );
                RunState::incomplete(url.clone())
            }
        };

        match tokio::task::spawn_blocking(move || worker.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => log::error!("[Bridge] Worker for run {} panicked", run_id),
            Err(err) => log::error!("[Bridge] Failed to join worker for run {}: {}", run_id, err),
        }
        tracing::debug!(
            run_id,
            completed = state.is_completed(),
            "[Bridge] Run handed off"
        );

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auditor::ResponseSummary;
    use crate::message::{kinds, DiagnosticMessage, Level};
    use std::time::Duration;

    /// Adapter double that blocks its thread, then reports a fixed state.
    struct SlowAdapter {
        url: String,
        delay: Duration,
    }

    impl RunAdapter for SlowAdapter {
        fn url(&self) -> &str {
            &self.url
        }

        fn run(self) -> RunState {
            assert!(
                thread::current()
                    .name()
                    .is_some_and(|name| name.starts_with("auditor-run-")),
                "adapter must run on a bridge worker"
            );
            thread::sleep(self.delay);
            let response = ResponseSummary {
                status: 200,
                headers: vec![("Content-Type".into(), "text/plain".into())],
                body: bytes::Bytes::from_static(b"ok"),
                segments: 1,
            };
            let message = DiagnosticMessage::new(Level::Good, "connection", kinds::CL_CORRECT)
                .with_var("length", 2);
            RunState::completed(self.url, response, vec![message])
        }
    }

    struct PanickingAdapter;

    impl RunAdapter for PanickingAdapter {
        fn url(&self) -> &str {
            "http://127.0.0.1/boom"
        }

        fn run(self) -> RunState {
            panic!("adapter blew up");
        }
    }

    fn slow(delay_ms: u64) -> SlowAdapter {
        SlowAdapter {
            url: "http://127.0.0.1/slow".to_string(),
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[tokio::test]
    async fn test_handoff_carries_full_state() {
        let bridge = Bridge::new();
        let state = bridge.run(slow(10)).await;

        assert!(state.is_completed());
        assert_eq!(state.response_status(), Some(200));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].vars()["length"], "2");
        assert_eq!(bridge.handoffs_delivered(), 1);
    }

    #[tokio::test]
    async fn test_sequential_runs_hand_off_once_each() {
        let bridge = Bridge::new();
        for _ in 0..5 {
            let state = bridge.run(slow(1)).await;
            assert!(state.is_completed());
        }
        assert_eq!(bridge.runs_started(), 5);
        assert_eq!(bridge.handoffs_delivered(), 5);
    }

    #[tokio::test]
    async fn test_loop_keeps_serving_during_run() {
        let bridge = Bridge::new();
        let ticker = tokio::spawn(async {
            let mut ticks = 0u32;
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ticks += 1;
            }
            ticks
        });

        let state = bridge.run(slow(150)).await;
        assert!(state.is_completed());
        // The ticker finished while the run was still blocking its worker.
        assert!(ticker.is_finished());
        assert_eq!(ticker.await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_dead_worker_yields_incomplete_state() {
        let bridge = Bridge::new();
        let state = bridge.run(PanickingAdapter).await;

        assert!(!state.is_completed());
        assert!(state.response_status().is_none());
        assert!(state.terminal_error().is_none());
        assert_eq!(state.url(), "http://127.0.0.1/boom");
        assert_eq!(bridge.runs_started(), 1);
        assert_eq!(bridge.handoffs_delivered(), 0);
    }
}
