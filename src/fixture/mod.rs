//! Local HTTP server the harness audits.
//!
//! The listener is bound in [`FixtureServer::start`] before it returns, so the
//! base URL is reachable before any run starts. The server runs as a task on
//! the caller's runtime and is stopped through graceful shutdown.

mod routes;


pub use routes::{build_router, CHUNKED_SEGMENTS, HELLO_BODY};

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::FixtureConfig;

/// Handle to a running fixture server. Dropping it stops the server.
pub struct FixtureServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl FixtureServer {
    /// Bind and start serving on the current runtime.
    pub async fn start(config: &FixtureConfig) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("binding fixture listener on {}", config.bind_addr))?;
        let addr = listener
            .local_addr()
            .context("reading fixture listener address")?;
        let router = build_router(&config.static_root);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .context("serving fixture router")
        });

        log::info!(
            "[Fixture] Listening on http://{} (static root {:?})",
            addr,
            config.static_root
        );
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop accepting connections and wait for the server task to finish.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.context("joining fixture server task")??;
        }
        log::info!("[Fixture] Stopped http://{}", self.addr);
        Ok(())
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
