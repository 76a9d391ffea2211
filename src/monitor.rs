//! Background health probing
//!
//! Probes /health on every configured host once immediately and then on a
//! fixed interval. Probe failures are absorbed; the executor has already
//! recorded them on the host. Shutdown cancels an in-progress round.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::api::HealthResponse;
use crate::client::Inner;
use crate::executor::{RequestExecutor, HEALTH_PATH};
use crate::hosts::HostRegistry;

/// Probe every host's health endpoint concurrently
pub async fn run_health_checks(registry: &HostRegistry, executor: &RequestExecutor) {
    let checks = registry.all_hosts().iter().map(|host| async move {
        if let Err(e) = executor.execute::<HealthResponse>(host, HEALTH_PATH, None).await {
            tracing::debug!(host = %host.name, error = %e, "Health probe failed");
        }
    });
    join_all(checks).await;

    let healthy = registry.all_hosts().iter().filter(|h| h.is_healthy()).count();
    tracing::debug!(healthy, total = registry.len(), "Health check round complete");
}

/// Handle to the running monitor task. Dropping it stops the task.
pub struct MonitorHandle {
    shutdown: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Start the monitor on the current Tokio runtime
    pub(crate) fn spawn(inner: Arc<Inner>, interval: Duration) -> Self {
        let (shutdown, rx) = broadcast::channel(1);
        let task = tokio::spawn(run(inner, interval, rx));
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Signal the monitor and wait for it to exit
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(inner: Arc<Inner>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
    tracing::debug!(interval_secs = interval.as_secs(), "Health monitor starting");

    // First tick fires immediately
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.recv() => break,
        }

        // Shutdown must not wait out a Retry-After backoff inside the round
        tokio::select! {
            _ = run_health_checks(&inner.registry, &inner.executor) => {}
            _ = shutdown.recv() => {
                tracing::debug!("Health monitor interrupted mid-round");
                break;
            }
        }
    }

    tracing::debug!("Health monitor received shutdown signal, exiting loop");
}
