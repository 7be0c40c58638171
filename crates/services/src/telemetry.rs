//! Periodic system-information polling for the paired device.
//!
//! At most one fetch is in flight: the next one is scheduled only after the
//! previous one settles. A failed fetch empties the snapshot instead of
//! surfacing an error; displays treat the empty snapshot as "no data".

use crate::backend::BackendClient;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::device::SystemInformation;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;

#[async_trait]
pub trait TelemetrySource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<SystemInformation>;
}

#[async_trait]
impl TelemetrySource for BackendClient {
    async fn fetch(&self) -> Result<SystemInformation> {
        self.system_information().await
    }
}

/// Poll `source` until `shutdown` fires, writing each outcome to `snapshot`.
pub async fn run_poll_loop<S, F>(
    source: &S,
    interval: Duration,
    snapshot: &Mutex<SystemInformation>,
    on_update: F,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: TelemetrySource + ?Sized,
    F: Fn(),
{
    loop {
        let outcome = tokio::select! {
            _ = &mut shutdown => break,
            outcome = source.fetch() => outcome,
        };
        let next = match outcome {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!("telemetry fetch failed: {}", e);
                SystemInformation::default()
            }
        };
        {
            let mut current = snapshot.lock();
            if *current != next {
                *current = next;
                drop(current);
                on_update();
            }
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    tracing::debug!("telemetry poller stopped");
}

/// Owns the background polling thread; stopping or dropping it ends the loop
/// and joins the thread.
pub struct TelemetryPoller {
    snapshot: Arc<Mutex<SystemInformation>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TelemetryPoller {
    pub fn spawn<S: TelemetrySource>(source: S, interval: Duration) -> Self {
        Self::spawn_with_notify(source, interval, || {})
    }

    /// Like [`spawn`](Self::spawn), calling `on_update` whenever the
    /// snapshot changes (the UI uses it to request a repaint).
    pub fn spawn_with_notify<S, F>(source: S, interval: Duration, on_update: F) -> Self
    where
        S: TelemetrySource,
        F: Fn() + Send + 'static,
    {
        let snapshot = Arc::new(Mutex::new(SystemInformation::default()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let shared = Arc::clone(&snapshot);

        let handle = std::thread::Builder::new()
            .name("telemetry-poller".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::warn!("telemetry poller could not start a runtime: {}", e);
                        return;
                    }
                };
                rt.block_on(run_poll_loop(&source, interval, &shared, on_update, shutdown_rx));
            });

        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!("failed to spawn telemetry poller: {}", e);
                None
            }
        };

        Self {
            snapshot,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Latest snapshot; empty until the first successful fetch.
    pub fn snapshot(&self) -> SystemInformation {
        self.snapshot.lock().clone()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
