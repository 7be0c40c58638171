//! Run one async request off the UI thread and hand its result back through
//! a channel the UI polls each frame.

use std::future::Future;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

/// A request in flight. Dropping it discards the eventual response.
pub struct Pending<T> {
    rx: Receiver<T>,
}

impl<T> Pending<T> {
    /// `Some` once the task finished; `None` while it is still running.
    ///
    /// A task that died without answering yields `on_lost()`.
    pub fn poll_or(&self, on_lost: impl FnOnce() -> T) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(on_lost()),
        }
    }
}

pub fn spawn_task<T, F>(future: F) -> Pending<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let (tx, rx) = channel();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("failed to start async runtime: {}", e);
                return;
            }
        };
        let _ = tx.send(rt.block_on(future));
    });
    Pending { rx }
}

/// Like [`spawn_task`] for a value that is already known; used by tests.
#[cfg(test)]
pub fn ready<T: Send + 'static>(value: T) -> Pending<T> {
    let (tx, rx) = channel();
    let _ = tx.send(value);
    Pending { rx }
}

/// Block until `pending` resolves; only for tests.
#[cfg(test)]
pub fn wait<T>(pending: &Pending<T>, on_lost: impl Fn() -> T) -> T {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        if let Some(v) = pending.poll_or(&on_lost) {
            return v;
        }
        assert!(std::time::Instant::now() < deadline, "background task timed out");
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
}
