use std::future::Future;

use tokio::sync::watch;
use tokio::task::LocalSet;

/// Component G: a single-threaded cooperative event loop. Every other
/// component assumes it runs on one of these and never blocks a thread --
/// blocking reads are converted into awaited futures instead.
pub struct EventLoop {
    local: LocalSet,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self { local: LocalSet::new(), stop_tx, stop_rx }
    }

    /// Schedules a one-shot task to run after the current handler returns.
    /// Posted tasks do not run concurrently with each other in a meaningful
    /// sense -- this loop is cooperative, not parallel -- but they may
    /// interleave at `.await` points the same way any single-threaded
    /// async executor does.
    pub fn post<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.local.spawn_local(task);
    }

    /// Drives posted tasks until [`EventLoop::stop`] is called, including a
    /// `stop` recorded before `run` was even entered. Reentering `run` for
    /// another cycle (e.g. to resume after a stop issued from inside a
    /// posted task) requires [`EventLoop::reset`] first.
    pub async fn run(&self) {
        let mut stop_rx = self.stop_rx.clone();
        let stopped = async {
            if *stop_rx.borrow() {
                return;
            }
            while stop_rx.changed().await.is_ok() {
                if *stop_rx.borrow() {
                    return;
                }
            }
        };
        self.local.run_until(stopped).await;
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Clears a previously recorded stop so `run` can be entered again.
    pub fn reset(&self) {
        let _ = self.stop_tx.send(false);
    }
}
