use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::TimerError;
use crate::event_loop::EventLoop;

/// A cancellable deferred call, posted onto an [`EventLoop`]. Cancelling
/// after the timer has already fired is a no-op.
pub struct Timer {
    cancel: Rc<Notify>,
}

impl Timer {
    pub fn async_wait<F>(event_loop: &EventLoop, duration: Duration, on_fire: F) -> Self
    where
        F: FnOnce(Result<(), TimerError>) + 'static,
    {
        let cancel = Rc::new(Notify::new());
        let cancel_task = cancel.clone();
        event_loop.post(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => on_fire(Ok(())),
                _ = cancel_task.notified() => on_fire(Err(TimerError::Cancelled)),
            }
        });
        Timer { cancel }
    }

    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}
