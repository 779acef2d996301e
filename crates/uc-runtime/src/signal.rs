use std::cell::RefCell;
use std::rc::Rc;

use tokio::signal::unix::{signal, SignalKind};

use crate::event_loop::EventLoop;

/// Registers a callback for a set of POSIX signals on the event loop.
/// Re-arming after each delivery is automatic -- the registration loops for
/// the lifetime of the event loop rather than firing once.
pub struct SignalHandler;

impl SignalHandler {
    pub fn register<F>(event_loop: &EventLoop, kinds: &[SignalKind], on_signal: F)
    where
        F: FnMut(SignalKind) + 'static,
    {
        let shared = Rc::new(RefCell::new(on_signal));
        for &kind in kinds {
            let mut stream = match signal(kind) {
                Ok(s) => s,
                Err(e) => {
                    log::error!("failed to register signal handler for {kind:?}: {e}");
                    continue;
                }
            };
            let callback = shared.clone();
            event_loop.post(async move {
                loop {
                    if stream.recv().await.is_none() {
                        return;
                    }
                    (callback.borrow_mut())(kind);
                }
            });
        }
    }
}
