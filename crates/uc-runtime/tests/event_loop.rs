use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use uc_runtime::{EventLoop, Timer};

#[tokio::test]
async fn posted_tasks_run_before_stop() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(RefCell::new(false));
    let ran_task = ran.clone();
    event_loop.post(async move {
        *ran_task.borrow_mut() = true;
    });
    event_loop.stop();
    event_loop.run().await;
    assert!(*ran.borrow());
}

#[tokio::test]
async fn timer_fires_after_duration() {
    let event_loop = EventLoop::new();
    let fired = Rc::new(RefCell::new(false));
    let fired_task = fired.clone();
    let _timer = Timer::async_wait(&event_loop, Duration::from_millis(1), move |result| {
        assert!(result.is_ok());
        *fired_task.borrow_mut() = true;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    event_loop.stop();
    event_loop.run().await;
    assert!(*fired.borrow());
}

#[tokio::test]
async fn cancelled_timer_reports_cancellation() {
    let event_loop = EventLoop::new();
    let outcome = Rc::new(RefCell::new(None));
    let outcome_task = outcome.clone();
    let timer = Timer::async_wait(&event_loop, Duration::from_secs(5), move |result| {
        *outcome_task.borrow_mut() = Some(result.is_err());
    });
    timer.cancel();

    tokio::time::sleep(Duration::from_millis(10)).await;
    event_loop.stop();
    event_loop.run().await;
    assert_eq!(*outcome.borrow(), Some(true));
}
