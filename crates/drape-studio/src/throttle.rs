//! Timer-gated, single in-flight, latest-wins scheduler.
//!
//! [`Throttle::schedule`] stores a value and, if no timer is running,
//! starts one. When the window elapses the most recent value is handed to
//! the handler; values scheduled in between are overwritten. After each
//! run the throttle waits another window before it fires again, so the
//! handler runs at most once per window and never concurrently with
//! itself.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;

type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct State<T> {
    pending: Option<T>,
    task: Option<JoinHandle<()>>,
}

fn lock<T>(state: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coalesces bursts of values into at most one handler call per window.
pub struct Throttle<T> {
    window: Duration,
    handler: Handler<T>,
    state: Arc<Mutex<State<T>>>,
}

impl<T: Send + 'static> Throttle<T> {
    /// Create a throttle that hands the latest value to `handler`.
    pub fn new<F>(window: Duration, handler: F) -> Self
    where
        F: Fn(T) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            window,
            handler: Arc::new(handler),
            state: Arc::new(Mutex::new(State {
                pending: None,
                task: None,
            })),
        }
    }

    /// Replace the pending value, arming the timer if it is idle.
    ///
    /// # Panics
    ///
    /// Arming the timer spawns a task, which panics outside a tokio
    /// runtime.
    pub fn schedule(&self, value: T) {
        let mut state = lock(&self.state);
        state.pending = Some(value);
        if state.task.is_some() {
            return;
        }
        let window = self.window;
        let handler = Arc::clone(&self.handler);
        let shared = Arc::clone(&self.state);
        state.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(window).await;
                let next = {
                    let mut state = lock(&shared);
                    let next = state.pending.take();
                    if next.is_none() {
                        state.task = None;
                    }
                    next
                };
                let Some(value) = next else {
                    break;
                };
                handler(value).await;
            }
        }));
    }

    /// Drop the pending value and stop the timer.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.pending = None;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    /// Whether a value is waiting for the next window.
    ///
    /// Unlike [`is_idle`](Self::is_idle) this ignores the trailing window
    /// the timer sleeps through after a run.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Whether nothing is pending and no timer is armed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let state = lock(&self.state);
        state.pending.is_none() && state.task.is_none()
    }

    /// The coalescing window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl<T> Drop for Throttle<T> {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.state).task.take() {
            task.abort();
        }
    }
}

impl<T> std::fmt::Debug for Throttle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    fn recorder(window: Duration) -> (Throttle<u32>, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let throttle = Throttle::new(window, move |value| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().unwrap().push(value) }.boxed()
        });
        (throttle, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_delivers_last_value_once() {
        let (throttle, seen) = recorder(Duration::from_millis(300));
        for i in 1..=10 {
            throttle.schedule(i);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(seen.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*seen.lock().unwrap(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_values_fire_separately() {
        let (throttle, seen) = recorder(Duration::from_millis(300));
        throttle.schedule(1);
        tokio::time::sleep(Duration::from_millis(350)).await;
        throttle.schedule(2);
        tokio::time::sleep(Duration::from_millis(650)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(throttle.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_window_holds_nothing_pending() {
        let (throttle, seen) = recorder(Duration::from_millis(300));
        throttle.schedule(1);
        assert!(throttle.has_pending());
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(!throttle.has_pending());
        assert!(!throttle.is_idle());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(throttle.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending() {
        let (throttle, seen) = recorder(Duration::from_millis(20));
        throttle.schedule(7);
        throttle.cancel();
        assert!(throttle.is_idle());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
