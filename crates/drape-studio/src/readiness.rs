//! Screenshot readiness signal.
//!
//! A boundary is ready when its synthesized surfaces reflect the current
//! placement and finishes. Every mutation marks it pending; the final
//! synthesis pass settles it after a quiet delay. A settle scheduled
//! before a later mutation is ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use crate::StudioError;

#[derive(Debug)]
struct Inner {
    ready: watch::Sender<bool>,
    epoch: AtomicU64,
}

/// Shared, cloneable readiness flag with an async wait.
#[derive(Debug, Clone)]
pub struct Readiness {
    inner: Arc<Inner>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    /// A settled signal (nothing pending).
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                ready,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Whether the boundary is settled.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Mark work pending, invalidating any scheduled settle.
    pub fn mark_pending(&self) {
        self.inner.ready.send_modify(|ready| {
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            *ready = false;
        });
    }

    /// Settle immediately.
    pub fn settle_now(&self) {
        self.inner.ready.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    /// Settle after `delay` unless marked pending again in the meantime.
    ///
    /// # Panics
    ///
    /// Spawns a task, which panics outside a tokio runtime.
    pub fn settle_after(&self, delay: Duration) {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.settle_if_current(epoch);
        });
    }

    fn settle_if_current(&self, epoch: u64) {
        self.inner.ready.send_if_modified(|ready| {
            if *ready || self.inner.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *ready = true;
            true
        });
    }

    /// Wait until settled.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::ReadinessTimeout`] if the signal does not
    /// settle within `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<(), StudioError> {
        let mut rx = self.inner.ready.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|ready| *ready)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(StudioError::ReadinessTimeout(timeout)),
        }
    }
}
