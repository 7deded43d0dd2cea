//! One-shot authorization latch.
//!
//! The proof channel flips this exactly once, on the first successful
//! proof verification. Concurrent handlers race on `latch()`; exactly one
//! of them observes the transition. Waiters parked in `wait()` are woken
//! when the transition happens, or return immediately if it already has.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct AuthorizationLatch {
    set: AtomicBool,
    notify: Notify,
}

impl AuthorizationLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch. Returns `true` only for the call that performed the
    /// false -> true transition.
    pub fn latch(&self) -> bool {
        let transitioned = self
            .set
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if transitioned {
            self.notify.notify_waiters();
        }
        transitioned
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Resolve once the latch has been set.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a concurrent latch() cannot slip between.
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}
