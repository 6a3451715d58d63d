//! Run-level cancellation.
//!
//! A [`Shutdown`] handle is shared between whoever may stop a run (a Ctrl+C handler, a
//! timeout) and the [`Queue`](crate::Queue) doing the work. Triggering it makes the run drop
//! every in-flight download, which removes their partially written files, and return what it
//! has so far.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

pub type SharedShutdown = Arc<Shutdown>;

#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Requests shutdown. Waiters are woken only the first time.
    pub fn trigger(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown is requested, immediately if it already was.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }
}
