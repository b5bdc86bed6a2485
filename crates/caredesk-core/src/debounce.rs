//! Trailing-edge debounce on top of a tokio timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default quiet period before search text becomes the effective filter.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Publishes a value only after `delay` has passed without a newer one.
///
/// Scheduling a value cancels the pending one and restarts the timer. The
/// pending timer is aborted on drop, so a torn-down view never receives a
/// late update.
pub struct Debouncer<T> {
    delay: Duration,
    sender: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            delay,
            sender: Arc::new(sender),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `value`, replacing anything still pending.
    ///
    /// Outside a tokio runtime there is no timer to wait on, so the value
    /// is published immediately.
    pub fn schedule(&mut self, value: T) {
        self.cancel();
        let Ok(runtime) = Handle::try_current() else {
            self.sender.send_replace(value);
            return;
        };
        let sender = Arc::clone(&self.sender);
        let delay = self.delay;
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_replace(value);
        }));
    }

    /// Publish `value` immediately, dropping anything pending.
    pub fn publish_now(&mut self, value: T) {
        self.cancel();
        self.sender.send_replace(value);
    }

    /// Drop the pending value, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// The last published value.
    pub fn current(&self) -> watch::Ref<'_, T> {
        self.sender.borrow()
    }

    /// Receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("current", &*self.sender.borrow())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
