//! Event broadcaster for view invalidation.
//!
//! The `EventBroadcaster` is the bus every mutation publishes to and every
//! data-holding view subscribes to. It wraps tokio's broadcast channel.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ViewEvent;
use crate::model::PatientId;

/// Default buffer size for the broadcast channel.
/// Events beyond this limit will cause older events to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 64;

/// Broadcaster for view events.
///
/// Cheap to clone; clones share one channel.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ViewEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns 0 if there are no active subscribers.
    pub fn send(&self, event: ViewEvent) -> usize {
        tracing::debug!(event = %event, "view invalidated");
        self.sender.send(event).unwrap_or_default()
    }

    pub fn send_patient_list_invalidated(&self) -> usize {
        self.send(ViewEvent::PatientListInvalidated)
    }

    pub fn send_patient_invalidated(&self, patient_id: impl Into<PatientId>) -> usize {
        self.send(ViewEvent::patient(patient_id))
    }

    pub fn send_templates_invalidated(&self) -> usize {
        self.send(ViewEvent::TemplatesInvalidated)
    }

    /// Subscribe to events.
    ///
    /// Note: Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
