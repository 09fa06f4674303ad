//! Cross-page notifications
//!
//! Pages publish an [`AdminEvent`] after changing a record so that others
//! (the dashboard in particular) can refresh without waiting for their timer.

use studio_core::EntityId;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of undelivered events kept per subscriber
pub const DEFAULT_CAPACITY: usize = 64;

/// Something another page may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    /// A booking's status changed
    BookingUpdated {
        /// Booking id
        id: EntityId,
    },
    /// A contact message's status changed
    ContactUpdated {
        /// Contact id
        id: EntityId,
    },
}

impl AdminEvent {
    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BookingUpdated { .. } => "bookingUpdated",
            Self::ContactUpdated { .. } => "contactUpdated",
        }
    }
}

/// Broadcast channel shared by all pages
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AdminEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Bus keeping up to `capacity` events per lagging subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send `event` to current subscribers; having none is not an error
    pub fn publish(&self, event: AdminEvent) {
        let name = event.name();
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(event = name, delivered, "published event");
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Receive events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.sender.subscribe()
    }
}
