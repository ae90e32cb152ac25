//! Subscription types for live query updates.

use crate::types::Document;
use serde::{Deserialize, Serialize};

/// Unique identifier for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Events delivered to channel-backed subscribers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A fresh result set for the subscribed query.
    ///
    /// Sent once on subscribe and once per mutation of the collection.
    ResultSet { documents: Vec<Document> },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver side was dropped.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Guard for a registered listener.
///
/// Call [`Subscription::unsubscribe`] to remove exactly this listener.
/// Dropping the guard without unsubscribing leaves the listener registered;
/// the lifecycle is deliberately explicit.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove this listener from the registry.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription(active: {})", self.cancel.is_some())
    }
}

/// Handle for a channel-backed subscription.
///
/// Wraps a registered listener that forwards result sets into a bounded
/// channel. If the buffer fills up, the subscriber is dropped and a final
/// best-effort [`StoreEvent::Dropped`] is sent.
pub struct SubscriptionHandle {
    pub(crate) receiver: crossbeam_channel::Receiver<StoreEvent>,
    pub(crate) subscription: Subscription,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Stop receiving and remove the underlying listener.
    pub fn unsubscribe(self) {
        self.subscription.unsubscribe();
    }
}
