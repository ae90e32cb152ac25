//! Subscription system for live query results.
//!
//! A subscription pairs a (collection, query) key with a set of listener
//! callbacks. Every mutation of a collection re-runs the registered queries
//! once each and pushes the fresh result set to every listener, so
//! subscribers always hold the full, current matching set (rebroadcast, not
//! incremental diff).
//!
//! Two consumption styles are supported:
//! - callback: [`crate::DocumentStore::subscribe`] invokes a closure
//!   synchronously on every change
//! - channel: [`crate::DocumentStore::subscribe_channel`] returns a
//!   [`SubscriptionHandle`] backed by a bounded channel, with slow
//!   consumers dropped on overflow

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{DropReason, ListenerId, StoreEvent, Subscription, SubscriptionHandle};

pub(crate) use manager::{Listener, SubKey};
