//! Listener registry and notification driver.

use crate::query::{canonical_key, Constraint};
use crate::types::{CollectionName, Document};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::ListenerId;

/// Registry key: collection plus the canonical form of the constraint list.
/// Structural equality means equivalent queries built as fresh values on
/// every call land on the same entry.
pub(crate) type SubKey = (CollectionName, String);

/// Internal listener callback. Returns false to be removed from the
/// registry (used by channel forwarders on overflow/disconnect).
pub(crate) type Listener = Arc<dyn Fn(&[Document]) -> bool + Send + Sync>;

struct Entry {
    constraints: Vec<Constraint>,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Maps (collection, normalized query) to listener sets and drives
/// notification on mutation.
pub struct SubscriptionManager {
    entries: RwLock<HashMap<SubKey, Entry>>,
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener under the (collection, constraints) key.
    pub(crate) fn register(
        &self,
        collection: CollectionName,
        constraints: &[Constraint],
        listener: Listener,
    ) -> (SubKey, ListenerId) {
        let key = (collection, canonical_key(constraints));
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));

        let mut entries = self.entries.write();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
            constraints: constraints.to_vec(),
            listeners: Vec::new(),
        });
        entry.listeners.push((id, listener));

        (key, id)
    }

    /// Remove exactly one listener; garbage-collects the entry if it
    /// becomes empty. Unknown ids are a no-op.
    pub(crate) fn unsubscribe(&self, key: &SubKey, id: ListenerId) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(key) {
            entry.listeners.retain(|(lid, _)| *lid != id);
            if entry.listeners.is_empty() {
                entries.remove(key);
            }
        }
    }

    /// Re-run every query registered on `collection` and deliver the fresh
    /// result set to each listener, once per listener.
    ///
    /// Listener lists are snapshotted before delivery and the registry lock
    /// is not held while callbacks run, so a callback may subscribe or
    /// unsubscribe (itself or others) re-entrantly. A listener removed
    /// mid-delivery may still receive the in-flight notification.
    pub(crate) fn notify<Q>(&self, collection: CollectionName, run_query: Q)
    where
        Q: Fn(&[Constraint]) -> Vec<Document>,
    {
        let batches: Vec<(SubKey, Vec<Constraint>, Vec<(ListenerId, Listener)>)> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|((coll, _), _)| *coll == collection)
                .map(|(key, entry)| (key.clone(), entry.constraints.clone(), entry.listeners.clone()))
                .collect()
        };

        let mut to_remove: Vec<(SubKey, ListenerId)> = Vec::new();

        for (key, constraints, listeners) in batches {
            // One re-evaluation per entry, shared by all its listeners.
            let results = run_query(&constraints);
            for (id, listener) in listeners {
                if !listener(&results) {
                    to_remove.push((key.clone(), id));
                }
            }
        }

        for (key, id) in to_remove {
            tracing::debug!(collection = %collection, ?id, "dropping listener");
            self.unsubscribe(&key, id);
        }
    }

    /// Total registered listeners across all entries.
    pub fn listener_count(&self) -> usize {
        self.entries.read().values().map(|e| e.listeners.len()).sum()
    }

    /// Number of distinct (collection, query) entries.
    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
