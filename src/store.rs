//! The document store: authoritative holder of all collections.

use crate::documents;
use crate::error::{Result, StoreError};
use crate::query::{self, Constraint};
use crate::subscriptions::{
    DropReason, StoreEvent, Subscription, SubscriptionHandle, SubscriptionManager,
};
use crate::types::{generate_id, CollectionName, Document, Timestamp};
use crossbeam_channel::bounded;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// What `update` does when the document id is not present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingUpdatePolicy {
    /// Silently create the document with the given id (legacy behavior).
    Upsert,
    /// Fail with [`StoreError::DocumentNotFound`].
    Fail,
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Policy for `update` on a missing id.
    pub missing_update: MissingUpdatePolicy,

    /// Validate merged documents against their collection's canonical
    /// shape before committing. Off reproduces fully duck-typed documents.
    pub validate_documents: bool,

    /// Buffer size for channel-backed subscriptions.
    pub channel_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            missing_update: MissingUpdatePolicy::Upsert,
            validate_documents: true,
            channel_buffer_size: 1000,
        }
    }
}

/// In-process reactive document store.
///
/// Holds the fixed set of collections as maps from document id to document.
/// Every mutation synchronously re-runs the queries registered on the
/// affected collection and delivers fresh result sets to all listeners
/// before the mutating call returns, so callbacks always observe
/// post-mutation state. Notification cost is O(collection size) per
/// registered query.
///
/// Construct explicitly and share via `Arc`; there is no global instance.
pub struct DocumentStore {
    config: StoreConfig,
    collections: RwLock<HashMap<CollectionName, HashMap<String, Document>>>,
    subscriptions: Arc<SubscriptionManager>,
    /// Serializes mutations so merge + commit is atomic.
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Create a store with all collections present and empty.
    pub fn new(config: StoreConfig) -> Self {
        let mut collections = HashMap::new();
        for name in CollectionName::ALL {
            collections.insert(name, HashMap::new());
        }
        Self {
            config,
            collections: RwLock::new(collections),
            subscriptions: Arc::new(SubscriptionManager::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- CRUD ---

    /// Add a document. Generates a fresh id, stamps `createdAt`/`updatedAt`
    /// (any caller-supplied values for these are overwritten), and notifies
    /// subscribers. Returns the new id.
    pub fn add(&self, collection: CollectionName, fields: Document) -> Result<String> {
        let id = generate_id();
        let now = Timestamp::now();

        let mut doc = fields;
        doc.insert("id".to_string(), id.clone().into());
        doc.insert("createdAt".to_string(), now.as_str().into());
        doc.insert("updatedAt".to_string(), now.as_str().into());

        {
            let _write = self.write_lock.lock();
            self.validate(collection, &doc)?;
            self.collections
                .write()
                .get_mut(&collection)
                .expect("all collections exist from construction")
                .insert(id.clone(), doc);
        }

        tracing::debug!(collection = %collection, id = %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    /// Merge fields into an existing document (shallow: top-level fields in
    /// `fields` replace stored ones; everything else is untouched) and
    /// refresh `updatedAt`. A missing id follows
    /// [`StoreConfig::missing_update`]. `id` and `createdAt` cannot be
    /// changed through this path.
    pub fn update(&self, collection: CollectionName, id: &str, fields: Document) -> Result<()> {
        self.merge_document(collection, id, fields, self.config.missing_update)
    }

    /// Merge fields into the document with the given id, creating it if
    /// absent regardless of the configured missing-update policy. Used for
    /// documents whose ids are owned by the caller (seed data, mirrored
    /// user profiles).
    pub fn upsert(&self, collection: CollectionName, id: &str, fields: Document) -> Result<()> {
        self.merge_document(collection, id, fields, MissingUpdatePolicy::Upsert)
    }

    fn merge_document(
        &self,
        collection: CollectionName,
        id: &str,
        fields: Document,
        policy: MissingUpdatePolicy,
    ) -> Result<()> {
        let now = Timestamp::now();

        {
            let _write = self.write_lock.lock();
            let existing = self
                .collections
                .read()
                .get(&collection)
                .expect("all collections exist from construction")
                .get(id)
                .cloned();

            let merged = match existing {
                Some(mut doc) => {
                    for (field, value) in fields {
                        doc.insert(field, value);
                    }
                    // Identity fields are immutable through update.
                    doc.insert("id".to_string(), id.into());
                    doc.insert("updatedAt".to_string(), now.as_str().into());
                    doc
                }
                None => match policy {
                    MissingUpdatePolicy::Fail => {
                        return Err(StoreError::DocumentNotFound {
                            collection,
                            id: id.to_string(),
                        })
                    }
                    MissingUpdatePolicy::Upsert => {
                        let mut doc = fields;
                        doc.insert("id".to_string(), id.into());
                        doc.insert("createdAt".to_string(), now.as_str().into());
                        doc.insert("updatedAt".to_string(), now.as_str().into());
                        doc
                    }
                },
            };

            // Validate before committing so a rejected merge leaves the
            // stored document untouched.
            self.validate(collection, &merged)?;
            self.collections
                .write()
                .get_mut(&collection)
                .expect("all collections exist from construction")
                .insert(id.to_string(), merged);
        }

        tracing::debug!(collection = %collection, id = %id, "document updated");
        self.notify(collection);
        Ok(())
    }

    /// Delete the document if present. A missing id is a no-op, and
    /// subscribers are notified either way.
    pub fn remove(&self, collection: CollectionName, id: &str) -> Result<()> {
        let removed = {
            let _write = self.write_lock.lock();
            self.collections
                .write()
                .get_mut(&collection)
                .expect("all collections exist from construction")
                .remove(id)
                .is_some()
        };

        tracing::debug!(collection = %collection, id = %id, removed, "document removed");
        self.notify(collection);
        Ok(())
    }

    /// Point lookup. No side effects.
    pub fn get(&self, collection: CollectionName, id: &str) -> Option<Document> {
        self.collections
            .read()
            .get(&collection)?
            .get(id)
            .cloned()
    }

    /// Evaluate constraints against the collection and return a snapshot
    /// copy of the matching documents. An empty constraint list returns the
    /// whole collection. Linear scan; iteration order is unspecified.
    pub fn query(&self, collection: CollectionName, constraints: &[Constraint]) -> Vec<Document> {
        let collections = self.collections.read();
        let map = match collections.get(&collection) {
            Some(map) => map,
            None => return Vec::new(),
        };
        map.values()
            .filter(|doc| query::matches(doc, constraints))
            .cloned()
            .collect()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: CollectionName) -> usize {
        self.collections
            .read()
            .get(&collection)
            .map_or(0, |map| map.len())
    }

    pub fn is_empty(&self, collection: CollectionName) -> bool {
        self.len(collection) == 0
    }

    /// Drop every document in a collection and notify subscribers.
    /// Intended for test isolation.
    pub fn clear(&self, collection: CollectionName) {
        {
            let _write = self.write_lock.lock();
            if let Some(map) = self.collections.write().get_mut(&collection) {
                map.clear();
            }
        }
        self.notify(collection);
    }

    // --- Subscriptions ---

    /// Register a callback for the live result of (collection, constraints).
    ///
    /// The callback receives the current snapshot immediately, then a fresh
    /// result set after every mutation of the collection, synchronously on
    /// the mutating call. Structurally equal constraint lists share one
    /// registry entry and one re-evaluation per mutation.
    pub fn subscribe<F>(
        &self,
        collection: CollectionName,
        constraints: &[Constraint],
        callback: F,
    ) -> Subscription
    where
        F: Fn(&[Document]) + Send + Sync + 'static,
    {
        let listener: crate::subscriptions::Listener = Arc::new(move |docs| {
            callback(docs);
            true
        });
        self.subscribe_listener(collection, constraints, listener)
    }

    /// Channel-backed variant of [`subscribe`](Self::subscribe): result
    /// sets are forwarded into a bounded channel. On buffer overflow the
    /// subscriber is dropped with a best-effort
    /// [`StoreEvent::Dropped`] event.
    pub fn subscribe_channel(
        &self,
        collection: CollectionName,
        constraints: &[Constraint],
    ) -> SubscriptionHandle {
        let (sender, receiver) = bounded(self.config.channel_buffer_size);

        let listener: crate::subscriptions::Listener = Arc::new(move |docs: &[Document]| {
            let event = StoreEvent::ResultSet {
                documents: docs.to_vec(),
            };
            match sender.try_send(event) {
                Ok(()) => true,
                Err(crossbeam_channel::TrySendError::Full(_)) => {
                    // Best effort; the buffer is full so this may fail too.
                    let _ = sender.try_send(StoreEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                    false
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
            }
        });

        let subscription = self.subscribe_listener(collection, constraints, listener);
        SubscriptionHandle {
            receiver,
            subscription,
        }
    }

    /// Observe a single document: the callback receives `Some(doc)` or
    /// `None` immediately and again after every mutation of the collection.
    pub fn watch_document<F>(
        &self,
        collection: CollectionName,
        id: impl Into<String>,
        callback: F,
    ) -> Subscription
    where
        F: Fn(Option<&Document>) + Send + Sync + 'static,
    {
        let id = id.into();
        self.subscribe(collection, &[], move |docs| {
            let found = docs
                .iter()
                .find(|doc| doc.get("id").and_then(|v| v.as_str()) == Some(id.as_str()));
            callback(found);
        })
    }

    fn subscribe_listener(
        &self,
        collection: CollectionName,
        constraints: &[Constraint],
        listener: crate::subscriptions::Listener,
    ) -> Subscription {
        let (key, id) = self
            .subscriptions
            .register(collection, constraints, listener.clone());

        // First snapshot, delivered after registration so no interleaved
        // mutation can be missed.
        let snapshot = self.query(collection, constraints);
        if !listener(&snapshot) {
            self.subscriptions.unsubscribe(&key, id);
        }

        let manager = Arc::clone(&self.subscriptions);
        Subscription::new(move || manager.unsubscribe(&key, id))
    }

    /// Total registered listeners (all collections).
    pub fn listener_count(&self) -> usize {
        self.subscriptions.listener_count()
    }

    // --- Internals ---

    fn validate(&self, collection: CollectionName, doc: &Document) -> Result<()> {
        if self.config.validate_documents {
            documents::validate(collection, doc)?;
        }
        Ok(())
    }

    /// Rebroadcast to every subscription on the collection. Runs with no
    /// store locks held so callbacks may call back into the store.
    fn notify(&self, collection: CollectionName) {
        self.subscriptions
            .notify(collection, |constraints| self.query(collection, constraints));
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn course(instructor: &str) -> Document {
        fields(json!({
            "title": "Entrepreneurship in East Africa",
            "description": "Business skills for the East African market",
            "instructorId": instructor,
        }))
    }

    #[test]
    fn test_add_stamps_identity_fields() {
        let store = DocumentStore::default();
        let id = store.add(CollectionName::Courses, course("i1")).unwrap();

        let doc = store.get(CollectionName::Courses, &id).unwrap();
        assert_eq!(doc["id"], json!(id));
        assert_eq!(doc["instructorId"], json!("i1"));
        assert_eq!(doc["createdAt"], doc["updatedAt"]);
    }

    #[test]
    fn test_add_overwrites_caller_id() {
        let store = DocumentStore::default();
        let mut doc = course("i1");
        doc.insert("id".to_string(), json!("my-id"));
        let id = store.add(CollectionName::Courses, doc).unwrap();

        assert_ne!(id, "my-id");
        assert!(store.get(CollectionName::Courses, "my-id").is_none());
    }

    #[test]
    fn test_update_merges_shallow() {
        let store = DocumentStore::default();
        let id = store.add(CollectionName::Courses, course("i1")).unwrap();
        let created = store.get(CollectionName::Courses, &id).unwrap()["createdAt"].clone();

        store
            .update(
                CollectionName::Courses,
                &id,
                fields(json!({"title": "Renamed", "institutionId": "inst1"})),
            )
            .unwrap();

        let doc = store.get(CollectionName::Courses, &id).unwrap();
        assert_eq!(doc["title"], json!("Renamed"));
        assert_eq!(doc["institutionId"], json!("inst1"));
        // Untouched fields retained, identity fields immutable.
        assert_eq!(doc["instructorId"], json!("i1"));
        assert_eq!(doc["createdAt"], created);
        assert_eq!(doc["id"], json!(id));
    }

    #[test]
    fn test_update_missing_upserts_by_default() {
        let store = DocumentStore::default();
        store
            .update(CollectionName::Courses, "c-fixed", course("i9"))
            .unwrap();

        let doc = store.get(CollectionName::Courses, "c-fixed").unwrap();
        assert_eq!(doc["id"], json!("c-fixed"));
        assert_eq!(doc["createdAt"], doc["updatedAt"]);
    }

    #[test]
    fn test_update_missing_fails_under_policy() {
        let store = DocumentStore::new(StoreConfig {
            missing_update: MissingUpdatePolicy::Fail,
            ..Default::default()
        });

        let result = store.update(CollectionName::Courses, "absent", course("i1"));
        assert!(matches!(
            result,
            Err(StoreError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = DocumentStore::default();
        let id = store.add(CollectionName::Courses, course("i1")).unwrap();

        store.remove(CollectionName::Courses, &id).unwrap();
        assert!(store.get(CollectionName::Courses, &id).is_none());
        // Second remove is a no-op, not an error.
        store.remove(CollectionName::Courses, &id).unwrap();
    }

    #[test]
    fn test_validation_rejects_and_preserves_state() {
        let store = DocumentStore::default();
        let id = store.add(CollectionName::Courses, course("i1")).unwrap();

        // title must be a string.
        let result = store.update(
            CollectionName::Courses,
            &id,
            fields(json!({"title": 42})),
        );
        assert!(matches!(result, Err(StoreError::InvalidDocument { .. })));

        let doc = store.get(CollectionName::Courses, &id).unwrap();
        assert_eq!(doc["title"], json!("Entrepreneurship in East Africa"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let store = DocumentStore::new(StoreConfig {
            validate_documents: false,
            ..Default::default()
        });
        store
            .add(CollectionName::Courses, fields(json!({"anything": true})))
            .unwrap();
        assert_eq!(store.len(CollectionName::Courses), 1);
    }

    #[test]
    fn test_query_filters_exactly() {
        let store = DocumentStore::default();
        let c1 = store.add(CollectionName::Courses, course("i1")).unwrap();
        store.add(CollectionName::Courses, course("i2")).unwrap();

        let results = store.query(
            CollectionName::Courses,
            &[Constraint::new("instructorId", Operator::Eq, "i1")],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], json!(c1));

        // Empty constraints return everything.
        assert_eq!(store.query(CollectionName::Courses, &[]).len(), 2);
    }

    #[test]
    fn test_updated_at_advances() {
        let store = DocumentStore::default();
        let id = store.add(CollectionName::Courses, course("i1")).unwrap();
        let before = store.get(CollectionName::Courses, &id).unwrap()["updatedAt"]
            .as_str()
            .unwrap()
            .to_string();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store
            .update(CollectionName::Courses, &id, fields(json!({"title": "x"})))
            .unwrap();

        let after = store.get(CollectionName::Courses, &id).unwrap()["updatedAt"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(after >= before);
    }
}
