//! # Classroom Store
//!
//! An in-process reactive document store: named collections of JSON
//! documents with constrained queries and live subscriptions, plus a
//! credential/profile registry with a single current session. It backs the
//! dashboards of a learning-management system without a real database.
//!
//! ## Core Concepts
//!
//! - **Collections**: a fixed vocabulary of named document maps
//! - **Queries**: conjunctions of field/operator/value constraints
//! - **Subscriptions**: callbacks (or channels) that receive the full,
//!   fresh result set after every mutation of a collection
//! - **Auth**: salted-hash credentials, profiles, and one active session
//!
//! ## Example
//!
//! ```ignore
//! use classroom_store::{
//!     CollectionName, Constraint, DocumentStore, Operator, StoreConfig,
//! };
//!
//! let store = DocumentStore::new(StoreConfig::default());
//!
//! let sub = store.subscribe(
//!     CollectionName::Courses,
//!     &[Constraint::new("instructorId", Operator::Eq, "i1")],
//!     |courses| println!("instructor i1 now has {} courses", courses.len()),
//! );
//!
//! let id = store.add(CollectionName::Courses, course_fields)?;
//! store.update(CollectionName::Courses, &id, renamed_fields)?;
//!
//! sub.unsubscribe();
//! ```

pub mod auth;
pub mod documents;
pub mod error;
pub mod query;
pub mod seed;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use auth::{
    AuthConfig, AuthStore, AuthUser, FileSessionStorage, MemorySessionStorage, PersistedSession,
    SessionStorage, SESSION_KEY,
};
pub use documents::{
    Course, Exam, ExamQuestion, ExamSubmission, Institution, LiveSession, Message, PriceType,
    QuestionType, ScheduleEntry, SessionStatus, UserProfile,
};
pub use error::{Result, StoreError};
pub use query::{where_field, Constraint, Operator};
pub use seed::seed_demo_data;
pub use store::{DocumentStore, MissingUpdatePolicy, StoreConfig};
pub use subscriptions::{
    DropReason, ListenerId, StoreEvent, Subscription, SubscriptionHandle, SubscriptionManager,
};
pub use types::{CollectionName, Document, Timestamp, UserRole};
