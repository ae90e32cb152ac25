//! Core types for the document store.

use crate::error::StoreError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored document: an open-ended field map that always carries
/// `id`, `createdAt`, and `updatedAt`.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The fixed set of collections the store manages.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionName {
    Courses,
    Exams,
    ExamSubmissions,
    Schedule,
    LiveSessions,
    Messages,
    Institutions,
    Users,
}

impl CollectionName {
    /// Every collection, in declaration order.
    pub const ALL: [CollectionName; 8] = [
        CollectionName::Courses,
        CollectionName::Exams,
        CollectionName::ExamSubmissions,
        CollectionName::Schedule,
        CollectionName::LiveSessions,
        CollectionName::Messages,
        CollectionName::Institutions,
        CollectionName::Users,
    ];

    /// Wire name as consumed by the view layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Courses => "courses",
            CollectionName::Exams => "exams",
            CollectionName::ExamSubmissions => "examSubmissions",
            CollectionName::Schedule => "schedule",
            CollectionName::LiveSessions => "liveSessions",
            CollectionName::Messages => "messages",
            CollectionName::Institutions => "institutions",
            CollectionName::Users => "users",
        }
    }
}

impl fmt::Debug for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionName({})", self.as_str())
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionName::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::CollectionNotFound(s.to_string()))
    }
}

/// RFC 3339 timestamp in UTC with millisecond precision.
///
/// The string form is fixed-width and zero-padded, so lexical ordering
/// equals chronological ordering. Documents store these directly in their
/// `createdAt`/`updatedAt` fields.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub String);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Timestamp(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role attached to a user profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Institution,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Institution => "institution",
        };
        write!(f, "{}", s)
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a fresh document id: unix millis plus a process-wide counter
/// suffix. The counter keeps ids collision-free under near-simultaneous
/// calls within one process.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:06x}", millis, n)
}

/// Generate a fresh user id (same scheme, `user-` prefixed).
pub fn generate_user_id() -> String {
    format!("user-{}", generate_id())
}
