//! Typed document variants for each collection.
//!
//! Documents are stored as open field maps, but each collection has a
//! canonical shape. When `StoreConfig::validate_documents` is on, the store
//! deserializes every merged document into its collection's variant before
//! committing the write, so shape errors surface at the boundary instead of
//! inside the view layer. Every variant carries a flattened extras map, so
//! fields beyond the canonical shape still pass.

use crate::error::{Result, StoreError};
use crate::types::{CollectionName, Document, UserRole};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub points: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "true-false")]
    TrueFalse,
    #[serde(rename = "short-answer")]
    ShortAnswer,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    pub instructor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    pub questions: Vec<ExamQuestion>,
    /// Minutes.
    pub duration: f64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmission {
    pub id: String,
    pub exam_id: String,
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub answers: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Ended,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Monthly,
    Yearly,
    Free,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_type: Option<PriceType>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profile stored for each registered user (also mirrored into the
/// `users` collection).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Convert to a document field map for the `users` collection.
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Serialization(
                "profile did not serialize to an object".to_string(),
            )),
        }
    }
}

/// Validate a merged document against its collection's canonical shape.
///
/// Deserialization only; the document itself is untouched.
pub fn validate(collection: CollectionName, doc: &Document) -> Result<()> {
    let value = Value::Object(doc.clone());
    let result = match collection {
        CollectionName::Courses => check::<Course>(value),
        CollectionName::Exams => check::<Exam>(value),
        CollectionName::ExamSubmissions => check::<ExamSubmission>(value),
        CollectionName::Schedule => check::<ScheduleEntry>(value),
        CollectionName::LiveSessions => check::<LiveSession>(value),
        CollectionName::Messages => check::<Message>(value),
        CollectionName::Institutions => check::<Institution>(value),
        CollectionName::Users => check::<UserProfile>(value),
    };
    result.map_err(|e| StoreError::InvalidDocument {
        collection,
        reason: e.to_string(),
    })
}

fn check<T: serde::de::DeserializeOwned>(value: Value) -> serde_json::Result<()> {
    serde_json::from_value::<T>(value).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_course_passes() {
        let d = doc(json!({
            "id": "c1",
            "title": "Introduction to Agriculture in Uganda",
            "description": "Modern farming techniques",
            "instructorId": "i1",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z",
        }));
        validate(CollectionName::Courses, &d).unwrap();
    }

    #[test]
    fn test_extra_fields_pass() {
        let d = doc(json!({
            "id": "c1",
            "title": "Luganda Language and Culture",
            "description": "Language and heritage",
            "instructorId": "i2",
            "enrolledStudentIds": ["s1", "s2"],
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z",
        }));
        validate(CollectionName::Courses, &d).unwrap();
    }

    #[test]
    fn test_missing_required_field_fails() {
        let d = doc(json!({
            "id": "c1",
            "description": "no title",
            "instructorId": "i1",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z",
        }));
        let result = validate(CollectionName::Courses, &d);
        assert!(matches!(result, Err(StoreError::InvalidDocument { .. })));
    }

    #[test]
    fn test_bad_enum_value_fails() {
        let d = doc(json!({
            "id": "ls1",
            "title": "Office hours",
            "description": "weekly",
            "instructorId": "i1",
            "startTime": "2025-03-01T09:00:00.000Z",
            "endTime": "2025-03-01T10:00:00.000Z",
            "status": "paused",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z",
        }));
        let result = validate(CollectionName::LiveSessions, &d);
        assert!(matches!(result, Err(StoreError::InvalidDocument { .. })));
    }

    #[test]
    fn test_profile_document_roundtrip() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "user-1",
            "email": "a@x.com",
            "name": "a",
            "role": "student",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z",
        }))
        .unwrap();

        let d = profile.to_document().unwrap();
        assert_eq!(d["role"], json!("student"));
        validate(CollectionName::Users, &d).unwrap();
    }
}
