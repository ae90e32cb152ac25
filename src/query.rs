//! Query constraints and the evaluator that applies them to documents.
//!
//! A query is an unordered conjunction of constraints. Each constraint
//! compares one (possibly nested) document field against a fixed value.
//! There is no OR, NOT, ordering, or limit support.

use crate::types::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator for a single constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "in")]
    In,
}

/// A single field/operator/value comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Dot-separated field path (`"grading.score"` walks nested maps).
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Constraint {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Shorthand constructor matching the query-builder the view layer uses.
pub fn where_field(
    field: impl Into<String>,
    operator: Operator,
    value: impl Into<Value>,
) -> Constraint {
    Constraint::new(field, operator, value)
}

/// Resolve a dot-separated path against a document.
///
/// Returns `None` ("absent") as soon as any segment is missing or the
/// intermediate value is not an object.
pub fn resolve_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Whether a document satisfies every constraint in the list.
pub fn matches(doc: &Document, constraints: &[Constraint]) -> bool {
    constraints.iter().all(|c| matches_one(doc, c))
}

fn matches_one(doc: &Document, constraint: &Constraint) -> bool {
    let resolved = resolve_path(doc, &constraint.field);

    match constraint.operator {
        Operator::Eq => values_equal(resolved, &constraint.value),
        Operator::Ne => !values_equal(resolved, &constraint.value),
        Operator::Lt => compare(resolved, &constraint.value).map_or(false, |o| o.is_lt()),
        Operator::Le => compare(resolved, &constraint.value).map_or(false, |o| o.is_le()),
        Operator::Gt => compare(resolved, &constraint.value).map_or(false, |o| o.is_gt()),
        Operator::Ge => compare(resolved, &constraint.value).map_or(false, |o| o.is_ge()),
        Operator::ArrayContains => match resolved {
            Some(Value::Array(items)) => items.iter().any(|item| item == &constraint.value),
            _ => false,
        },
        Operator::In => match &constraint.value {
            Value::Array(candidates) => match resolved {
                Some(field_value) => candidates.iter().any(|c| c == field_value),
                // Absent only matches an explicit null candidate.
                None => candidates.iter().any(|c| c.is_null()),
            },
            _ => false,
        },
    }
}

/// Equality with explicit absence semantics: an absent field equals only an
/// explicit `null` constraint value, never a concrete one.
fn values_equal(resolved: Option<&Value>, expected: &Value) -> bool {
    match resolved {
        Some(v) => v == expected,
        None => expected.is_null(),
    }
}

/// Ordering is defined for number/number (numeric) and string/string
/// (lexical, which is chronological for the fixed-width timestamps).
/// Everything else, including absent fields, has no ordering.
fn compare(resolved: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    match (resolved?, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Canonical key for a constraint list.
///
/// Two structurally equal lists produce the same key even when built as
/// fresh values on every call, so equivalent subscriptions share one
/// registry entry. An empty list gets a fixed sentinel.
pub fn canonical_key(constraints: &[Constraint]) -> String {
    if constraints.is_empty() {
        return "no-constraints".to_string();
    }
    // Constraint serialization is deterministic (field order is fixed by
    // the struct), so the JSON string is a stable structural key.
    serde_json::to_string(constraints).unwrap_or_else(|_| "unserializable".to_string())
}
