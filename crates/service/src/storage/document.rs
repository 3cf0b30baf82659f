use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document: field name to JSON value. Always carries `id` once persisted.
pub type Document = Map<String, Value>;

/// Name of the key field inside every document.
pub const ID_FIELD: &str = "id";

/// Document identifier.
///
/// The file backend assigns integers; the document store uses string names.
/// Matching is tolerant of the representation so an id taken from a URL or a
/// token claim finds a document stored with either form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Text(String),
}

impl DocumentId {
    /// Integers become `Int`, anything else `Text`.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(raw.to_string()))
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    /// Whether a stored `id` value refers to this identifier.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Int(a), Value::Number(b)) => b.as_i64() == Some(*a),
            (Self::Int(a), Value::String(b)) => b.parse::<i64>().ok() == Some(*a),
            (Self::Text(a), Value::String(b)) => a == b,
            (Self::Text(a), Value::Number(b)) => b.as_i64().is_some_and(|n| n.to_string() == *a),
            _ => false,
        }
    }

    /// Whether `doc` carries this identifier in its `id` field.
    pub fn identifies(&self, doc: &Document) -> bool {
        doc.get(ID_FIELD).is_some_and(|v| self.matches(v))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self { Self::Text(s) }
}

/// Rebuild `data` with `id` as its first field. Any `id` already in `data` is replaced.
pub fn with_id(id: &DocumentId, data: Document) -> Document {
    let mut doc = Document::with_capacity(data.len() + 1);
    doc.insert(ID_FIELD.to_string(), id.to_value());
    doc.extend(data.into_iter().filter(|(k, _)| k != ID_FIELD));
    doc
}

/// Acknowledgement returned by `delete`, whether or not the document existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub id: DocumentId,
    pub deleted: bool,
}

impl DeleteAck {
    pub fn new(id: DocumentId) -> Self { Self { id, deleted: true } }
}

/// Acknowledgement returned by array mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_prefers_integers() {
        assert_eq!(DocumentId::parse("42"), DocumentId::Int(42));
        assert_eq!(DocumentId::parse("u-42"), DocumentId::Text("u-42".into()));
    }

    #[test]
    fn matching_crosses_representations() {
        assert!(DocumentId::Int(7).matches(&json!(7)));
        assert!(DocumentId::Int(7).matches(&json!("7")));
        assert!(DocumentId::Text("7".into()).matches(&json!(7)));
        assert!(!DocumentId::Text("7".into()).matches(&json!("07")));
        assert!(!DocumentId::Int(7).matches(&json!(null)));
    }

    #[test]
    fn with_id_puts_id_first_and_overrides() {
        let data = json!({"name": "X", "id": 99}).as_object().cloned().unwrap_or_default();
        let doc = with_id(&DocumentId::Int(1), data);
        assert_eq!(doc.keys().next().map(String::as_str), Some("id"));
        assert_eq!(Value::Object(doc), json!({"id": 1, "name": "X"}));
    }

    #[test]
    fn untagged_id_deserializes_numbers_and_strings() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::from_value::<DocumentId>(json!(3))?, DocumentId::Int(3));
        assert_eq!(serde_json::from_value::<DocumentId>(json!("abc"))?, DocumentId::Text("abc".into()));
        Ok(())
    }
}
