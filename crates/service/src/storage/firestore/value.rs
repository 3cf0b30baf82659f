//! Conversion between plain JSON and Firestore's typed `Value` representation.

use serde_json::{json, Map, Number, Value};

use crate::storage::document::{Document, ID_FIELD};
use crate::storage::error::{StorageError, StorageResult};

/// Encode a JSON value as a Firestore `Value`.
pub fn to_firestore(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(to_firestore).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode document fields, leaving out `id` (it lives in the document name).
pub fn encode_fields(data: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = data
        .iter()
        .filter(|(k, _)| k.as_str() != ID_FIELD)
        .map(|(k, v)| (k.clone(), to_firestore(v)))
        .collect();
    Value::Object(fields)
}

/// Decode a Firestore `Value` into plain JSON.
pub fn from_firestore(value: &Value) -> StorageResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(malformed("value is not a single-key object", value));
    };
    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().ok_or_else(|| malformed("booleanValue", inner))?),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            Value::Number(parsed.ok_or_else(|| malformed("integerValue", inner))?.into())
        }
        "doubleValue" => match inner {
            Value::Number(n) => Value::Number(n.clone()),
            // NaN and the infinities arrive as strings and have no JSON form
            _ => inner
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
            Value::Array(values.iter().map(from_firestore).collect::<StorageResult<Vec<_>>>()?)
        }
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
        other => return Err(malformed(&format!("unknown value type {other}"), value)),
    };
    Ok(decoded)
}

fn decode_fields(fields: Option<&Value>) -> StorageResult<Map<String, Value>> {
    let mut out = Map::new();
    if let Some(fields) = fields.and_then(Value::as_object) {
        for (k, v) in fields {
            out.insert(k.clone(), from_firestore(v)?);
        }
    }
    Ok(out)
}

/// Decode a Firestore `Document` resource into a [`Document`] with `id` first.
pub fn decode_document(resource: &Value) -> StorageResult<Document> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("document without name", resource))?;
    let id = name.rsplit('/').next().unwrap_or(name);
    let mut doc = Document::new();
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc.extend(decode_fields(resource.get("fields"))?);
    Ok(doc)
}

/// Quote a field path segment unless it is a plain identifier.
pub fn field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn malformed(what: &str, value: &Value) -> StorageError {
    StorageError::Store { status: 0, message: format!("malformed firestore payload ({what}): {value}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scalars_and_nesting() {
        assert_eq!(to_firestore(&json!(5)), json!({"integerValue": "5"}));
        assert_eq!(to_firestore(&json!(2.5)), json!({"doubleValue": 2.5}));
        assert_eq!(to_firestore(&json!(null)), json!({"nullValue": null}));
        assert_eq!(
            to_firestore(&json!({"tags": ["a", true]})),
            json!({"mapValue": {"fields": {"tags": {"arrayValue": {"values": [
                {"stringValue": "a"}, {"booleanValue": true}
            ]}}}}})
        );
    }

    #[test]
    fn decodes_what_it_encodes() -> StorageResult<()> {
        let original = json!({"name": "Shore Temple", "rating": 4, "fee": 40.5, "open": true, "tags": ["unesco"], "geo": {"lat": 12.6}});
        let encoded = to_firestore(&original);
        assert_eq!(from_firestore(&encoded)?, original);
        Ok(())
    }

    #[test]
    fn empty_array_and_map_decode() -> StorageResult<()> {
        assert_eq!(from_firestore(&json!({"arrayValue": {}}))?, json!([]));
        assert_eq!(from_firestore(&json!({"mapValue": {}}))?, json!({}));
        assert_eq!(from_firestore(&json!({"doubleValue": "NaN"}))?, json!(null));
        Ok(())
    }

    #[test]
    fn document_id_comes_from_name() -> StorageResult<()> {
        let resource = json!({
            "name": "projects/demo/databases/(default)/documents/users/abc123",
            "fields": {"bookmarks": {"arrayValue": {"values": [{"stringValue": "Shore Temple"}]}}},
            "createTime": "2024-01-01T00:00:00Z"
        });
        let doc = decode_document(&resource)?;
        assert_eq!(Value::Object(doc), json!({"id": "abc123", "bookmarks": ["Shore Temple"]}));
        Ok(())
    }

    #[test]
    fn encode_fields_skips_id() {
        let data = json!({"id": 3, "name": "X"}).as_object().cloned().unwrap_or_default();
        assert_eq!(encode_fields(&data), json!({"name": {"stringValue": "X"}}));
    }

    #[test]
    fn quotes_non_identifier_paths() {
        assert_eq!(field_path("bookmarks"), "bookmarks");
        assert_eq!(field_path("entry_fee"), "entry_fee");
        assert_eq!(field_path("price-range"), "`price-range`");
        assert_eq!(field_path("2024"), "`2024`");
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(from_firestore(&json!({"weirdValue": 1})).is_err());
        assert!(from_firestore(&json!("plain")).is_err());
    }
}
