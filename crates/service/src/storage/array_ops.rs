//! Set-semantics mutation of an array-valued document field.
//!
//! The document store applies these server-side; the file backend applies
//! them in memory between reading and rewriting the collection file.

use serde_json::Value;

use super::document::Document;
use super::query::values_equal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    /// Append the value unless an equal element is already present.
    Union,
    /// Drop every element equal to the value.
    Remove,
}

/// Apply `op` with `value` to `doc[field]` and return the document.
///
/// A missing or non-array field is treated like the document store does:
/// `Union` replaces it with `[value]`, `Remove` with `[]`.
pub fn apply_array_op(mut doc: Document, field: &str, value: &Value, op: ArrayOp) -> Document {
    let slot = doc.entry(field).or_insert(Value::Null);
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    if let Value::Array(items) = slot {
        match op {
            ArrayOp::Union => {
                if !items.iter().any(|item| values_equal(item, value)) {
                    items.push(value.clone());
                }
            }
            ArrayOp::Remove => items.retain(|item| !values_equal(item, value)),
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn union_appends_once() {
        let d = doc(json!({"id": 1, "tags": ["a"]}));
        let d = apply_array_op(d, "tags", &json!("b"), ArrayOp::Union);
        assert_eq!(d["tags"], json!(["a", "b"]));
        let d = apply_array_op(d, "tags", &json!("a"), ArrayOp::Union);
        assert_eq!(d["tags"], json!(["a", "b"]));
    }

    #[test]
    fn remove_drops_every_occurrence() {
        let d = doc(json!({"id": 1, "tags": ["a", "b", "a"]}));
        let d = apply_array_op(d, "tags", &json!("a"), ArrayOp::Remove);
        assert_eq!(d["tags"], json!(["b"]));
        let d = apply_array_op(d, "tags", &json!("zzz"), ArrayOp::Remove);
        assert_eq!(d["tags"], json!(["b"]));
    }

    #[test]
    fn missing_or_scalar_field_becomes_array() {
        let d = apply_array_op(doc(json!({"id": 1})), "tags", &json!("a"), ArrayOp::Union);
        assert_eq!(d["tags"], json!(["a"]));
        let d = apply_array_op(doc(json!({"id": 1, "tags": "a"})), "tags", &json!("a"), ArrayOp::Remove);
        assert_eq!(d["tags"], json!([]));
    }

    #[test]
    fn integral_floats_match_integers() {
        let d = apply_array_op(doc(json!({"id": 1, "days": [3]})), "days", &json!(3.0), ArrayOp::Union);
        assert_eq!(d["days"], json!([3]));
        let d = apply_array_op(d, "days", &json!(3.0), ArrayOp::Remove);
        assert_eq!(d["days"], json!([]));
    }

    #[test]
    fn structured_values_compare_by_value() {
        let d = doc(json!({"id": 1, "saved": [{"id": 5, "title": "Trip"}]}));
        let d = apply_array_op(d, "saved", &json!({"id": 5, "title": "Trip"}), ArrayOp::Union);
        assert_eq!(d["saved"].as_array().map(Vec::len), Some(1));
        let d = apply_array_op(d, "saved", &json!({"title": "Trip", "id": 5}), ArrayOp::Remove);
        assert_eq!(d["saved"], json!([]));
    }
}
