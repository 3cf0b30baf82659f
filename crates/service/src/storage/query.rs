use std::{cmp::Ordering, fmt, str::FromStr};

use serde_json::Value;

use super::error::StorageError;

/// Comparison operator accepted by `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Operator name in Firestore's structured query `FieldFilter`.
    pub fn firestore_op(&self) -> &'static str {
        match self {
            Self::Eq => "EQUAL",
            Self::Ne => "NOT_EQUAL",
            Self::Gt => "GREATER_THAN",
            Self::Lt => "LESS_THAN",
            Self::Ge => "GREATER_THAN_OR_EQUAL",
            Self::Le => "LESS_THAN_OR_EQUAL",
        }
    }

    /// In-process evaluation used by the file backend.
    ///
    /// A missing field never matches, not even for `!=`. Equality is strict apart
    /// from numbers, which compare by value (see [`values_equal`]); ordering is
    /// defined only between two numbers or two strings.
    pub fn evaluate(&self, field: Option<&Value>, target: &Value) -> bool {
        let Some(actual) = field else { return false };
        match self {
            Self::Eq => values_equal(actual, target),
            Self::Ne => !values_equal(actual, target),
            Self::Gt => compare(actual, target) == Some(Ordering::Greater),
            Self::Lt => compare(actual, target) == Some(Ordering::Less),
            Self::Ge => matches!(compare(actual, target), Some(Ordering::Greater | Ordering::Equal)),
            Self::Le => matches!(compare(actual, target), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// JSON equality where `1` and `1.0` are the same number, also inside arrays and objects.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len() && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl FromStr for QueryOperator {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            other => Err(StorageError::InvalidQuery(format!("unsupported operator {other:?}"))),
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
