//! Pure transforms from raw feed payloads into game rows. Nothing in here fails:
//! malformed input degrades to empty output or default field values.

pub mod game;
pub mod rank;

use serde_json::{Map, Value};

/// Feed truthiness: `null`, `false`, `0`, and `""` are falsy; everything else,
/// including empty objects and arrays, is truthy.
pub(crate) fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First candidate key holding a truthy value, left to right.
pub(crate) fn first_truthy<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| is_truthy(v))
}

/// Integer rank of a record, if it has a truthy one. Integral numbers and
/// integer strings are accepted; anything else cannot be ordered and yields `None`.
pub(crate) fn rank_of(record: &Map<String, Value>) -> Option<i64> {
    let raw = record.get("rank").filter(|v| is_truthy(v))?;
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
