//! Numeric fields arrive from hand-edited and older documents. Anything that
//! is not a usable number collapses to zero instead of failing the read.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_count).unwrap_or(0))
}

pub(crate) fn index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_index).unwrap_or(0))
}

/// Integers pass through, floats truncate toward zero, numeric strings are
/// parsed, everything else (and non-finite values) becomes 0.
pub fn coerce_count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(float_to_count))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(float_to_count).unwrap_or(0),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0,
    }
}

pub fn coerce_index(value: &Value) -> u32 {
    let n = coerce_count(value).max(0);
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn float_to_count(f: f64) -> i64 {
    if f.is_finite() {
        // `as` saturates at the i64 bounds.
        f.trunc() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_from_mixed_json() {
        assert_eq!(coerce_count(&json!(7)), 7);
        assert_eq!(coerce_count(&json!(-3)), -3);
        assert_eq!(coerce_count(&json!(4.9)), 4);
        assert_eq!(coerce_count(&json!("12")), 12);
        assert_eq!(coerce_count(&json!(" 5.5 ")), 5);
        assert_eq!(coerce_count(&json!("NaN")), 0);
        assert_eq!(coerce_count(&json!("inf")), 0);
        assert_eq!(coerce_count(&json!("ten")), 0);
        assert_eq!(coerce_count(&json!(null)), 0);
        assert_eq!(coerce_count(&json!(true)), 0);
        assert_eq!(coerce_count(&json!([1])), 0);
        assert_eq!(coerce_count(&json!(u64::MAX)), i64::MAX);
    }

    #[test]
    fn index_is_never_negative() {
        assert_eq!(coerce_index(&json!(-1)), 0);
        assert_eq!(coerce_index(&json!(3)), 3);
        assert_eq!(coerce_index(&json!(1e12)), u32::MAX);
    }

    #[test]
    fn round_fields_coerce_on_read() {
        let round: crate::Round = serde_json::from_value(json!({
            "idx": "2",
            "zone": "Left Elbow",
            "attempts": null,
            "made": 3.7
        }))
        .unwrap();
        assert_eq!(round.idx, 2);
        assert_eq!(round.attempts, 0);
        assert_eq!(round.made, 3);

        let bare: crate::Round = serde_json::from_value(json!({ "zone": "Paint" })).unwrap();
        assert_eq!((bare.idx, bare.attempts, bare.made), (0, 0, 0));
    }
}
