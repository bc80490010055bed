//! Numeric coercion of gateway responses.
//!
//! CardPointe returns most numbers as JSON strings (`"amount": "500"`). Every
//! response runs [`convert_numbers`] once, at construction, over its top-level
//! fields only.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("integer pattern is valid"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").expect("decimal pattern is valid"));

/// Converts a numeric-looking string into a JSON number.
///
/// Returns `None` when the string is not a strict integer or decimal, or when
/// it does not fit the native type (integers beyond `i64`).
pub fn coerce_str(raw: &str) -> Option<Value> {
    if INTEGER.is_match(raw) {
        return raw.parse::<i64>().ok().map(Value::from);
    }
    if DECIMAL.is_match(raw) {
        return raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number);
    }
    None
}

/// Applies [`coerce_str`] to every top-level string value of `fields`.
pub fn convert_numbers(fields: &mut Map<String, Value>) {
    for value in fields.values_mut() {
        if let Value::String(raw) = value {
            if let Some(number) = coerce_str(raw) {
                *value = number;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integers() {
        assert_eq!(coerce_str("500"), Some(json!(500)));
        assert_eq!(coerce_str("-42"), Some(json!(-42)));
        assert_eq!(coerce_str("+7"), Some(json!(7)));
        assert_eq!(coerce_str("0012"), Some(json!(12)));
    }

    #[test]
    fn test_decimals() {
        assert_eq!(coerce_str("5.00"), Some(json!(5.0)));
        assert_eq!(coerce_str("-0.25"), Some(json!(-0.25)));
        assert_eq!(coerce_str(".5"), Some(json!(0.5)));
    }

    #[test]
    fn test_non_numeric_strings_are_left_alone() {
        for raw in ["", "A", "REVERS", "1.2.3", "12a", "5.", "1e5", " 5", "٣"] {
            assert_eq!(coerce_str(raw), None, "{raw:?} should not coerce");
        }
    }

    #[test]
    fn test_integer_overflow_stays_string() {
        assert_eq!(coerce_str("99999999999999999999"), None);
    }

    #[test]
    fn test_convert_numbers_is_top_level_only() {
        let mut fields = json!({
            "amount": "500",
            "respstat": "A",
            "retref": "343005123105",
            "enabled": true,
            "txns": [{ "setlamount": "1.00" }],
            "nested": { "amount": "12" }
        })
        .as_object()
        .cloned()
        .unwrap();

        convert_numbers(&mut fields);

        assert_eq!(fields["amount"], json!(500));
        assert_eq!(fields["respstat"], json!("A"));
        assert_eq!(fields["retref"], json!(343005123105_i64));
        assert_eq!(fields["enabled"], json!(true));
        assert_eq!(fields["txns"], json!([{ "setlamount": "1.00" }]));
        assert_eq!(fields["nested"], json!({ "amount": "12" }));
    }
}
