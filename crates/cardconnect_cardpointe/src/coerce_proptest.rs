#[cfg(test)]
mod tests {
    use crate::coerce::{coerce_str, convert_numbers};
    use crate::request::AuthorizationRequest;
    use crate::response::Response;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    proptest! {
        // Any i64 rendered as a string comes back as the same integer
        #[test]
        fn test_integer_strings_coerce(n in any::<i64>()) {
            prop_assert_eq!(coerce_str(&n.to_string()), Some(json!(n)));
        }

        // Two-decimal amounts become floats of the same value
        #[test]
        fn test_decimal_strings_coerce(cents in 0..10_000_000i64) {
            let raw = format!("{}.{:02}", cents / 100, cents % 100);
            let expected: f64 = raw.parse().unwrap();
            prop_assert_eq!(coerce_str(&raw), Some(json!(expected)));
        }

        // Strings holding a letter never turn into numbers
        #[test]
        fn test_strings_with_letters_stay_strings(raw in "[0-9]{0,4}[A-Za-z][0-9A-Za-z]{0,6}") {
            prop_assert_eq!(coerce_str(&raw), None);
        }

        // Nested values are never touched
        #[test]
        fn test_nested_values_untouched(n in any::<u32>()) {
            let mut fields = Map::new();
            fields.insert("nested".to_string(), json!({ "amount": n.to_string() }));
            fields.insert("list".to_string(), json!([n.to_string()]));
            let before = fields.clone();

            convert_numbers(&mut fields);

            prop_assert_eq!(fields, before);
        }

        // A response is coerced once; coercing again changes nothing
        #[test]
        fn test_coercion_is_stable(amount in 0..1_000_000i64, resp in "[A-Z]{1,3}") {
            let mut fields = Map::new();
            fields.insert("amount".to_string(), Value::String(amount.to_string()));
            fields.insert("respstat".to_string(), Value::String(resp.clone()));

            let response = Response::new(fields);
            let mut again = response.fields().clone();
            convert_numbers(&mut again);

            prop_assert_eq!(response.fields(), &again);
            prop_assert_eq!(response.get_i64("amount"), Some(amount));
            prop_assert_eq!(response.get_str("respstat"), Some(resp.as_str()));
        }

        // Only "Y", "y" and true request a capture
        #[test]
        fn test_capture_flag(flag in "[A-Za-z]{0,4}") {
            let expected = flag == "Y" || flag == "y";
            prop_assert_eq!(AuthorizationRequest::new().capture(flag).is_capture(), expected);
        }
    }
}
