//! Schema check for spot price payloads
//!
//! Expected shape:
//!
//! ```json
//! {"data": {"amount": "67890.12", "base": "BTC", "currency": "USD"}}
//! ```
//!
//! `data.amount` must be an unsigned plain decimal string (`"67890.12"`): no
//! sign, no exponent, no leading or trailing dot. `data.timestamp` is optional
//! and must be a string when present. Values are never coerced: a numeric
//! `amount` is rejected, not stringified.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Borrowed view of a payload that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpotFields<'a> {
    pub amount: &'a str,
    pub base: &'a str,
    pub currency: &'a str,
    pub timestamp: Option<&'a str>,
}

/// Check `raw` against the quote schema without keeping anything.
pub fn validate(raw: &Value) -> Result<(), ValidationError> {
    spot_fields(raw).map(|_| ())
}

pub(crate) fn spot_fields(raw: &Value) -> Result<SpotFields<'_>, ValidationError> {
    let root = as_object(raw, "payload")?;
    let data = match root.get("data") {
        Some(value) => as_object(value, "data")?,
        None => return Err(ValidationError::MissingField { field: "data" }),
    };

    let amount = required_str(data, "amount", "data.amount")?;
    if !is_decimal(amount) {
        return Err(ValidationError::InvalidValue {
            field: "data.amount",
            reason: format!("must be an unsigned plain decimal number, got '{}'", amount),
        });
    }

    let base = non_empty(required_str(data, "base", "data.base")?, "data.base")?;
    let currency = non_empty(
        required_str(data, "currency", "data.currency")?,
        "data.currency",
    )?;

    let timestamp = match data.get("timestamp") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: "data.timestamp",
                expected: "a string",
                found: json_type(other),
            })
        },
    };

    Ok(SpotFields {
        amount,
        base,
        currency,
        timestamp,
    })
}

fn as_object<'a>(
    value: &'a Value,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or(ValidationError::WrongType {
        field,
        expected: "an object",
        found: json_type(value),
    })
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match object.get(key) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
            found: json_type(other),
        }),
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

/// Digits with at most one decimal point, e.g. "67890.12" or "0.5".
fn is_decimal(value: &str) -> bool {
    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (value, None),
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    digits(int_part) && frac_part.map_or(true, digits)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_coinbase_payload() {
        let raw = json!({"data": {"amount": "67890.12", "base": "BTC", "currency": "USD"}});
        let fields = spot_fields(&raw).unwrap();
        assert_eq!(fields.amount, "67890.12");
        assert_eq!(fields.base, "BTC");
        assert_eq!(fields.currency, "USD");
        assert_eq!(fields.timestamp, None);
    }

    #[test]
    fn test_keeps_source_timestamp() {
        let raw = json!({"data": {
            "amount": "1.5", "base": "ETH", "currency": "EUR",
            "timestamp": "2024-05-01T12:00:00Z"
        }});
        assert_eq!(spot_fields(&raw).unwrap().timestamp, Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let raw = json!({
            "data": {"amount": "10", "base": "BTC", "currency": "USD", "extra": [1, 2]},
            "warnings": []
        });
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_missing_data_object() {
        let err = validate(&json!({"amount": "10"})).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { field: "data" }));
    }

    #[test]
    fn test_payload_must_be_object() {
        let err = validate(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::WrongType { field: "payload", found: "an array", .. }
        ));
    }

    #[test]
    fn test_missing_required_fields() {
        for (missing, field) in [
            ("amount", "data.amount"),
            ("base", "data.base"),
            ("currency", "data.currency"),
        ] {
            let mut data = json!({"amount": "10.00", "base": "BTC", "currency": "USD"});
            data.as_object_mut().unwrap().remove(missing);
            let err = validate(&json!({ "data": data })).unwrap_err();
            match err {
                ValidationError::MissingField { field: f } => assert_eq!(f, field),
                other => panic!("unexpected error for {}: {}", missing, other),
            }
        }
    }

    #[test]
    fn test_numeric_amount_is_not_coerced() {
        let raw = json!({"data": {"amount": 67890.12, "base": "BTC", "currency": "USD"}});
        let err = validate(&raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::WrongType { field: "data.amount", found: "a number", .. }
        ));
        assert!(err.to_string().contains("data.amount"));
    }

    #[test]
    fn test_amount_must_be_decimal() {
        for bad in ["", "abc", "1.2.3", "-5", "1e9", ".5", "5.", "NaN"] {
            let raw = json!({"data": {"amount": bad, "base": "BTC", "currency": "USD"}});
            assert!(
                matches!(validate(&raw), Err(ValidationError::InvalidValue { field: "data.amount", .. })),
                "amount '{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_currency_codes_must_be_strings() {
        let cases = [
            (json!({"amount": "1", "base": 42, "currency": "USD"}), "data.base", "a number"),
            (json!({"amount": "1", "base": true, "currency": "USD"}), "data.base", "a boolean"),
            (json!({"amount": "1", "base": "BTC", "currency": 840}), "data.currency", "a number"),
            (json!({"amount": "1", "base": "BTC", "currency": false}), "data.currency", "a boolean"),
            (json!({"amount": "1", "base": ["BTC"], "currency": "USD"}), "data.base", "an array"),
        ];

        for (data, expected_field, expected_found) in cases {
            let err = validate(&json!({ "data": data })).unwrap_err();
            assert!(
                matches!(
                    err,
                    ValidationError::WrongType { field, found, .. }
                        if field == expected_field && found == expected_found
                ),
                "unexpected error for {}: {:?}",
                expected_field,
                err
            );
        }
    }

    #[test]
    fn test_empty_currency_codes_rejected() {
        let raw = json!({"data": {"amount": "1", "base": " ", "currency": "USD"}});
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::InvalidValue { field: "data.base", .. })
        ));
    }

    #[test]
    fn test_timestamp_wrong_type() {
        let raw = json!({"data": {"amount": "1", "base": "BTC", "currency": "USD", "timestamp": 1714564800}});
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::WrongType { field: "data.timestamp", .. })
        ));
    }
}
