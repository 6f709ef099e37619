//! # Validation Module
//!
//! Field coercion helpers used by the cart normalizer and the HTTP layer.
//!
//! ## Coercion Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POS clients send numbers both as JSON numbers and as form strings.    │
//! │                                                                         │
//! │    5        → 5                                                         │
//! │    5.0      → 5                                                         │
//! │    " 5 "    → 5                                                         │
//! │    "1e3"    → 1000                                                      │
//! │    2.5      → "<field> must be a whole number"                          │
//! │    "abc"    → "<field> must be a whole number"                          │
//! │    null/""  → "<field> must be a whole number"                          │
//! │                                                                         │
//! │  Range rules (> 0, ≤ total, ...) are applied by the caller, which      │
//! │  knows which message the client expects.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use serde_json::json;
//! use shopfloor_core::validation::whole_number;
//!
//! let body = json!({ "quantity": "3" });
//! assert_eq!(whole_number(body.get("quantity"), "quantity").unwrap(), 3);
//! assert!(whole_number(body.get("price"), "price").is_err());
//! ```

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

/// Maximum accepted length of a search query.
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

// i64 bounds as f64: -2^63 is exact, 2^63 is the first value past i64::MAX.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Coerces a JSON value to a finite integer.
///
/// ## Arguments
/// * `value` - The field, or `None` when the key is absent
/// * `field` - Label used in the error message (may carry a line position)
pub fn whole_number(value: Option<&Value>, field: &str) -> ValidationResult<i64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(integral_f64)),
        Some(Value::String(s)) => parse_numeric_str(s),
        _ => None,
    };

    parsed.ok_or_else(|| ValidationError::NotWholeNumber {
        field: field.to_string(),
    })
}

fn parse_numeric_str(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
}

fn integral_f64(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && (I64_MIN_F64..I64_END_F64).contains(&v) {
        Some(v as i64)
    } else {
        None
    }
}

// =============================================================================
// Presence Checks
// =============================================================================

/// Absent, `null` or the empty string: the client left the field out.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Blank, `false` or numeric zero: an optional reference that was not chosen.
///
/// POS clients send `customerId: 0` or `false` when no customer is picked.
pub fn is_unset(value: Option<&Value>) -> bool {
    if is_blank(value) {
        return true;
    }
    match value {
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

// =============================================================================
// Text
// =============================================================================

/// Stringifies a scalar and trims it; empty or non-scalar yields `None`.
pub fn optional_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Validates a search query.
///
/// ## Returns
/// * `Ok(None)` - blank query; callers answer with an empty list
/// * `Ok(Some(q))` - trimmed query
pub fn search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let query = query.unwrap_or_default().trim();

    if query.chars().count() > MAX_SEARCH_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_QUERY_LEN,
        });
    }

    if query.is_empty() {
        Ok(None)
    } else {
        Ok(Some(query.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_number_accepts_integers_and_numeric_strings() {
        let body = json!({ "a": 5, "b": "7", "c": " 12 ", "d": 3.0, "e": "1e3", "f": "-4" });
        assert_eq!(whole_number(body.get("a"), "a"), Ok(5));
        assert_eq!(whole_number(body.get("b"), "b"), Ok(7));
        assert_eq!(whole_number(body.get("c"), "c"), Ok(12));
        assert_eq!(whole_number(body.get("d"), "d"), Ok(3));
        assert_eq!(whole_number(body.get("e"), "e"), Ok(1000));
        assert_eq!(whole_number(body.get("f"), "f"), Ok(-4));
    }

    #[test]
    fn test_whole_number_rejects_everything_else() {
        let body = json!({
            "frac": 2.5,
            "fracStr": "2.5",
            "word": "abc",
            "null": null,
            "empty": "",
            "flag": true,
            "list": [1],
            "huge": 1e30
        });
        for key in ["frac", "fracStr", "word", "null", "empty", "flag", "list", "huge", "missing"] {
            let err = whole_number(body.get(key), "Store item 2: quantity").unwrap_err();
            assert_eq!(err.to_string(), "Store item 2: quantity must be a whole number");
        }
    }

    #[test]
    fn test_presence_checks() {
        let body = json!({ "zero": 0, "no": false, "empty": "", "null": null, "id": 9, "s": "9" });
        assert!(is_blank(body.get("missing")));
        assert!(is_blank(body.get("null")));
        assert!(is_blank(body.get("empty")));
        assert!(!is_blank(body.get("zero")));

        assert!(is_unset(body.get("zero")));
        assert!(is_unset(body.get("no")));
        assert!(!is_unset(body.get("id")));
        assert!(!is_unset(body.get("s")));
    }

    #[test]
    fn test_optional_text() {
        let body = json!({ "name": "  Ada  ", "blank": "   ", "num": 42, "obj": {} });
        assert_eq!(optional_text(body.get("name")), Some("Ada".to_string()));
        assert_eq!(optional_text(body.get("blank")), None);
        assert_eq!(optional_text(body.get("num")), Some("42".to_string()));
        assert_eq!(optional_text(body.get("obj")), None);
        assert_eq!(optional_text(body.get("missing")), None);
    }

    #[test]
    fn test_search_query() {
        assert_eq!(search_query(None), Ok(None));
        assert_eq!(search_query(Some("   ")), Ok(None));
        assert_eq!(search_query(Some(" sug ")), Ok(Some("sug".to_string())));
        assert!(search_query(Some(&"a".repeat(101))).is_err());
    }
}
