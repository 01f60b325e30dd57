//! Serde field readers that accept what the validators accept.
//!
//! The validators only warn about an ill-typed optional field and accept
//! integral floats wherever an integer is required. Typed decoding follows
//! the same rules: an ill-typed optional field reads as absent and `2.0`
//! reads as `2`.

// ============================================================================
// Imports
// ============================================================================

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::validation::integer_value;

// ============================================================================
// Readers
// ============================================================================

/// Reads an optional field. A value of the wrong type reads as `None`.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Reads a required integer, accepting floats with no fractional part.
pub(crate) fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i128>,
{
    let value = Value::deserialize(deserializer)?;
    integer_value(&value)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| D::Error::custom(format!("expected an integer in range, got {value}")))
}

/// Reads an optional integer. Anything that is not an in-range integer
/// reads as `None`.
pub(crate) fn optional_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i128>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(integer_value(&value).and_then(|n| T::try_from(n).ok()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "integer")]
        count: i64,
        #[serde(default, deserialize_with = "optional")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "optional_integer")]
        size: Option<usize>,
    }

    #[test]
    fn test_integral_float_reads_as_integer() {
        let sample: Sample = serde_json::from_value(json!({ "count": 2.0 })).unwrap();
        assert_eq!(sample.count, 2);
        assert_eq!(sample.flag, None);
    }

    #[test]
    fn test_fractional_float_is_rejected() {
        assert!(serde_json::from_value::<Sample>(json!({ "count": 2.5 })).is_err());
        assert!(serde_json::from_value::<Sample>(json!({ "count": "2" })).is_err());
    }

    #[test]
    fn test_ill_typed_optionals_read_as_absent() {
        let sample: Sample =
            serde_json::from_value(json!({ "count": 1, "flag": "yes", "size": -3 })).unwrap();
        assert_eq!(sample.flag, None);
        assert_eq!(sample.size, None);

        let sample: Sample =
            serde_json::from_value(json!({ "count": 1, "flag": true, "size": 4.0 })).unwrap();
        assert_eq!(sample.flag, Some(true));
        assert_eq!(sample.size, Some(4));
    }
}
