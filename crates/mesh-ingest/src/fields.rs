//! Field validators
//!
//! Each validator is a pure function over one raw cell. It returns the coerced
//! value or a [`FieldError`] naming the field and the offending input. Allowed
//! value sets are passed in by the caller.

use thiserror::Error;

/// Why a single cell was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Value {value} for {field} is not valid")]
    InvalidEnum { field: String, value: String },

    #[error("{field} must be a float. Got {value}")]
    NotNumeric { field: String, value: String },

    #[error("{field} must be non-negative. Got {value:?}")]
    OutOfRange { field: String, value: f64 },

    #[error("Expected boolean value for {field}. Got {value}")]
    InvalidBoolean { field: String, value: String },

    #[error("Expected integer value for {field}. Got {value}")]
    NotInteger { field: String, value: String },

    #[error("Invalid {field} in the list: '{element}' is not allowed. Got {value}")]
    InvalidListElement {
        field: String,
        value: String,
        element: String,
    },
}

impl FieldError {
    /// Name of the rejected field
    pub fn field(&self) -> &str {
        match self {
            FieldError::InvalidEnum { field, .. }
            | FieldError::NotNumeric { field, .. }
            | FieldError::OutOfRange { field, .. }
            | FieldError::InvalidBoolean { field, .. }
            | FieldError::NotInteger { field, .. }
            | FieldError::InvalidListElement { field, .. } => field,
        }
    }
}

/// Exact membership in `allowed`; no trimming, case-sensitive.
pub fn validate_enum(field: &str, raw: &str, allowed: &[String]) -> Result<String, FieldError> {
    if allowed.iter().any(|candidate| candidate == raw) {
        Ok(raw.to_string())
    } else {
        Err(FieldError::InvalidEnum {
            field: field.to_string(),
            value: raw.to_string(),
        })
    }
}

/// Finite float that is zero or greater.
///
/// Surrounding whitespace is ignored. `NaN` and infinities are `NotNumeric`.
pub fn validate_non_negative_float(field: &str, raw: &str) -> Result<f64, FieldError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::NotNumeric {
            field: field.to_string(),
            value: raw.to_string(),
        })?;

    if value < 0.0 {
        return Err(FieldError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }

    Ok(value)
}

/// Case-insensitive lookup in the true and false synonym sets.
pub fn validate_bool(
    field: &str,
    raw: &str,
    true_values: &[String],
    false_values: &[String],
) -> Result<bool, FieldError> {
    let lowered = raw.to_lowercase();
    let matches = |set: &[String]| set.iter().any(|s| s.to_lowercase() == lowered);

    if matches(true_values) {
        Ok(true)
    } else if matches(false_values) {
        Ok(false)
    } else {
        Err(FieldError::InvalidBoolean {
            field: field.to_string(),
            value: raw.to_string(),
        })
    }
}

/// Integer or nothing. An absent or blank cell is `Ok(None)`.
///
/// Negative values are accepted.
pub fn validate_optional_int(field: &str, raw: Option<&str>) -> Result<Option<i64>, FieldError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| FieldError::NotInteger {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Comma-separated list whose trimmed elements all belong to `allowed`.
///
/// Order and repeats are preserved.
pub fn validate_enum_list(
    field: &str,
    raw: &str,
    allowed: &[String],
) -> Result<Vec<String>, FieldError> {
    raw.split(',')
        .map(str::trim)
        .map(|element| {
            if allowed.iter().any(|candidate| candidate == element) {
                Ok(element.to_string())
            } else {
                Err(FieldError::InvalidListElement {
                    field: field.to_string(),
                    value: raw.to_string(),
                    element: element.to_string(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Vocabulary;

    fn vocab() -> Vocabulary {
        Vocabulary::default()
    }

    #[test]
    fn test_enum_exact_match() {
        let trames = vocab().trames;
        assert_eq!(validate_enum("trame", "T2 Ra1 M2 E2", &trames).unwrap(), "T2 Ra1 M2 E2");
        assert!(matches!(
            validate_enum("trame", "t2 ra1 m2 e2", &trames),
            Err(FieldError::InvalidEnum { .. })
        ));
        assert!(validate_enum("trame", " T2 Ra1 M2 E2", &trames).is_err());
    }

    #[test]
    fn test_enum_error_message() {
        let err = validate_enum("trame", "T9", &vocab().trames).unwrap_err();
        assert_eq!(err.to_string(), "Value T9 for trame is not valid");
        assert_eq!(err.field(), "trame");
    }

    #[test]
    fn test_float_zero_is_valid() {
        assert_eq!(validate_non_negative_float("mass_surf", "0").unwrap(), 0.0);
        assert_eq!(validate_non_negative_float("mass_surf", "-0").unwrap(), 0.0);
    }

    #[test]
    fn test_float_negative_is_out_of_range() {
        let err = validate_non_negative_float("mass_surf", "-0.0001").unwrap_err();
        assert_eq!(
            err,
            FieldError::OutOfRange {
                field: "mass_surf".into(),
                value: -0.0001
            }
        );
    }

    #[test]
    fn test_float_negative_message_uses_float_form() {
        let err = validate_non_negative_float("mass_surf", "-3").unwrap_err();
        assert_eq!(err.to_string(), "mass_surf must be non-negative. Got -3.0");
    }

    #[test]
    fn test_float_not_numeric() {
        for raw in ["abc", "1,5", "", "nan", "inf"] {
            let err = validate_non_negative_float("mesh_height", raw).unwrap_err();
            assert!(matches!(err, FieldError::NotNumeric { .. }), "{raw}");
        }
        let err = validate_non_negative_float("mesh_height", "abc").unwrap_err();
        assert_eq!(err.to_string(), "mesh_height must be a float. Got abc");
    }

    #[test]
    fn test_float_accepts_surrounding_whitespace() {
        assert_eq!(validate_non_negative_float("mesh_width", " 1.25 ").unwrap(), 1.25);
        assert_eq!(validate_non_negative_float("mesh_width", "1e2").unwrap(), 100.0);
    }

    #[test]
    fn test_bool_synonyms_case_insensitive() {
        let v = vocab();
        for raw in ["vrai", "VRAI", "True", "1"] {
            assert!(validate_bool("w", raw, &v.true_values, &v.false_values).unwrap());
        }
        for raw in ["faux", "Faux", "FALSE", "0"] {
            assert!(!validate_bool("w", raw, &v.true_values, &v.false_values).unwrap());
        }
    }

    #[test]
    fn test_bool_rejects_unknown() {
        let v = vocab();
        let err = validate_bool("w", "oui", &v.true_values, &v.false_values).unwrap_err();
        assert!(matches!(err, FieldError::InvalidBoolean { .. }));
        assert!(validate_bool("w", "yes", &v.true_values, &v.false_values).is_err());
    }

    #[test]
    fn test_optional_int_absent() {
        assert_eq!(validate_optional_int("roll_pallet", None).unwrap(), None);
        assert_eq!(validate_optional_int("roll_pallet", Some("")).unwrap(), None);
        assert_eq!(validate_optional_int("roll_pallet", Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_optional_int_values() {
        assert_eq!(validate_optional_int("roll_pallet", Some("12")).unwrap(), Some(12));
        assert_eq!(validate_optional_int("roll_pallet", Some("-4")).unwrap(), Some(-4));
        assert!(matches!(
            validate_optional_int("roll_pallet", Some("3.5")),
            Err(FieldError::NotInteger { .. })
        ));
    }

    #[test]
    fn test_enum_list_preserves_order_and_repeats() {
        let colors = vocab().colors;
        assert_eq!(
            validate_enum_list("color_names", "white, blue,white", &colors).unwrap(),
            vec!["white", "blue", "white"]
        );
        assert_eq!(validate_enum_list("color_names", "cyan", &colors).unwrap(), vec!["cyan"]);
    }

    #[test]
    fn test_enum_list_rejects_unknown_element() {
        let err = validate_enum_list("color_names", "white,pink", &vocab().colors).unwrap_err();
        assert_eq!(
            err,
            FieldError::InvalidListElement {
                field: "color_names".into(),
                value: "white,pink".into(),
                element: "pink".into(),
            }
        );
    }

    #[test]
    fn test_enum_list_rejects_empty_element() {
        assert!(validate_enum_list("color_names", "white,,blue", &vocab().colors).is_err());
    }
}
