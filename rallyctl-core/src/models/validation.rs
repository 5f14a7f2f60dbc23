//! Validation error types

use std::fmt;

/// Validation error for input models
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Number below the allowed minimum
    BelowMinimum { field: &'static str, min: f64 },

    /// Number outside an inclusive range
    OutOfRange { field: &'static str, min: f64, max: f64 },

    /// NaN or infinite number
    NotFinite { field: &'static str },

    /// Text that does not parse as a number
    NotANumber { field: &'static str },

    /// Value not among the allowed choices
    UnknownChoice { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} is required.", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::BelowMinimum { field, min } => {
                write!(f, "{} must be at least {}", field, min)
            }
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::NotFinite { field } => write!(f, "{} must be a finite number", field),
            Self::NotANumber { field } => write!(f, "{} must be a number", field),
            Self::UnknownChoice { field, value } => {
                write!(f, "unknown {}: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse a numeric form field. Surrounding whitespace is ignored.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    raw.parse().map_err(|_| ValidationError::NotANumber { field })
}

/// Parse an id field (select boxes, CLI arguments).
pub fn parse_id(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    raw.parse().map_err(|_| ValidationError::NotANumber { field })
}

/// Reject NaN/infinity, then enforce a lower bound.
pub(crate) fn at_least(field: &'static str, value: f64, min: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min {
        return Err(ValidationError::BelowMinimum { field, min });
    }
    Ok(value)
}

/// Reject NaN/infinity, then enforce an inclusive range.
pub(crate) fn within(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(value)
}

/// Trim and require a non-empty name of bounded length.
pub(crate) fn required_name(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "Team name",
            max: 128,
        };
        assert_eq!(
            err.to_string(),
            "Team name exceeds maximum length of 128 characters"
        );
        assert_eq!(
            ValidationError::Empty { field: "Car name" }.to_string(),
            "Car name is required."
        );
    }

    #[test]
    fn bounds() {
        assert_eq!(at_least("x", 0.0, 0.0), Ok(0.0));
        assert!(at_least("x", -0.01, 0.0).is_err());
        assert!(matches!(
            at_least("x", f64::NAN, 0.0),
            Err(ValidationError::NotFinite { .. })
        ));
        assert_eq!(within("x", 1.0, 0.0, 1.0), Ok(1.0));
        assert!(within("x", 1.01, 0.0, 1.0).is_err());
    }

    #[test]
    fn parses_form_numbers() {
        assert_eq!(parse_number("Base speed", " 220 "), Ok(220.0));
        assert_eq!(
            parse_number("Base speed", "fast"),
            Err(ValidationError::NotANumber { field: "Base speed" })
        );
        assert_eq!(
            parse_number("Base speed", "").unwrap_err().to_string(),
            "Base speed is required."
        );
        assert_eq!(parse_id("Team", "7"), Ok(7));
        assert!(parse_id("Team", "7.5").is_err());
    }
}
