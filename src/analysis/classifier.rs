//! Bucket classification and context-code validation.
//!
//! Incoming values may arrive as JSON numbers or numeric strings; both are
//! coerced before the range check.

use crate::error::{Result, TellError};
use crate::models::{Bucket, ContextCode};
use serde_json::Value;

/// Message returned for any bucket outside the accepted set.
pub const BUCKET_ERROR: &str =
    "bucket must be 1 (Bluff), 2 (Strong), 3 (Semi-Bluff), or 4 (Semi-Strong)";

/// Classify a raw bucket value.
pub fn classify(value: &Value) -> Result<Bucket> {
    coerce_integer(value)
        .and_then(Bucket::from_code)
        .ok_or_else(|| TellError::validation(BUCKET_ERROR))
}

/// Numeric coercion: integral numbers and trimmed numeric strings pass,
/// everything else (fractions, booleans, null, text) does not.
fn coerce_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() || number.fract() != 0.0 {
        return None;
    }
    if number < i64::MIN as f64 || number > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

/// Validate an optional context code for storage.
pub fn validate_context<T: ContextCode>(code: Option<i64>) -> Result<Option<T>> {
    match code {
        None => Ok(None),
        Some(code) => T::from_code(code).map(Some).ok_or_else(|| {
            TellError::validation(format!("{} must be between 0 and 3", T::FIELD))
        }),
    }
}
