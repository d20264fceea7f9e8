use tracing::trace;

use crate::schema::{FieldValue, Scalar};

/// Text publishers put in cells that mean "no value".
const NULL_SENTINELS: &[&str] = &["", "NA", "N/A", "#N/A", "NaN", "nan", "-", "--", "."];

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn is_null_sentinel(s: &str) -> bool {
    NULL_SENTINELS.contains(&s)
}

/// 2) Coerce one raw cell into a number or the canonical null.
///
/// Anything unrepresentable degrades to `Null`; `field` is only used to
/// trace the skip.
pub fn coerce(raw: &Scalar, field: &str) -> FieldValue {
    match raw {
        Scalar::Empty => FieldValue::Null,
        Scalar::Number(n) if !n.is_finite() => {
            trace!(field, value = %n, "coercion skip: non-finite number");
            FieldValue::Null
        }
        Scalar::Number(n) => FieldValue::Number(*n),
        Scalar::Text(s) => {
            let c = clean_str(s);
            if is_null_sentinel(&c) {
                return FieldValue::Null;
            }
            match c.parse::<f64>() {
                Ok(n) if n.is_finite() => FieldValue::Number(n),
                _ => {
                    trace!(field, value = %c, "coercion skip: not numeric");
                    FieldValue::Null
                }
            }
        }
    }
}
