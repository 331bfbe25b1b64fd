//! Coercion of resolved telemetry leaves into joint values.
//!
//! Rules:
//! - Number -> its value, unless NaN or infinite
//! - Bool -> 1.0 / 0.0
//! - Text -> parsed as a decimal float after trimming (empty text is rejected)
//! - Null, List, Map -> rejected

use crate::TelemetryValue;

/// Attempt to coerce a leaf into a finite f64. `None` means the value is not
/// usable as a joint value and the caller should treat the path as missing.
pub fn to_number(v: &TelemetryValue) -> Option<f64> {
    let n = match v {
        TelemetryValue::Number(n) => *n,
        TelemetryValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        TelemetryValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        TelemetryValue::Null | TelemetryValue::List(_) | TelemetryValue::Map(_) => return None,
    };
    n.is_finite().then_some(n)
}
