//! Value coercion that never touches a restricted value arithmetically.
//!
//! Everything goes through the value's display form first. A secret renders
//! as an opaque marker that no parser accepts, so it falls out as `None`
//! before any comparison happens.

use halo_types::DispelType;

use super::RawValue;

/// Normalize to a positive integer. Fractions are floored; anything below 1,
/// non-finite or non-numeric yields `None`.
pub fn coerce_positive_int(value: &RawValue) -> Option<u64> {
    let n = coerce_number(value)?.floor();
    (n >= 1.0 && n <= u64::MAX as f64).then_some(n as u64)
}

/// Normalize to a finite number
pub fn coerce_number(value: &RawValue) -> Option<f64> {
    if matches!(value, RawValue::Secret | RawValue::Nil | RawValue::Bool(_)) {
        return None;
    }
    let n: f64 = value.to_string().trim().parse().ok()?;
    n.is_finite().then_some(n)
}

/// Plain text only; secrets and numbers are not names
pub fn coerce_text(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Text(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub fn coerce_dispel_type(value: &RawValue) -> Option<DispelType> {
    coerce_text(value)?.parse().ok()
}
