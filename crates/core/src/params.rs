//! Helpers for reading typed parameters out of a JSON object.
//!
//! Missing keys and values of the wrong type fall back to the supplied
//! default; these never fail. Range checks happen later, when the typed
//! configuration is validated.

use serde_json::Value;

/// Extracts an `f64` from `params[name]`. Integers are accepted.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]` (non-negative integers only).
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Extracts a `u32` from `params[name]`. Values that do not fit fall back.
pub fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Extracts a `u32` seed from `params[name]`, used for noise generators.
///
/// Larger integers are folded into 32 bits instead of being rejected.
pub fn param_seed32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| (v ^ (v >> 32)) as u32)
        .unwrap_or(default)
}
