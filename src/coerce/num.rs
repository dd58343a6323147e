use serde_json::Value;

/// Nonzero integers are `true`.
pub(super) fn integer_to_bool(node: &Value) -> Option<Value> {
    let Value::Number(n) = node else { return None };
    if let Some(i) = n.as_i64() {
        Some(Value::Bool(i != 0))
    } else {
        n.as_u64().map(|u| Value::Bool(u != 0))
    }
}

/// `true` → 1, `false` → 0. Shared by signed and unsigned targets.
pub(super) fn bool_to_integer(node: &Value) -> Option<Value> {
    node.as_bool().map(|b| Value::from(u8::from(b)))
}

/// Truncate toward zero; values outside the `bits`-wide range yield nothing.
pub(super) fn double_to_signed(node: &Value, bits: u32) -> Option<Value> {
    let Value::Number(n) = node else { return None };
    if !n.is_f64() {
        return None;
    }
    let truncated = n.as_f64()?.trunc();
    fits_signed(truncated, bits).then(|| Value::from(truncated as i64))
}

/// Widen any integer to a double.
pub(super) fn integer_to_double(node: &Value) -> Option<Value> {
    let Value::Number(n) = node else { return None };
    if let Some(i) = n.as_i64() {
        Some(Value::from(i as f64))
    } else {
        n.as_u64().map(|u| Value::from(u as f64))
    }
}

/// `[-2^(bits-1), 2^(bits-1))`, computed exactly in f64.
pub(super) fn fits_signed(x: f64, bits: u32) -> bool {
    let bound = 2f64.powi(bits.min(64) as i32 - 1);
    x.is_finite() && x >= -bound && x < bound
}

/// Finite at `f32` precision (non-finite inputs pass through unchanged).
pub(super) fn fits_single(x: f64) -> bool {
    !x.is_finite() || (x as f32).is_finite()
}

pub(super) fn fits_unsigned(x: u64, bits: u32) -> bool {
    bits >= 64 || x < (1u64 << bits)
}

pub(super) fn fits_signed_int(x: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let bound = 1i64 << (bits - 1);
    x >= -bound && x < bound
}
