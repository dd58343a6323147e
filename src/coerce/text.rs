use serde_json::Value;

use super::num::{fits_signed_int, fits_unsigned};

const TRUE_WORDS: [&str; 4] = ["true", "t", "yes", "y"];
const FALSE_WORDS: [&str; 5] = ["false", "f", "no", "n", ""];

/// Case-insensitive boolean words, else a numeric string tested for nonzero.
pub(super) fn string_to_bool(node: &Value) -> Option<Value> {
    let s = node.as_str()?;
    let lower = s.to_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        return Some(Value::Bool(true));
    }
    if FALSE_WORDS.contains(&lower.as_str()) {
        return Some(Value::Bool(false));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Bool(i != 0));
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Some(Value::Bool(f.trunc() != 0.0))
}

/// Integer literal grammar of the target width: optional sign, digits only.
pub(super) fn string_to_signed(node: &Value, bits: u32) -> Option<Value> {
    let i = node.as_str()?.parse::<i64>().ok()?;
    fits_signed_int(i, bits).then(|| Value::from(i))
}

pub(super) fn string_to_unsigned(node: &Value, bits: u32) -> Option<Value> {
    let u = node.as_str()?.parse::<u64>().ok()?;
    fits_unsigned(u, bits).then(|| Value::from(u))
}

/// Floating literal; `f32` targets parse at single precision.
pub(super) fn string_to_double(node: &Value, bits: u32) -> Option<Value> {
    let s = node.as_str()?;
    let f = if bits == 32 {
        f64::from(s.parse::<f32>().ok()?)
    } else {
        s.parse::<f64>().ok()?
    };
    f.is_finite().then(|| Value::from(f))
}

/// Textual form of a bool, integer or double.
pub(super) fn to_string(node: &Value) -> Option<Value> {
    let text = match node {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => format!("{f:?}"),
            (None, None, None) => return None,
        },
        _ => return None,
    };
    Some(Value::String(text))
}
