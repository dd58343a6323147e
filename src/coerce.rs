//! Decode-time type coercion.
//!
//! When a node does not decode directly into the field's type, the rules here
//! rewrite it into a node of the requested `Kind`. Each target kind has a fixed
//! order of source kinds; the first rule that produces a node wins.
//!
//! | target   | sources, in order                 |
//! |----------|-----------------------------------|
//! | bool     | integer, string                   |
//! | signed   | bool, double (truncated), string  |
//! | unsigned | bool, string                      |
//! | float    | integer, string                   |
//! | string   | bool, integer, double             |
//!
//! Anything still unresolved is handed to custom converters by the caller.
pub mod num;
pub mod text;

use std::any::{type_name, TypeId};
use std::fmt;

use serde_json::Value;

// ------------------------------- Kind ------------------------------------- //

/// The primitive shape a field asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    /// Signed integer of the given bit width.
    Int(u32),
    /// Unsigned integer of the given bit width.
    UInt(u32),
    /// Floating point of the given bit width.
    Float(u32),
    String,
    /// Any other type, by name. Only custom converters can produce these.
    Other(&'static str),
}

impl Kind {
    pub fn of<T: 'static>() -> Kind {
        let id = TypeId::of::<T>();
        let table = [
            (TypeId::of::<bool>(), Kind::Bool),
            (TypeId::of::<i8>(), Kind::Int(i8::BITS)),
            (TypeId::of::<i16>(), Kind::Int(i16::BITS)),
            (TypeId::of::<i32>(), Kind::Int(i32::BITS)),
            (TypeId::of::<i64>(), Kind::Int(i64::BITS)),
            (TypeId::of::<isize>(), Kind::Int(isize::BITS)),
            (TypeId::of::<u8>(), Kind::UInt(u8::BITS)),
            (TypeId::of::<u16>(), Kind::UInt(u16::BITS)),
            (TypeId::of::<u32>(), Kind::UInt(u32::BITS)),
            (TypeId::of::<u64>(), Kind::UInt(u64::BITS)),
            (TypeId::of::<usize>(), Kind::UInt(usize::BITS)),
            (TypeId::of::<f32>(), Kind::Float(32)),
            (TypeId::of::<f64>(), Kind::Float(64)),
            (TypeId::of::<String>(), Kind::String),
        ];
        table
            .into_iter()
            .find_map(|(t, kind)| (t == id).then_some(kind))
            .unwrap_or(Kind::Other(type_name::<T>()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => f.write_str("bool"),
            Kind::Int(bits) => write!(f, "i{bits}"),
            Kind::UInt(bits) => write!(f, "u{bits}"),
            Kind::Float(bits) => write!(f, "f{bits}"),
            Kind::String => f.write_str("string"),
            Kind::Other(name) => f.write_str(name),
        }
    }
}

/// Short name of a node's shape, for error messages.
pub fn describe(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a number node keeps its magnitude in `target`. A finite double that
/// becomes infinite at single precision is out of range.
pub fn representable(node: &Value, target: Kind) -> bool {
    match (node, target) {
        (Value::Number(n), Kind::Float(32)) => n.as_f64().is_none_or(num::fits_single),
        _ => true,
    }
}

// ------------------------------ Rules ------------------------------------- //

/// Run the built-in rules for `target` against `node`.
pub fn coerce(node: &Value, target: Kind) -> Option<Value> {
    match target {
        Kind::Bool => num::integer_to_bool(node).or_else(|| text::string_to_bool(node)),
        Kind::Int(bits) => num::bool_to_integer(node)
            .or_else(|| num::double_to_signed(node, bits))
            .or_else(|| text::string_to_signed(node, bits)),
        Kind::UInt(bits) => num::bool_to_integer(node)
            .or_else(|| text::string_to_unsigned(node, bits)),
        Kind::Float(bits) => num::integer_to_double(node)
            .or_else(|| text::string_to_double(node, bits)),
        Kind::String => text::to_string(node),
        Kind::Other(_) => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
