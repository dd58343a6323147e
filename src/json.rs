//! Conversions between records and JSON bytes, text, and objects.
//!
//! Strict functions return `Result`; `lenient` mirrors them with `Option`.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::convert::{self, Registry};
use crate::error::{Error, Result};
use crate::record::{self, Record};

// ------------------------------- Encode ----------------------------------- //

pub fn to_value<R: Record>(record: &R) -> Result<Value> { record::encode(record) }

pub fn to_map<R: Record>(record: &R) -> Result<Map<String, Value>> {
    match record::encode(record)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

pub fn to_vec<R: Record>(record: &R) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&record::encode(record)?)?)
}

pub fn to_string<R: Record>(record: &R) -> Result<String> {
    Ok(serde_json::to_string(&record::encode(record)?)?)
}

pub fn to_string_pretty<R: Record>(record: &R) -> Result<String> {
    Ok(serde_json::to_string_pretty(&record::encode(record)?)?)
}

// ------------------------------- Decode ----------------------------------- //

pub fn from_value<R: Record>(tree: &Value) -> Result<R> { record::decode(tree) }

pub fn from_map<R: Record>(map: Map<String, Value>) -> Result<R> {
    record::decode(&Value::Object(map))
}

pub fn from_slice<R: Record>(bytes: &[u8]) -> Result<R> {
    from_slice_in(bytes, convert::global())
}

pub fn from_str<R: Record>(src: &str) -> Result<R> {
    from_str_in(src, convert::global())
}

pub fn from_slice_in<R: Record>(bytes: &[u8], registry: &Registry) -> Result<R> {
    let tree: Value = serde_json::from_slice(bytes)?;
    record::decode_in(&tree, registry)
}

pub fn from_str_in<R: Record>(src: &str, registry: &Registry) -> Result<R> {
    let tree: Value = serde_json::from_str(src)?;
    record::decode_in(&tree, registry)
}

// ---------------------------- Any serde type ------------------------------ //

/// Deserialize any serde type (e.g. `Vec<R>` or `BTreeMap<String, R>` of
/// records) with the JSON path of the failure in the error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(path_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(de).map_err(path_error)
}

/// Serialize any serde type; records serialize through their key maps.
pub fn to_string_any<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn path_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    Error::Path { path, source: err.into_inner() }
}

// ------------------------------ Lenient ----------------------------------- //

/// Swallow-all variants: any error becomes `None`.
pub mod lenient {
    use super::*;

    pub fn to_value<R: Record>(record: &R) -> Option<Value> { super::to_value(record).ok() }
    pub fn to_map<R: Record>(record: &R) -> Option<Map<String, Value>> { super::to_map(record).ok() }
    pub fn to_vec<R: Record>(record: &R) -> Option<Vec<u8>> { super::to_vec(record).ok() }
    pub fn to_string<R: Record>(record: &R) -> Option<String> { super::to_string(record).ok() }

    pub fn from_value<R: Record>(tree: &Value) -> Option<R> { super::from_value(tree).ok() }
    pub fn from_map<R: Record>(map: Map<String, Value>) -> Option<R> { super::from_map(map).ok() }
    pub fn from_slice<R: Record>(bytes: &[u8]) -> Option<R> { super::from_slice(bytes).ok() }
    pub fn from_str<R: Record>(src: &str) -> Option<R> { super::from_str(src).ok() }
}

// ------------------------------- Tests ------------------------------------ //
