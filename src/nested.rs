//! Walking and building nested objects along a `KeyPath`.
use serde_json::{Map, Value};

use crate::key::KeyPath;

/// Read the value at `path`. Any missing or non-object intermediate resolves
/// the whole path to `None`.
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &KeyPath) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut container = root;
    for segment in parents {
        container = container.get(segment)?.as_object()?;
    }
    container.get(last)
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// A non-object value already sitting at an intermediate segment is replaced
/// by an empty object.
pub fn insert(root: &mut Map<String, Value>, path: &KeyPath, value: Value) {
    let Some((last, parents)) = path.split_last() else { return };
    let mut container = root;
    for segment in parents {
        let slot = container
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            tracing::debug!(%segment, replaced = %slot, "overwriting non-object value with nested container");
            *slot = Value::Object(Map::new());
        }
        let Some(inner) = slot.as_object_mut() else { return };
        container = inner;
    }
    container.insert(last.clone(), value);
}

// ------------------------------- Tests ------------------------------------ //
