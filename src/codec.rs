//! Keyed read/write access to one object node.
//!
//! `Decoder` runs the candidate-key loop: literal and nested lookup, direct
//! decode, built-in coercion, then custom converters. `Encoder` writes values
//! at (possibly nested) keys, omitting absent optionals.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::coerce::{self, Kind};
use crate::convert::{self, Converter, Registry};
use crate::error::{Error, Result};
use crate::key::Key;
use crate::nested;

static NULL: Value = Value::Null;

// ------------------------------- Policy ----------------------------------- //

/// The two escalation flags of a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    /// Absence (or nil on encode) is an error.
    pub nonnull: bool,
    /// Shape errors propagate instead of being swallowed.
    pub throws: bool,
}

impl Policy {
    pub const LENIENT: Policy = Policy { nonnull: false, throws: false };
    pub const STRICT: Policy = Policy { nonnull: true, throws: true };

    pub const fn new(nonnull: bool, throws: bool) -> Self { Policy { nonnull, throws } }

    /// Field overrides win; `None` defers to `self`.
    pub fn with_overrides(self, nonnull: Option<bool>, throws: Option<bool>) -> Self {
        Policy {
            nonnull: nonnull.unwrap_or(self.nonnull),
            throws: throws.unwrap_or(self.throws),
        }
    }
}

fn collect_keys<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Vec<Key> {
    keys.into_iter().map(Into::into).collect()
}

// ------------------------------ Decoder ----------------------------------- //

#[derive(Clone, Copy)]
pub struct Decoder<'a> {
    tree: &'a Map<String, Value>,
    registry: &'a Registry,
    converter: Option<&'a dyn Converter>,
}

impl<'a> Decoder<'a> {
    pub fn new(tree: &'a Map<String, Value>, registry: &'a Registry) -> Self {
        Decoder { tree, registry, converter: None }
    }

    /// Decoder over `tree` using the process-wide registry.
    pub fn global(tree: &'a Map<String, Value>) -> Self { Self::new(tree, convert::global()) }

    /// Converter consulted before the registry (the record type's own).
    pub fn with_converter(mut self, converter: Option<&'a dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn tree(&self) -> &'a Map<String, Value> { self.tree }

    pub fn registry(&self) -> &'a Registry { self.registry }

    /// Lenient lookup: first key that yields a value, errors swallowed.
    pub fn get<T, K>(&self, keys: impl IntoIterator<Item = K>) -> Option<T>
    where
        T: DeserializeOwned + 'static,
        K: Into<Key>,
    {
        self.decode_keys(&collect_keys(keys), Policy::LENIENT).ok().flatten()
    }

    pub fn decode<T, K>(&self, keys: impl IntoIterator<Item = K>, policy: Policy) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
        K: Into<Key>,
    {
        self.decode_keys(&collect_keys(keys), policy)
    }

    /// Like `decode` with `nonnull` and `throws` both set.
    pub fn require<T, K>(&self, keys: impl IntoIterator<Item = K>) -> Result<T>
    where
        T: DeserializeOwned + 'static,
        K: Into<Key>,
    {
        let keys = collect_keys(keys);
        match self.decode_keys(&keys, Policy::STRICT)? {
            Some(value) => Ok(value),
            None => Err(missing(&keys)),
        }
    }

    /// Try each key in order; the first one to produce a value wins. The first
    /// error is remembered and only surfaces when no key succeeds and the
    /// policy escalates.
    pub(crate) fn decode_keys<T>(&self, keys: &[Key], policy: Policy) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let mut first_error = None;
        for key in keys {
            match self.decode_key::<T>(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) if policy.nonnull || policy.throws => Err(error),
            _ if policy.nonnull => Err(missing(keys)),
            Some(error) => {
                tracing::debug!(%error, "swallowed field decode error");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// A dotted key is first tried as a flat literal key (when present), then
    /// as a nested path.
    fn decode_key<T>(&self, key: &Key) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let path = key.segments();
        if !path.is_nested() {
            return self.decode_node(key, self.tree.get(key.name()));
        }
        let mut literal_error = None;
        if let Some(node) = self.tree.get(key.name()) {
            match self.decode_node(key, Some(node)) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(error) => literal_error = Some(error),
            }
        }
        match self.decode_node(key, nested::lookup(self.tree, &path)) {
            Ok(None) => literal_error.map_or(Ok(None), Err),
            Err(error) => Err(literal_error.unwrap_or(error)),
            found => found,
        }
    }

    fn decode_node<T>(&self, key: &Key, node: Option<&Value>) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let node = node.unwrap_or(&NULL);
        let target = Kind::of::<T>();
        let accept = |candidate: &Value| {
            coerce::representable(candidate, target)
                .then(|| T::deserialize(candidate).ok())
                .flatten()
        };
        if !node.is_null() {
            if let Some(value) = accept(node) {
                return Ok(Some(value));
            }
        }
        let converted = coerce::coerce(node, target)
            .and_then(|candidate| accept(&candidate))
            .or_else(|| {
                self.converter
                    .and_then(|c| c.convert(node, target))
                    .filter(|candidate| !candidate.is_null())
                    .and_then(|candidate| accept(&candidate))
            })
            .or_else(|| {
                self.registry
                    .candidates(node, target)
                    .find_map(|candidate| accept(&candidate))
            });
        match converted {
            Some(value) => Ok(Some(value)),
            None if node.is_null() => Ok(None),
            None => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: target,
                actual: coerce::describe(node),
            }),
        }
    }
}

fn missing(keys: &[Key]) -> Error {
    Error::MissingRequiredField {
        key: keys.first().map(Key::to_string).unwrap_or_default(),
    }
}

// ------------------------------ Encoder ----------------------------------- //

pub struct Encoder<'a> {
    tree: &'a mut Map<String, Value>,
}

impl<'a> Encoder<'a> {
    pub fn new(tree: &'a mut Map<String, Value>) -> Self { Encoder { tree } }

    pub fn tree(&mut self) -> &mut Map<String, Value> { self.tree }

    /// Lenient write; serialization failures are swallowed.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: impl Into<Key>, value: &T) {
        let _ = self.encode(key, Some(value), Policy::LENIENT);
    }

    pub fn encode<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<Key>,
        value: Option<&T>,
        policy: Policy,
    ) -> Result<()> {
        self.encode_key(&key.into(), value, policy)
    }

    /// Absent values are omitted unless `nonnull`, which makes them an error.
    pub(crate) fn encode_key<T: Serialize + ?Sized>(
        &mut self,
        key: &Key,
        value: Option<&T>,
        policy: Policy,
    ) -> Result<()> {
        let Some(value) = value else {
            if policy.nonnull {
                return Err(Error::RequiredFieldNil { key: key.to_string() });
            }
            return Ok(());
        };
        match serde_json::to_value(value) {
            Ok(node) => {
                nested::insert(self.tree, &key.segments(), node);
                Ok(())
            }
            Err(source) if policy.throws => Err(Error::Encode { key: key.to_string(), source }),
            Err(error) => {
                tracing::debug!(%key, %error, "swallowed field encode error");
                Ok(())
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn alternative_keys_fall_back_in_order() {
        let registry = Registry::new();
        let tree = obj(json!({"b": 5}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i64, _>(["a", "b"]), Some(5));

        let tree = obj(json!({"a": 1, "b": 2}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i64, _>(["a", "b"]), Some(1));
    }

    #[test]
    fn malformed_first_key_still_tries_later_keys() {
        let registry = Registry::new();
        let tree = obj(json!({"a": [1], "b": 2}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.decode::<i64, _>(["a", "b"], Policy::STRICT).unwrap(), Some(2));
    }

    #[test]
    fn first_error_wins_when_every_key_fails() {
        let registry = Registry::new();
        let tree = obj(json!({"a": [1], "b": {"x": 1}}));
        let d = Decoder::new(&tree, &registry);
        let err = d.decode::<i64, _>(["a", "b"], Policy::new(false, true)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref key, actual: "array", .. } if key == "a"));
        assert_eq!(d.decode::<i64, _>(["a", "b"], Policy::LENIENT).unwrap(), None);
    }

    #[test]
    fn nonnull_surfaces_remembered_error_before_missing() {
        let registry = Registry::new();
        let tree = obj(json!({"a": "abc"}));
        let d = Decoder::new(&tree, &registry);
        let err = d.decode::<i64, _>(["a"], Policy::new(true, false)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let tree = obj(json!({}));
        let d = Decoder::new(&tree, &registry);
        let err = d.decode::<i64, _>(["a", "b"], Policy::new(true, false)).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { ref key } if key == "a"));
    }

    #[test]
    fn throws_alone_does_not_require_presence() {
        let registry = Registry::new();
        let tree = obj(json!({"other": 1}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.decode::<String, _>(["s"], Policy::new(false, true)).unwrap(), None);
    }

    #[test]
    fn explicit_null_is_absent() {
        let registry = Registry::new();
        let tree = obj(json!({"s": null}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.decode::<String, _>(["s"], Policy::new(false, true)).unwrap(), None);
        assert!(matches!(
            d.require::<String, _>(["s"]),
            Err(Error::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn nested_keys_resolve_through_objects() {
        let registry = Registry::new();
        let tree = obj(json!({"nested": {"string": "OK"}}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<String, _>(["nested.string"]), Some("OK".to_owned()));
        assert_eq!(d.get::<String, _>([Key::exact("nested.string")]), None);
    }

    #[test]
    fn dotted_literal_key_is_tried_before_nesting() {
        let registry = Registry::new();
        let tree = obj(json!({"a.b": 1, "a": {"b": 2}}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i64, _>(["a.b"]), Some(1));

        let tree = obj(json!({"a.b": [true], "a": {"b": 2}}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i64, _>(["a.b"]), Some(2));
    }

    #[test]
    fn nested_and_alternative_keys_mix() {
        let registry = Registry::new();
        let tree = obj(json!({"data": {"name": "n"}, "title": "t"}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<String, _>(["data.title", "title"]), Some("t".to_owned()));
        assert_eq!(d.get::<String, _>(["data.name", "title"]), Some("n".to_owned()));
    }

    #[test]
    fn coercion_runs_before_converters() {
        let registry = Registry::new();
        registry.register(|_: &Value, _: Kind| Some(json!(99)));
        let tree = obj(json!({"n": "7", "m": [0]}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i32, _>(["n"]), Some(7));
        assert_eq!(d.get::<i32, _>(["m"]), Some(99));
    }

    #[test]
    fn type_converter_runs_before_registry() {
        let registry = Registry::new();
        registry.register(|_: &Value, _: Kind| Some(json!("registry")));
        let local = |_: &Value, _: Kind| Some(json!("local"));
        let tree = obj(json!({"s": [1]}));
        let d = Decoder::new(&tree, &registry).with_converter(Some(&local as &dyn Converter));
        assert_eq!(d.get::<String, _>(["s"]), Some("local".to_owned()));
    }

    #[test]
    fn converters_may_fill_absent_keys() {
        let registry = Registry::new();
        registry.register(|node: &Value, target: Kind| {
            (node.is_null() && target == Kind::Int(32)).then(|| json!(-1))
        });
        let tree = obj(json!({}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<i32, _>(["missing"]), Some(-1));
        assert_eq!(d.get::<u8, _>(["missing"]), None);
    }

    #[test]
    fn undecodable_converter_output_is_skipped() {
        let registry = Registry::new();
        registry.register(|_: &Value, _: Kind| Some(json!("not a number")));
        registry.register(|_: &Value, _: Kind| Some(json!(3)));
        let tree = obj(json!({"n": {}}));
        let d = Decoder::new(&tree, &registry);
        assert_eq!(d.get::<u16, _>(["n"]), Some(3));
    }

    #[test]
    fn single_precision_overflow_is_a_mismatch() {
        let registry = Registry::new();
        registry.register(|_: &Value, _: Kind| Some(json!(1e300)));
        let tree = obj(json!({"f": 1e300, "g": 3.5}));
        let d = Decoder::new(&tree, &registry);
        let err = d.decode::<f32, _>(["f"], Policy::new(false, true)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: Kind::Float(32), actual: "double", .. }));
        assert_eq!(d.get::<f64, _>(["f"]), Some(1e300));
        assert_eq!(d.get::<f32, _>(["g"]), Some(3.5));
    }

    #[test]
    fn encoder_omits_absent_and_rejects_required_nil() {
        let mut tree = Map::new();
        let mut e = Encoder::new(&mut tree);
        e.encode::<i64>("a", None, Policy::LENIENT).unwrap();
        let err = e.encode::<i64>("b", None, Policy::new(true, false)).unwrap_err();
        assert!(matches!(err, Error::RequiredFieldNil { ref key } if key == "b"));
        e.set("x.y", &3);
        assert_eq!(Value::Object(tree), json!({"x": {"y": 3}}));
    }

    #[test]
    fn encode_failures_surface_only_when_throwing() {
        use std::collections::BTreeMap;
        let bad: BTreeMap<(i32, i32), i32> = BTreeMap::from([((1, 2), 3)]);
        let mut tree = Map::new();
        let mut e = Encoder::new(&mut tree);
        e.set("m", &bad);
        let err = e.encode("m", Some(&bad), Policy::new(false, true)).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
        assert!(tree.is_empty());
    }
}
