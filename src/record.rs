//! Record-level encode/decode driven by a key map.
use std::any::type_name;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::codec::{Decoder, Encoder, Policy};
use crate::convert::{self, Converter, Registry};
use crate::error::Result;
use crate::field::{Field, FieldSpec, Mapping};

static EMPTY: Lazy<Map<String, Value>> = Lazy::new(Map::new);

// ------------------------------- Record ----------------------------------- //

/// A type whose external representation is described by a `KeyMap`.
///
/// ```ignore
/// impl Record for Status {
///     fn key_map() -> &'static KeyMap<Self> {
///         static MAP: Lazy<KeyMap<Status>> = Lazy::new(|| {
///             KeyMap::<Status>::new()
///                 .value(["code", "c"], |s| &s.code, |s, v| s.code = v)
///                 .optional("meta.reason", |s| s.reason.as_ref(), |s, v| s.reason = Some(v))
///         });
///         &MAP
///     }
/// }
/// ```
pub trait Record: Default + 'static {
    /// Record-wide default for fields without their own `nonnull`.
    const NONNULL: bool = false;
    /// Record-wide default for fields without their own `throws`.
    const THROWS: bool = false;

    fn key_map() -> &'static KeyMap<Self>;

    /// Converter tried before the registry for this record's fields.
    fn converter() -> Option<&'static dyn Converter> { None }

    fn policy() -> Policy { Policy::new(Self::NONNULL, Self::THROWS) }
}

// ------------------------------- KeyMap ----------------------------------- //

/// Ordered field table of a record type. Built once, never mutated.
pub struct KeyMap<R> {
    mappings: Vec<Box<dyn Mapping<R>>>,
}

impl<R: 'static> Default for KeyMap<R> {
    fn default() -> Self { KeyMap { mappings: Vec::new() } }
}

impl<R: 'static> KeyMap<R> {
    pub fn new() -> Self { Self::default() }

    /// Start with the whole key map of a base record reached through `get` /
    /// `get_mut`. Base fields land in the same flat object, ahead of any field
    /// added afterwards.
    pub fn extending<B: Record>(get: fn(&R) -> &B, get_mut: fn(&mut R) -> &mut B) -> Self {
        Self::new().push(Inherit { get, get_mut })
    }

    pub fn push(mut self, mapping: impl Mapping<R> + 'static) -> Self {
        self.mappings.push(Box::new(mapping));
        self
    }

    pub fn field<V>(self, field: Field<R, V>) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        self.push(field)
    }

    pub fn value<V>(self, spec: impl Into<FieldSpec>, get: fn(&R) -> &V, set: fn(&mut R, V)) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        self.push(Field::value(spec, get, set))
    }

    pub fn optional<V>(
        self,
        spec: impl Into<FieldSpec>,
        get: fn(&R) -> Option<&V>,
        set: fn(&mut R, V),
    ) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        self.push(Field::optional(spec, get, set))
    }

    pub fn len(&self) -> usize { self.mappings.len() }

    pub fn is_empty(&self) -> bool { self.mappings.is_empty() }

    fn iter(&self) -> impl Iterator<Item = &dyn Mapping<R>> {
        self.mappings.iter().map(|m| m.as_ref())
    }
}

struct Inherit<R, B> {
    get: fn(&R) -> &B,
    get_mut: fn(&mut R) -> &mut B,
}

impl<R, B: Record> Mapping<R> for Inherit<R, B> {
    fn encode(&self, record: &R, encoder: &mut Encoder<'_>, _: Policy) -> Result<()> {
        encode_fields((self.get)(record), encoder)
    }

    fn decode(&self, record: &mut R, decoder: &Decoder<'_>, _: Policy) -> Result<()> {
        decode_fields((self.get_mut)(record), decoder.tree(), decoder.registry())
    }
}

// ------------------------------- Drivers ---------------------------------- //

/// Run every field of `record` against `encoder`, in declaration order.
pub fn encode_fields<R: Record>(record: &R, encoder: &mut Encoder<'_>) -> Result<()> {
    let policy = R::policy();
    R::key_map()
        .iter()
        .try_for_each(|mapping| mapping.encode(record, encoder, policy))
}

/// Decode every field of `record` from `tree`; the first escalated field error
/// aborts.
pub fn decode_fields<R: Record>(record: &mut R, tree: &Map<String, Value>, registry: &Registry) -> Result<()> {
    let decoder = Decoder::new(tree, registry).with_converter(R::converter());
    let policy = R::policy();
    R::key_map()
        .iter()
        .try_for_each(|mapping| mapping.decode(record, &decoder, policy))
}

pub fn encode<R: Record>(record: &R) -> Result<Value> {
    tracing::trace!(record = type_name::<R>(), "encoding");
    let mut tree = Map::new();
    encode_fields(record, &mut Encoder::new(&mut tree))?;
    Ok(Value::Object(tree))
}

/// Decode with the process-wide converter registry.
pub fn decode<R: Record>(tree: &Value) -> Result<R> {
    decode_in(tree, convert::global())
}

/// Decode with an explicit converter registry. A non-object `tree` has no keys.
///
/// Records nested inside serde containers (`Vec<R>`, `Option<R>`, maps) see the
/// same registry.
pub fn decode_in<R: Record>(tree: &Value, registry: &Registry) -> Result<R> {
    tracing::trace!(record = type_name::<R>(), "decoding");
    let _active = convert::activate(registry);
    let mut record = R::default();
    decode_fields(&mut record, tree.as_object().unwrap_or(&EMPTY), registry)?;
    Ok(record)
}

/// Decode with the registry of the enclosing decode call, or the global one at
/// top level. Used by `keymap_serde!`.
pub fn decode_active<R: Record>(tree: &Value) -> Result<R> {
    decode_in(tree, &convert::active())
}

// ------------------------------ serde glue -------------------------------- //

/// Implement `serde::Serialize` and `serde::Deserialize` for a `Record` through
/// its key map, so it can sit inside other records, `Vec`s and maps.
#[macro_export]
macro_rules! keymap_serde {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::__private::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                let tree = $crate::encode(self)
                    .map_err(<S::Error as $crate::__private::serde::ser::Error>::custom)?;
                $crate::__private::serde::Serialize::serialize(&tree, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let tree: $crate::__private::serde_json::Value =
                    $crate::__private::serde::Deserialize::deserialize(deserializer)?;
                $crate::record::decode_active(&tree).map_err(<D::Error as $crate::__private::serde::de::Error>::custom)
            }
        }
    )+};
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    impl Record for Point {
        fn key_map() -> &'static KeyMap<Self> {
            static MAP: Lazy<KeyMap<Point>> = Lazy::new(|| {
                KeyMap::<Point>::new()
                    .value(["x", "px"], |p| &p.x, |p, v| p.x = v)
                    .value("pos.y", |p| &p.y, |p, v| p.y = v)
                    .optional("label", |p| p.label.as_ref(), |p, v| p.label = Some(v))
            });
            &MAP
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Strict {
        id: u64,
        name: Option<String>,
    }

    impl Record for Strict {
        const NONNULL: bool = true;

        fn key_map() -> &'static KeyMap<Self> {
            static MAP: Lazy<KeyMap<Strict>> = Lazy::new(|| {
                KeyMap::<Strict>::new()
                    .value("id", |s| &s.id, |s, v| s.id = v)
                    .field(
                        Field::optional("name", |s: &Strict| s.name.as_ref(), |s, v| s.name = Some(v))
                            .nonnull(false),
                    )
            });
            &MAP
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Labeled {
        point: Point,
        color: String,
    }

    impl Record for Labeled {
        fn key_map() -> &'static KeyMap<Self> {
            static MAP: Lazy<KeyMap<Labeled>> = Lazy::new(|| {
                KeyMap::extending(|l: &Labeled| &l.point, |l| &mut l.point)
                    .value("color", |l| &l.color, |l, v| l.color = v)
            });
            &MAP
        }
    }

    #[test]
    fn encodes_in_declaration_order_and_sparse() {
        let p = Point { x: 1, y: 2, label: None };
        let tree = encode(&p).unwrap();
        assert_eq!(tree, json!({"x": 1, "pos": {"y": 2}}));
        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["x", "pos"]);
    }

    #[test]
    fn round_trip_default_policy() {
        let p = Point { x: -4, y: 9, label: Some("home".into()) };
        let back: Point = decode(&encode(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn absent_fields_keep_defaults() {
        let p: Point = decode(&json!({"px": 5})).unwrap();
        assert_eq!(p, Point { x: 5, ..Point::default() });
        let p: Point = decode(&json!([1, 2, 3])).unwrap();
        assert_eq!(p, Point::default());
    }

    #[test]
    fn record_default_nonnull_with_field_override() {
        let s: Strict = decode(&json!({"id": 7})).unwrap();
        assert_eq!(s, Strict { id: 7, name: None });

        let err = decode::<Strict>(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { ref key } if key == "id"));
    }

    #[test]
    fn first_failing_field_aborts_record() {
        #[derive(Debug, Default)]
        struct Two {
            a: i32,
            b: i32,
        }
        impl Record for Two {
            const THROWS: bool = true;
            fn key_map() -> &'static KeyMap<Self> {
                static MAP: Lazy<KeyMap<Two>> = Lazy::new(|| {
                    KeyMap::<Two>::new()
                        .value("a", |t| &t.a, |t, v| t.a = v)
                        .value("b", |t| &t.b, |t, v| t.b = v)
                });
                &MAP
            }
        }
        let err = decode::<Two>(&json!({"a": [], "b": {}})).unwrap_err();
        assert_eq!(err.key(), Some("a"));
        let two: Two = decode(&json!({"a": "3", "b": 4.5})).unwrap();
        assert_eq!((two.a, two.b), (3, 4));
    }

    #[test]
    fn derived_fields_share_the_flat_tree() {
        let l = Labeled {
            point: Point { x: 1, y: 2, label: Some("p".into()) },
            color: "red".into(),
        };
        let tree = encode(&l).unwrap();
        assert_eq!(tree, json!({"x": 1, "pos": {"y": 2}, "label": "p", "color": "red"}));
        assert_eq!(decode::<Labeled>(&tree).unwrap(), l);
        assert_eq!(Labeled::key_map().len(), 2);
    }

    #[test]
    fn decode_in_uses_the_given_registry() {
        let registry = Registry::new();
        registry.register(|node: &Value, target: crate::Kind| match (node, target) {
            (Value::String(s), crate::Kind::Int(_)) if s == "origin" => Some(json!(0)),
            _ => None,
        });
        let p: Point = decode_in(&json!({"x": "origin", "pos": {"y": "3"}}), &registry).unwrap();
        assert_eq!((p.x, p.y), (0, 3));
    }
}
