//! Per-field mapping declarations.
use std::any::type_name;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Decoder, Encoder, Policy};
use crate::error::Result;
use crate::key::Key;

// ----------------------------- FieldSpec ---------------------------------- //

/// Candidate keys plus policy overrides for one field.
///
/// The first key is primary: encoding writes there, decoding tries it first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    keys: Vec<Key>,
    nonnull: Option<bool>,
    throws: Option<bool>,
}

impl FieldSpec {
    pub fn new<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Self {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        debug_assert!(!keys.is_empty(), "a field needs at least one key");
        FieldSpec { keys, nonnull: None, throws: None }
    }

    pub fn nonnull(mut self, nonnull: bool) -> Self {
        self.nonnull = Some(nonnull);
        self
    }

    pub fn throws(mut self, throws: bool) -> Self {
        self.throws = Some(throws);
        self
    }

    pub fn keys(&self) -> &[Key] { &self.keys }

    pub fn primary(&self) -> Option<&Key> { self.keys.first() }

    /// Effective policy under the record-level defaults.
    pub fn policy(&self, defaults: Policy) -> Policy {
        defaults.with_overrides(self.nonnull, self.throws)
    }
}

impl From<&str> for FieldSpec {
    fn from(key: &str) -> Self { FieldSpec::new([key]) }
}

impl From<String> for FieldSpec {
    fn from(key: String) -> Self { FieldSpec::new([key]) }
}

impl From<Key> for FieldSpec {
    fn from(key: Key) -> Self { FieldSpec::new([key]) }
}

impl<K: Into<Key>, const N: usize> From<[K; N]> for FieldSpec {
    fn from(keys: [K; N]) -> Self { FieldSpec::new(keys) }
}

impl<K: Into<Key>> From<Vec<K>> for FieldSpec {
    fn from(keys: Vec<K>) -> Self { FieldSpec::new(keys) }
}

// ------------------------------ Mapping ----------------------------------- //

/// One entry of a record's key map.
pub trait Mapping<R>: Send + Sync {
    fn encode(&self, record: &R, encoder: &mut Encoder<'_>, defaults: Policy) -> Result<()>;
    fn decode(&self, record: &mut R, decoder: &Decoder<'_>, defaults: Policy) -> Result<()>;
}

// ------------------------------- Field ------------------------------------ //

type EncodeWith<V> = Box<dyn Fn(&mut Encoder<'_>, Option<&V>) -> Result<()> + Send + Sync>;
type DecodeWith<V> = Box<dyn Fn(&Decoder<'_>) -> Result<Option<V>> + Send + Sync>;

enum Getter<R, V> {
    Value(fn(&R) -> &V),
    Optional(fn(&R) -> Option<&V>),
}

/// Binds a `FieldSpec` to one field of `R` holding a `V`.
pub struct Field<R, V> {
    spec: FieldSpec,
    get: Getter<R, V>,
    set: fn(&mut R, V),
    encode_with: Option<EncodeWith<V>>,
    decode_with: Option<DecodeWith<V>>,
}

impl<R, V> Field<R, V> {
    /// A field that always holds a value.
    ///
    /// `Option<X>` fields belong in [`Field::optional`]: here `None` would be
    /// written as an explicit `null` and the coercion rules for `X` would never
    /// apply.
    pub fn value(spec: impl Into<FieldSpec>, get: fn(&R) -> &V, set: fn(&mut R, V)) -> Self {
        debug_assert!(
            !type_name::<V>().starts_with("core::option::Option<"),
            "`{}` is an Option; declare it with `optional`",
            type_name::<V>(),
        );
        Self::with_getter(spec.into(), Getter::Value(get), set)
    }

    /// A field that may be nil, usually an `Option<V>`.
    pub fn optional(spec: impl Into<FieldSpec>, get: fn(&R) -> Option<&V>, set: fn(&mut R, V)) -> Self {
        Self::with_getter(spec.into(), Getter::Optional(get), set)
    }

    fn with_getter(spec: FieldSpec, get: Getter<R, V>, set: fn(&mut R, V)) -> Self {
        Field { spec, get, set, encode_with: None, decode_with: None }
    }

    pub fn nonnull(mut self, nonnull: bool) -> Self {
        self.spec = self.spec.nonnull(nonnull);
        self
    }

    pub fn throws(mut self, throws: bool) -> Self {
        self.spec = self.spec.throws(throws);
        self
    }

    /// Replace key-based encoding. The closure sees the field's current value.
    pub fn encode_with(
        mut self,
        encode: impl Fn(&mut Encoder<'_>, Option<&V>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.encode_with = Some(Box::new(encode));
        self
    }

    /// Replace key-based decoding; keys, `nonnull` and `throws` no longer apply.
    /// `Ok(None)` leaves the field untouched.
    pub fn decode_with(
        mut self,
        decode: impl Fn(&Decoder<'_>) -> Result<Option<V>> + Send + Sync + 'static,
    ) -> Self {
        self.decode_with = Some(Box::new(decode));
        self
    }

    pub fn spec(&self) -> &FieldSpec { &self.spec }

    fn current<'r>(&self, record: &'r R) -> Option<&'r V> {
        match self.get {
            Getter::Value(get) => Some(get(record)),
            Getter::Optional(get) => get(record),
        }
    }
}

impl<R, V> Mapping<R> for Field<R, V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    fn encode(&self, record: &R, encoder: &mut Encoder<'_>, defaults: Policy) -> Result<()> {
        let value = self.current(record);
        if let Some(encode) = &self.encode_with {
            return encode(encoder, value);
        }
        let Some(key) = self.spec.primary() else { return Ok(()) };
        encoder.encode_key(key, value, self.spec.policy(defaults))
    }

    fn decode(&self, record: &mut R, decoder: &Decoder<'_>, defaults: Policy) -> Result<()> {
        let value = match &self.decode_with {
            Some(decode) => decode(decoder)?,
            None => decoder.decode_keys::<V>(self.spec.keys(), self.spec.policy(defaults))?,
        };
        if let Some(value) = value {
            (self.set)(record, value);
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //
