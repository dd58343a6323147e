//! Declarative key mapping between records and JSON trees.
//!
//! A record type lists its fields once, in a `KeyMap`: each field gets one or
//! more candidate keys (dotted keys address nested objects), optional
//! `nonnull` / `throws` escalation, and optional custom encode/decode hooks.
//! Decoding tries the keys in order and coerces mismatched primitives
//! (bool ↔ integer ↔ double ↔ string) before falling back to custom converters.
pub mod codec;
pub mod coerce;
pub mod convert;
pub mod error;
pub mod field;
pub mod json;
pub mod key;
pub mod nested;
pub mod record;

pub use codec::{Decoder, Encoder, Policy};
pub use coerce::Kind;
pub use convert::{register, Converter, Registry};
pub use error::{Error, Result};
pub use field::{Field, FieldSpec, Mapping};
pub use key::{Key, KeyPath};
pub use record::{decode, decode_in, encode, KeyMap, Record};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
