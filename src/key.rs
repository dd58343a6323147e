//! Field keys and the dotted key-path syntax.
use std::fmt;

// ------------------------------- Key -------------------------------------- //

/// One candidate location for a field in the external tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Bare string key; `"a.b.c"` addresses a nested object.
    Path(String),
    /// Explicit coding key, never split on `.`.
    Exact(String),
}

impl Key {
    pub fn path(name: impl Into<String>) -> Self { Key::Path(name.into()) }
    pub fn exact(name: impl Into<String>) -> Self { Key::Exact(name.into()) }

    /// The raw key text as declared.
    pub fn name(&self) -> &str {
        match self {
            Key::Path(s) | Key::Exact(s) => s,
        }
    }

    pub fn segments(&self) -> KeyPath {
        match self {
            Key::Path(s) => KeyPath::parse(s),
            Key::Exact(s) => KeyPath::single(s.clone()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self { Key::Path(s.to_owned()) }
}

impl From<String> for Key {
    fn from(s: String) -> Self { Key::Path(s) }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self { k.clone() }
}

// ------------------------------ KeyPath ----------------------------------- //

/// Ordered, non-empty list of object keys from the root to a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn single(segment: impl Into<String>) -> Self { KeyPath(vec![segment.into()]) }

    /// Split a dotted key. Keys of length <= 1 or without a dot stay whole, so
    /// a lone `"."` never turns into two empty segments.
    ///
    /// Malformed input such as `"a..b"` yields empty segments; those simply
    /// never match anything on decode.
    pub fn parse(raw: &str) -> Self {
        if raw.len() <= 1 || !raw.contains('.') {
            return Self::single(raw);
        }
        KeyPath(raw.split('.').map(str::to_owned).collect())
    }

    pub fn segments(&self) -> &[String] { &self.0 }

    pub fn is_nested(&self) -> bool { self.0.len() > 1 }

    /// `(last, parents)`; `None` only for an empty path.
    pub fn split_last(&self) -> Option<(&String, &[String])> { self.0.split_last() }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

// ------------------------------- Tests ------------------------------------ //
