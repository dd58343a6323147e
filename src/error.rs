use crate::coerce::Kind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors from encoding or decoding a record.
///
/// Field-level variants only surface when the field (or its record) sets
/// `nonnull` or `throws`; otherwise the field is skipped silently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `nonnull` field found no value under any of its keys.
    #[error("missing required field `{key}`")]
    MissingRequiredField { key: String },

    /// A `nonnull` field had no value at encode time.
    #[error("required field `{key}` is nil")]
    RequiredFieldNil { key: String },

    /// A value was present but neither decoded, coerced, nor converted.
    #[error("type mismatch at `{key}`: expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: Kind,
        actual: &'static str,
    },

    /// A field value could not be turned into a tree node.
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Bytes or text were not valid JSON.
    #[error("malformed tree: {0}")]
    MalformedTree(#[from] serde_json::Error),

    /// A serde-driven decode failed somewhere below the root.
    #[error("at JSON path {path} → {source}")]
    Path {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The field key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::MissingRequiredField { key }
            | Error::RequiredFieldNil { key }
            | Error::TypeMismatch { key, .. }
            | Error::Encode { key, .. } => Some(key),
            Error::MalformedTree(_) | Error::Path { .. } => None,
        }
    }
}
