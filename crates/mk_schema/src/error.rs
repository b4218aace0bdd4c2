use std::borrow::Cow;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

// -----------------------------------------------------------------------------
// JsonPath

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a value inside a JSON document, rendered as `$.parts[1].qty`.
///
/// Errors are created at the failing value with an empty path and
/// collect their segments while unwinding, so segments are stored
/// innermost-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    reversed: Vec<Segment>,
}

impl JsonPath {
    /// The document root, `$`.
    #[inline]
    pub const fn root() -> Self {
        Self {
            reversed: Vec::new(),
        }
    }

    /// Returns `true` if this path points to the document root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.reversed.is_empty()
    }

    fn push_field(&mut self, name: &str) {
        self.reversed.push(Segment::Field(name.to_owned()));
    }

    fn push_index(&mut self, index: usize) {
        self.reversed.push(Segment::Index(index));
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.reversed.iter().rev() {
            match segment {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Name of a JSON value kind, as used in diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// -----------------------------------------------------------------------------
// ConfigurationError

/// Ambiguous or conflicting schema metadata.
///
/// Raised while building a [`TypeDescriptor`](crate::info::TypeDescriptor) or a
/// registry entry. These describe programming mistakes in a type's declaration
/// and are meant to surface in tests, not to be handled at runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("type `{type_name}` declares wire name `{wire_name}` more than once")]
    DuplicateField {
        type_name: &'static str,
        wire_name: String,
    },

    #[error("type `{type_name}` declares more than one {direction} override for `{wire_name}`")]
    DuplicateOverride {
        type_name: &'static str,
        wire_name: String,
        direction: &'static str,
    },

    #[error("type `{type_name}` declares an encode override for `{wire_name}`, which is not a field")]
    OrphanEncodeOverride {
        type_name: &'static str,
        wire_name: String,
    },

    #[error("field `{wire_name}` of `{type_name}` is a proxy collection and cannot carry a decode override")]
    ProxyWithOverride {
        type_name: &'static str,
        wire_name: String,
    },

    #[error("type `{type_name}` declares more than one {what}")]
    ConflictingCapability {
        type_name: &'static str,
        what: &'static str,
    },

    #[error("discriminator `{field}` of `{base}` maps no values")]
    EmptyDiscriminator { base: &'static str, field: String },

    #[error("discriminator `{field}` of `{base}` maps `{value}` more than once")]
    DuplicateDiscriminatorValue {
        base: &'static str,
        field: String,
        value: String,
    },
}

// -----------------------------------------------------------------------------
// DecodeError

/// Failure while turning a JSON document into typed values.
///
/// Structural errors (`Shape`, `Coercion`, `MissingWrapper`) indicate a
/// wire-format contract violation and abort the whole call. Unmapped fields
/// and unregistered discriminator values are not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("expected {expected} but found {found} at `{path}`")]
    Shape {
        path: JsonPath,
        expected: Cow<'static, str>,
        found: &'static str,
    },

    #[error("cannot represent `{value}` as {target} at `{path}`")]
    Coercion {
        path: JsonPath,
        value: String,
        target: &'static str,
    },

    #[error("wrapper property `{0}` is missing")]
    MissingWrapper(String),

    #[error("no implementation registered for `{type_name}` at `{path}`")]
    NoImplementation {
        path: JsonPath,
        type_name: &'static str,
    },

    #[error("`{concrete}` is not registered as an implementation of `{mask}` at `{path}`")]
    NotImplemented {
        path: JsonPath,
        mask: &'static str,
        concrete: &'static str,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message} at `{path}`")]
    Custom { path: JsonPath, message: String },
}

impl DecodeError {
    /// Creates an error for an override function or a custom [`Wire`](crate::Wire) implementation.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Custom {
            path: JsonPath::root(),
            message: message.to_string(),
        }
    }

    /// Creates a [`DecodeError::Shape`] for `found`.
    pub fn shape(expected: impl Into<Cow<'static, str>>, found: &Value) -> Self {
        Self::Shape {
            path: JsonPath::root(),
            expected: expected.into(),
            found: kind_of(found),
        }
    }

    /// Creates a [`DecodeError::Coercion`].
    pub fn coercion(value: impl fmt::Display, target: &'static str) -> Self {
        Self::Coercion {
            path: JsonPath::root(),
            value: value.to_string(),
            target,
        }
    }

    /// Returns the location of the failing value, if the error has one.
    pub fn path(&self) -> Option<&JsonPath> {
        match self {
            Self::Shape { path, .. }
            | Self::Coercion { path, .. }
            | Self::NoImplementation { path, .. }
            | Self::NotImplemented { path, .. }
            | Self::Custom { path, .. } => Some(path),
            _ => None,
        }
    }

    fn path_mut(&mut self) -> Option<&mut JsonPath> {
        match self {
            Self::Shape { path, .. }
            | Self::Coercion { path, .. }
            | Self::NoImplementation { path, .. }
            | Self::NotImplemented { path, .. }
            | Self::Custom { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Prefixes the error location with an object member.
    #[must_use]
    pub fn in_field(mut self, name: &str) -> Self {
        if let Some(path) = self.path_mut() {
            path.push_field(name);
        }
        self
    }

    /// Prefixes the error location with an array index.
    #[must_use]
    pub fn in_index(mut self, index: usize) -> Self {
        if let Some(path) = self.path_mut() {
            path.push_index(index);
        }
        self
    }
}

// -----------------------------------------------------------------------------
// EncodeError

/// Failure while turning typed values into a JSON document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("cannot encode non-finite {kind} at `{path}`")]
    NonFinite { path: JsonPath, kind: &'static str },

    #[error("`{0}` is not a valid JSON number")]
    Number(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message} at `{path}`")]
    Custom { path: JsonPath, message: String },
}

impl EncodeError {
    /// Creates an error for an override function or a custom [`Wire`](crate::Wire) implementation.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Custom {
            path: JsonPath::root(),
            message: message.to_string(),
        }
    }

    /// Returns the location of the failing value, if the error has one.
    pub fn path(&self) -> Option<&JsonPath> {
        match self {
            Self::NonFinite { path, .. } | Self::Custom { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Prefixes the error location with an object member.
    #[must_use]
    pub fn in_field(mut self, name: &str) -> Self {
        if let Self::NonFinite { path, .. } | Self::Custom { path, .. } = &mut self {
            path.push_field(name);
        }
        self
    }

    /// Prefixes the error location with an array index.
    #[must_use]
    pub fn in_index(mut self, index: usize) -> Self {
        if let Self::NonFinite { path, .. } | Self::Custom { path, .. } = &mut self {
            path.push_index(index);
        }
        self
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DecodeError, JsonPath};

    #[test]
    fn path_is_built_while_unwinding() {
        let err = DecodeError::shape("i16", &json!("x"))
            .in_field("qty")
            .in_index(1)
            .in_field("parts");

        assert_eq!(err.path().unwrap().to_string(), "$.parts[1].qty");
        assert_eq!(
            err.to_string(),
            "expected i16 but found string at `$.parts[1].qty`"
        );
    }

    #[test]
    fn wrapper_errors_carry_no_path() {
        let err = DecodeError::MissingWrapper("member".into()).in_field("ignored");
        assert!(err.path().is_none());
        assert_eq!(JsonPath::root().to_string(), "$");
    }
}
