use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use crate::info::{Mapped, Schema};
use crate::value::Primitive;

/// Ordered map capturing JSON properties that a type does not declare.
///
/// Keys keep the spelling found in the document.
pub type OpenMap = IndexMap<String, Dynamic>;

// -----------------------------------------------------------------------------
// Dynamic

/// A value whose type is only known at runtime.
///
/// Produced by untyped decoding, by the runtime-typed API
/// ([`Decoder::decode_as`](crate::de::Decoder::decode_as)) and by encode
/// overrides. Encoding a `Dynamic` dispatches on the runtime type of the
/// carried value.
#[derive(Debug, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Primitive(Primitive),
    Object(Box<dyn Mapped>),
    Map(OpenMap),
    List(Vec<Dynamic>),
}

impl Dynamic {
    /// Wraps a schema-described value.
    #[inline]
    pub fn object<T: Schema>(value: T) -> Self {
        Self::Object(Box::new(value))
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Kind of the carried value, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Primitive(p) => p.kind(),
            Self::Object(o) => o.schema_type().name(),
            Self::Map(_) => "map",
            Self::List(_) => "list",
        }
    }

    pub const fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Primitive::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_primitive().and_then(Primitive::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_primitive().and_then(Primitive::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_primitive().and_then(Primitive::as_bool)
    }

    pub fn as_object(&self) -> Option<&dyn Mapped> {
        match self {
            Self::Object(o) => Some(&**o),
            _ => None,
        }
    }

    pub const fn as_map(&self) -> Option<&OpenMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the carried object if it is a `T`.
    pub fn downcast_ref<T: Schema>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.downcast_ref::<T>())
    }

    /// Takes the carried object if it is a `T`, giving the value back otherwise.
    pub fn downcast<T: Schema>(self) -> Result<Box<T>, Self> {
        match self {
            Self::Object(o) => o.downcast::<T>().map_err(Self::Object),
            other => Err(other),
        }
    }
}

impl From<Primitive> for Dynamic {
    #[inline]
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Dynamic {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Primitive(value.into())
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64, char, BigDecimal,
    String, &str,
);

impl From<OpenMap> for Dynamic {
    #[inline]
    fn from(value: OpenMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    #[inline]
    fn from(value: Vec<Dynamic>) -> Self {
        Self::List(value)
    }
}

impl From<Box<dyn Mapped>> for Dynamic {
    #[inline]
    fn from(value: Box<dyn Mapped>) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
