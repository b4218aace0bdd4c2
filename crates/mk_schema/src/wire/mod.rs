//! The [`Wire`] trait: how a field type crosses the JSON boundary.

// -----------------------------------------------------------------------------
// Modules

mod container;
mod number;
mod scalar;

// -----------------------------------------------------------------------------
// Wire

use serde_json::Value;

use crate::de::Decoder;
use crate::error::{DecodeError, EncodeError};
use crate::ser::Encoder;

/// A type that can be read from and written to a JSON value.
///
/// Implemented for scalars, `String`, `BigDecimal`, `Option<T>`, `Vec<T>`,
/// [`Dynamic`](crate::value::Dynamic), [`OpenMap`](crate::value::OpenMap),
/// `serde_json::Value` and every [`Schema`](crate::Schema) type. Mask boxes
/// get an implementation from [`impl_mask!`](crate::impl_mask).
///
/// Implementations report failures at the value they were given; callers
/// prefix the location.
pub trait Wire: Send + Sync + Sized + 'static {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError>;

    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError>;

    /// Returns `true` if the value encodes to `null`.
    #[inline]
    fn is_null(&self) -> bool {
        false
    }
}
