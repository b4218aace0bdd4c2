use serde_json::{Map, Value};

use crate::de::Decoder;
use crate::error::{DecodeError, EncodeError};
use crate::info::Schema;
use crate::ser::Encoder;
use crate::value::{Dynamic, OpenMap};
use crate::wire::Wire;

impl<T: Wire> Wire for Option<T> {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, decoder).map(Some),
        }
    }

    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        match self {
            Some(inner) => inner.encode(encoder),
            None => Ok(Value::Null),
        }
    }

    #[inline]
    fn is_null(&self) -> bool {
        self.as_ref().is_none_or(Wire::is_null)
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        let Value::Array(items) = value else {
            return Err(DecodeError::shape("array", value));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| T::decode(item, decoder).map_err(|e| e.in_index(index)))
            .collect()
    }

    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        self.iter()
            .enumerate()
            .map(|(index, item)| item.encode(encoder).map_err(|e| e.in_index(index)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl Wire for OpenMap {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        let Value::Object(object) = value else {
            return Err(DecodeError::shape("object", value));
        };
        object
            .iter()
            .map(|(name, item)| {
                let item = decoder.decode_untyped(item).map_err(|e| e.in_field(name))?;
                Ok((name.clone(), item))
            })
            .collect()
    }

    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        let mut object = Map::new();
        for (name, item) in self {
            let item = encoder.encode_dynamic(item).map_err(|e| e.in_field(name))?;
            object.insert(name.clone(), item);
        }
        Ok(Value::Object(object))
    }
}

impl Wire for Dynamic {
    #[inline]
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.decode_untyped(value)
    }

    #[inline]
    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_dynamic(self)
    }

    #[inline]
    fn is_null(&self) -> bool {
        Dynamic::is_null(self)
    }
}

impl Wire for Value {
    #[inline]
    fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }

    #[inline]
    fn encode(&self, _: &Encoder<'_>) -> Result<Value, EncodeError> {
        Ok(self.clone())
    }

    #[inline]
    fn is_null(&self) -> bool {
        Value::is_null(self)
    }
}

/// Schema types named statically decode as exactly that type; discriminators
/// only apply when the requested type is resolved at runtime.
impl<T: Schema> Wire for T {
    #[inline]
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.decode_schema::<T>(value)
    }

    #[inline]
    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_object(self)
    }
}
