use bigdecimal::BigDecimal;
use serde_json::Value;

use crate::de::Decoder;
use crate::error::{DecodeError, EncodeError};
use crate::ser::Encoder;
use crate::value::Primitive;
use crate::wire::{Wire, number};

macro_rules! impl_wire_integer {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl Wire for $ty {
                fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
                    number::decode_integer(value, decoder.options().lenient_numbers, stringify!($ty))
                }

                #[inline]
                fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
                    encoder.encode_primitive(&Primitive::$variant(*self))
                }
            }
        )*
    };
}

impl_wire_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl Wire for u128 {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        number::decode_u128(value, decoder.options().lenient_numbers)
    }

    #[inline]
    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_primitive(&Primitive::U128(*self))
    }
}

impl Wire for f64 {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        number::decode_f64(value, decoder.options().lenient_numbers, "f64")
    }

    #[inline]
    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_primitive(&Primitive::F64(*self))
    }
}

impl Wire for f32 {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        number::decode_f32(value, decoder.options().lenient_numbers)
    }

    #[inline]
    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_primitive(&Primitive::F32(*self))
    }
}

impl Wire for BigDecimal {
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        number::decode_decimal(value, decoder.options().lenient_numbers)
    }

    fn encode(&self, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        encoder.encode_primitive(&Primitive::Decimal(self.clone()))
    }
}

impl Wire for bool {
    fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(DecodeError::shape("bool", other)),
        }
    }

    #[inline]
    fn encode(&self, _: &Encoder<'_>) -> Result<Value, EncodeError> {
        Ok(Value::Bool(*self))
    }
}

impl Wire for char {
    fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, DecodeError> {
        let Value::String(s) = value else {
            return Err(DecodeError::shape("char", value));
        };
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DecodeError::coercion(value, "char")),
        }
    }

    #[inline]
    fn encode(&self, _: &Encoder<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl Wire for String {
    /// Numbers and booleans are accepted in their JSON text form when
    /// lenient numbers are enabled.
    fn decode(value: &Value, decoder: &Decoder<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) if decoder.options().lenient_numbers => Ok(n.to_string()),
            Value::Bool(b) if decoder.options().lenient_numbers => Ok(b.to_string()),
            other => Err(DecodeError::shape("string", other)),
        }
    }

    #[inline]
    fn encode(&self, _: &Encoder<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.clone()))
    }
}
