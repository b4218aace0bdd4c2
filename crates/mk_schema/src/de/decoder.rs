use core::any::Any;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde_json::{Map, Number, Value};

use crate::error::DecodeError;
use crate::info::{Mapped, Schema, SchemaType, TypeDescriptor, TypeKey, normalize};
use crate::options::MappingOptions;
use crate::registry::{SchemaRegistry, TypeEntry, find_property};
use crate::value::{Dynamic, OpenMap, Primitive};
use crate::wire::Wire;

fn untyped_number(number: &Number) -> Dynamic {
    if let Some(i) = number.as_i64() {
        return Primitive::I64(i).into();
    }
    if let Some(u) = number.as_u64() {
        return Primitive::U64(u).into();
    }
    let text = number.to_string();
    if let Ok(i) = text.parse::<i128>() {
        return Primitive::I128(i).into();
    }
    // floats only when they represent the written value exactly
    let primitive = match (number.as_f64(), BigDecimal::from_str(&text)) {
        (Some(f), Ok(exact)) if exact.is_zero() => Primitive::F64(f),
        (Some(f), Ok(exact))
            if f.is_finite() && f.to_string().parse::<BigDecimal>().is_ok_and(|d| d == exact) =>
        {
            Primitive::F64(f)
        }
        (_, Ok(exact)) => Primitive::Decimal(exact),
        (Some(f), Err(_)) => Primitive::F64(f),
        (None, Err(_)) => Primitive::String(text),
    };
    primitive.into()
}

// -----------------------------------------------------------------------------
// Decoder

/// Turns JSON values into typed values using a [`SchemaRegistry`].
///
/// A decoder borrows the registry and options for the duration of one call
/// and holds no other state, so nested values can be decoded with the same
/// instance from inside overrides.
///
/// # Example
///
/// ```
/// use mk_schema::{MappingOptions, Schema, SchemaRegistry, de::Decoder};
///
/// #[derive(Schema, Default, Debug)]
/// struct Part {
///     id: String,
///     qty: i16,
/// }
///
/// let registry = SchemaRegistry::new();
/// let options = MappingOptions::default();
/// let decoder = Decoder::new(&registry, &options);
///
/// let part: Part = decoder.decode_str(r#"{"id": "P1", "QTY": 10, "extra": true}"#).unwrap();
/// assert_eq!(part.qty, 10);
/// ```
#[derive(Clone, Copy)]
pub struct Decoder<'a> {
    registry: &'a SchemaRegistry,
    options: &'a MappingOptions,
}

impl<'a> Decoder<'a> {
    #[inline]
    pub const fn new(registry: &'a SchemaRegistry, options: &'a MappingOptions) -> Self {
        Self { registry, options }
    }

    #[inline]
    pub const fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    #[inline]
    pub const fn options(&self) -> &'a MappingOptions {
        self.options
    }

    fn property<'v>(&self, object: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
        find_property(object, name, self.options.case_insensitive)
    }

    // -------------------------------------------------------------------------
    // Typed

    /// Decodes `value` as `T`.
    #[inline]
    pub fn decode<T: Wire>(&self, value: &Value) -> Result<T, DecodeError> {
        T::decode(value, self)
    }

    /// Parses `json` and decodes it as `T`.
    pub fn decode_str<T: Wire>(&self, json: &str) -> Result<T, DecodeError> {
        let value: Value = serde_json::from_str(json)?;
        self.decode(&value)
    }

    /// Decodes a JSON object into exactly `T`, without consulting discriminators.
    pub fn decode_schema<T: Schema>(&self, value: &Value) -> Result<T, DecodeError> {
        let Value::Object(object) = value else {
            return Err(DecodeError::shape(T::NAME, value));
        };
        let descriptor = self.registry.describe(SchemaType::of::<T>())?;
        let mut target = T::default();
        self.populate_with(&mut target, &descriptor, object)?;
        Ok(target)
    }

    /// Decodes a JSON object into the mask `I`, resolving the concrete type
    /// through defaults and discriminators.
    pub fn decode_mask<I: ?Sized + 'static>(&self, value: &Value) -> Result<Box<I>, DecodeError> {
        let object = self.decode_object(value, TypeKey::of::<I>())?;
        self.registry.cast::<I>(object)
    }

    // -------------------------------------------------------------------------
    // Runtime typed

    /// Decodes `value` with `target` known only at runtime.
    ///
    /// - objects resolve `target` to a concrete schema type,
    /// - arrays decode every element as `target`,
    /// - scalars use the registered value type `target`,
    /// - `null` stays [`Dynamic::Null`].
    pub fn decode_as(&self, value: &Value, target: TypeKey) -> Result<Dynamic, DecodeError> {
        match value {
            Value::Null => Ok(Dynamic::Null),
            Value::Object(_) => self.decode_object(value, target).map(Dynamic::Object),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.decode_as(item, target).map_err(|e| e.in_index(index)))
                .collect::<Result<Vec<_>, _>>()
                .map(Dynamic::List),
            scalar => match self.registry.get(target.id()) {
                Some(TypeEntry::Value(ty)) => ty.decode(scalar, self),
                _ => Err(DecodeError::shape(target.name(), scalar)),
            },
        }
    }

    /// Decodes a JSON object into a fresh instance of the type `target`
    /// resolves to.
    pub fn decode_object(
        &self,
        value: &Value,
        target: TypeKey,
    ) -> Result<Box<dyn Mapped>, DecodeError> {
        let Value::Object(object) = value else {
            return Err(DecodeError::shape(target.name(), value));
        };
        let ty = self
            .registry
            .resolve(target, object, self.options.case_insensitive)?;
        let descriptor = self.registry.describe(ty)?;
        let mut instance = ty.create();
        self.populate_with(instance.as_any_mut(), &descriptor, object)?;
        Ok(instance)
    }

    /// Decodes without a target type: objects become maps, arrays lists and
    /// numbers the narrowest of `i64`, `u64`, `i128`, `f64` or a decimal.
    pub fn decode_untyped(&self, value: &Value) -> Result<Dynamic, DecodeError> {
        Ok(match value {
            Value::Null => Dynamic::Null,
            Value::Bool(b) => Primitive::Bool(*b).into(),
            Value::Number(n) => untyped_number(n),
            Value::String(s) => Primitive::String(s.clone()).into(),
            Value::Array(items) => Dynamic::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.decode_untyped(item).map_err(|e| e.in_index(index)))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(object) => Dynamic::Map(
                object
                    .iter()
                    .map(|(name, item)| {
                        let item = self.decode_untyped(item).map_err(|e| e.in_field(name))?;
                        Ok((name.clone(), item))
                    })
                    .collect::<Result<OpenMap, DecodeError>>()?,
            ),
        })
    }

    // -------------------------------------------------------------------------
    // Population

    /// Fills an existing object from the properties of `object`.
    ///
    /// Properties keep their previous values when absent from the document.
    pub fn populate(
        &self,
        target: &mut dyn Mapped,
        object: &Map<String, Value>,
    ) -> Result<(), DecodeError> {
        let descriptor = self.registry.describe(target.schema_type())?;
        self.populate_with(target.as_any_mut(), &descriptor, object)
    }

    pub(crate) fn populate_with(
        &self,
        target: &mut dyn Any,
        descriptor: &TypeDescriptor,
        object: &Map<String, Value>,
    ) -> Result<(), DecodeError> {
        let case_insensitive = self.options.case_insensitive;

        for (name, value) in object {
            let key = normalize(name);

            if let Some(named) = descriptor.decode_hook(&key)
                && (case_insensitive || named.wire_name == name.as_str())
            {
                named
                    .hook
                    .apply(target, value, self)
                    .map_err(|e| e.in_field(name))?;
                continue;
            }

            if let Some(field) = descriptor.field_by_key(&key)
                && (case_insensitive || field.wire_name() == name.as_str())
            {
                let source = match field.proxy() {
                    Some(proxy) => self
                        .unwrap_proxy(value, proxy)
                        .map_err(|e| e.in_field(name))?,
                    None => value,
                };
                field
                    .access()
                    .decode(target, source, self)
                    .map_err(|e| e.in_field(name))?;
                continue;
            }

            if !descriptor.has_open_map() {
                log::trace!("dropping unmapped property `{name}` of `{}`", descriptor.name());
                continue;
            }
            let captured = self.decode_untyped(value).map_err(|e| e.in_field(name))?;
            if let Some(extensions) = descriptor.open_map_mut(target) {
                extensions.insert(name.clone(), captured);
            }
        }
        Ok(())
    }

    /// `null`, bare or inside the envelope, is left to the field type.
    fn unwrap_proxy<'v>(&self, value: &'v Value, proxy: &str) -> Result<&'v Value, DecodeError> {
        let envelope = match value {
            Value::Object(envelope) => envelope,
            Value::Null => return Ok(value),
            _ => return Err(DecodeError::shape(format!("object with `{proxy}`"), value)),
        };
        match self.property(envelope, proxy) {
            Some(inner @ (Value::Array(_) | Value::Null)) => Ok(inner),
            Some(other) => Err(DecodeError::shape("array", other).in_field(proxy)),
            None => Err(DecodeError::shape(format!("object with `{proxy}`"), value)),
        }
    }

    // -------------------------------------------------------------------------
    // Wrapped collections

    fn wrapped_items<'v>(
        &self,
        value: &'v Value,
        wrapper: &str,
        ignore_if_missing: bool,
    ) -> Result<&'v [Value], DecodeError> {
        let Value::Object(root) = value else {
            return Err(DecodeError::shape("object", value));
        };
        match self.property(root, wrapper) {
            Some(Value::Array(items)) => Ok(items),
            None | Some(Value::Null) if ignore_if_missing => {
                log::trace!("wrapper property `{wrapper}` is missing, decoding nothing");
                Ok(&[])
            }
            None | Some(Value::Null) => Err(DecodeError::MissingWrapper(wrapper.to_owned())),
            Some(other) => Err(DecodeError::shape("array", other).in_field(wrapper)),
        }
    }

    /// Decodes the array under the root property `wrapper`, e.g.
    /// `{"member": [..]}`.
    ///
    /// A missing or `null` wrapper fails with [`DecodeError::MissingWrapper`]
    /// unless `ignore_if_missing` is set, in which case the result is empty.
    pub fn decode_wrapped<T: Wire>(
        &self,
        value: &Value,
        wrapper: &str,
        ignore_if_missing: bool,
    ) -> Result<Vec<T>, DecodeError> {
        self.wrapped_items(value, wrapper, ignore_if_missing)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::decode(item, self).map_err(|e| e.in_index(index).in_field(wrapper))
            })
            .collect()
    }

    /// Parses `json` and decodes it with [`decode_wrapped`](Self::decode_wrapped).
    pub fn decode_wrapped_str<T: Wire>(
        &self,
        json: &str,
        wrapper: &str,
        ignore_if_missing: bool,
    ) -> Result<Vec<T>, DecodeError> {
        let value: Value = serde_json::from_str(json)?;
        self.decode_wrapped(&value, wrapper, ignore_if_missing)
    }

    /// The runtime-typed form of [`decode_wrapped`](Self::decode_wrapped).
    pub fn decode_wrapped_as(
        &self,
        value: &Value,
        wrapper: &str,
        ignore_if_missing: bool,
        target: TypeKey,
    ) -> Result<Vec<Dynamic>, DecodeError> {
        self.wrapped_items(value, wrapper, ignore_if_missing)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.decode_as(item, target)
                    .map_err(|e| e.in_index(index).in_field(wrapper))
            })
            .collect()
    }
}
