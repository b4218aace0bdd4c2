use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::error::{EncodeError, JsonPath};
use crate::info::{Mapped, ViewContext};
use crate::options::MappingOptions;
use crate::registry::SchemaRegistry;
use crate::value::{Dynamic, Primitive};
use crate::wire::Wire;

fn number_from_text(text: String) -> Result<Value, EncodeError> {
    Number::from_str(&text)
        .map(Value::Number)
        .map_err(|_| EncodeError::Number(text))
}

fn finite_f64(value: f64, kind: &'static str) -> Result<Value, EncodeError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(EncodeError::NonFinite {
            path: JsonPath::root(),
            kind,
        })
}

// -----------------------------------------------------------------------------
// Encoder

/// Turns typed values into JSON for one [`ViewContext`].
///
/// Objects are encoded by their runtime type: a `Box<dyn Mask>` holding an
/// `Alternate` is written with the fields of `Alternate`.
///
/// # Example
///
/// ```
/// use mk_schema::{MappingOptions, Schema, SchemaRegistry, ViewContext, ser::Encoder};
///
/// #[derive(Schema, Default, Debug)]
/// struct Part {
///     #[schema(context(default, patch), always(patch))]
///     id: String,
///     #[schema(context(default, patch))]
///     title: String,
///     #[schema(change_set)]
///     changes: mk_schema::ChangeSet,
/// }
///
/// let registry = SchemaRegistry::new();
/// let options = MappingOptions::default();
/// let part = Part { id: "P1".into(), title: "Bracket".into(), ..Default::default() };
///
/// let patch = Encoder::new(&registry, ViewContext::Patch, &options);
/// assert_eq!(patch.encode_to_string(&part).unwrap(), r#"{"id":"P1"}"#);
/// ```
#[derive(Clone, Copy)]
pub struct Encoder<'a> {
    registry: &'a SchemaRegistry,
    context: ViewContext,
    options: &'a MappingOptions,
}

impl<'a> Encoder<'a> {
    #[inline]
    pub const fn new(
        registry: &'a SchemaRegistry,
        context: ViewContext,
        options: &'a MappingOptions,
    ) -> Self {
        Self {
            registry,
            context,
            options,
        }
    }

    #[inline]
    pub const fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    #[inline]
    pub const fn context(&self) -> ViewContext {
        self.context
    }

    #[inline]
    pub const fn options(&self) -> &'a MappingOptions {
        self.options
    }

    /// Encodes a top-level value. A value that encodes to `null` produces `{}`.
    pub fn encode<T: Wire>(&self, value: &T) -> Result<Value, EncodeError> {
        if value.is_null() {
            return Ok(Value::Object(Map::new()));
        }
        value.encode(self)
    }

    /// Encodes a top-level value to text, pretty-printed if the options say so.
    pub fn encode_to_string<T: Wire>(&self, value: &T) -> Result<String, EncodeError> {
        let value = self.encode(value)?;
        let text = if self.options.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    /// Encodes an object by its runtime type.
    ///
    /// Declared fields come first, in descriptor order, followed by the
    /// entries of the extension map. Extension entries never replace a
    /// declared property.
    pub fn encode_object(&self, object: &dyn Mapped) -> Result<Value, EncodeError> {
        let descriptor = self.registry.describe(object.schema_type())?;
        let target = object.as_any();
        let changes = descriptor.change_set(target);

        let mut output = Map::new();
        for field in descriptor.fields() {
            if !field.is_eligible(self.context, changes) {
                continue;
            }
            let wire_name = field.wire_name_for(self.context);

            let value = match descriptor.encode_hook(field.key()) {
                Some(named) => named
                    .hook
                    .value(target)
                    .and_then(|value| self.encode_dynamic(&value)),
                None => field.access().encode(target, self),
            }
            .map_err(|e| e.in_field(wire_name))?;

            if value.is_null() && field.omits_null() {
                continue;
            }
            let value = match field.proxy() {
                Some(proxy) if !value.is_null() => {
                    let mut envelope = Map::new();
                    envelope.insert(proxy.to_owned(), value);
                    Value::Object(envelope)
                }
                _ => value,
            };
            output.insert(wire_name.to_owned(), value);
        }

        if let Some(extensions) = descriptor.open_map(target) {
            // extension entries behave like fields declared for the default context only
            for (name, value) in extensions {
                if output.contains_key(name) {
                    continue;
                }
                let eligible = match self.context {
                    ViewContext::Default => true,
                    context if context.is_changed_only() => {
                        changes.is_some_and(|changes| changes.contains(name))
                    }
                    _ => false,
                };
                if !eligible {
                    continue;
                }
                let value = self.encode_dynamic(value).map_err(|e| e.in_field(name))?;
                output.insert(name.clone(), value);
            }
        }

        Ok(Value::Object(output))
    }

    /// Encodes a dynamic value by the runtime type it carries.
    pub fn encode_dynamic(&self, value: &Dynamic) -> Result<Value, EncodeError> {
        match value {
            Dynamic::Null => Ok(Value::Null),
            Dynamic::Primitive(primitive) => self.encode_primitive(primitive),
            Dynamic::Object(object) => self.encode_object(&**object),
            Dynamic::Map(map) => map.encode(self),
            Dynamic::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.encode_dynamic(item).map_err(|e| e.in_index(index)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    /// Encodes a scalar.
    ///
    /// `f32` values are widened through their shortest decimal form, so
    /// `0.1_f32` is written as `0.1`. Values outside the `i64`/`u64` range
    /// and decimals are written with their full precision.
    pub fn encode_primitive(&self, primitive: &Primitive) -> Result<Value, EncodeError> {
        Ok(match *primitive {
            Primitive::Bool(v) => Value::Bool(v),
            Primitive::I8(v) => Value::from(v),
            Primitive::I16(v) => Value::from(v),
            Primitive::I32(v) => Value::from(v),
            Primitive::I64(v) => Value::from(v),
            Primitive::U8(v) => Value::from(v),
            Primitive::U16(v) => Value::from(v),
            Primitive::U32(v) => Value::from(v),
            Primitive::U64(v) => Value::from(v),
            Primitive::I128(v) => number_from_text(v.to_string())?,
            Primitive::U128(v) => number_from_text(v.to_string())?,
            Primitive::F32(v) => {
                if !v.is_finite() {
                    return finite_f64(f64::NAN, "f32");
                }
                let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
                finite_f64(widened, "f32")?
            }
            Primitive::F64(v) => finite_f64(v, "f64")?,
            Primitive::Char(v) => Value::String(v.to_string()),
            Primitive::Decimal(ref v) => number_from_text(v.to_string())?,
            Primitive::String(ref v) => Value::String(v.clone()),
        })
    }
}
