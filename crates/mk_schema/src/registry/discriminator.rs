use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::info::{Schema, SchemaType, normalize};

/// Text form of a scalar discriminator value. Objects, arrays and null have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Looks up `name` in `object`, preferring an exact match over a case-insensitive one.
///
/// Case folds the same way field names do.
pub(crate) fn find_property<'a>(
    object: &'a Map<String, Value>,
    name: &str,
    case_insensitive: bool,
) -> Option<&'a Value> {
    if let Some(value) = object.get(name) {
        return Some(value);
    }
    if !case_insensitive {
        return None;
    }
    let folded = normalize(name);
    object
        .iter()
        .find_map(|(key, value)| (normalize(key) == folded).then_some(value))
}

// -----------------------------------------------------------------------------
// Discriminator

/// Maps the values of one discriminator property to concrete types.
///
/// ```
/// # use mk_schema::{Schema, info::DescriptorBuilder, registry::Discriminator};
/// # #[derive(Default, Debug)] struct Alternate;
/// # impl Schema for Alternate {
/// #     const NAME: &'static str = "Alternate";
/// #     fn describe(_: &mut DescriptorBuilder<Self>) {}
/// # }
/// let by_type = Discriminator::new("type").variant::<Alternate>("Alternate");
///
/// assert_eq!(by_type.field(), "type");
/// assert_eq!(by_type.get("Alternate").unwrap().name(), "Alternate");
/// assert!(by_type.get("Unknown").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Discriminator {
    field: String,
    variants: IndexMap<String, SchemaType>,
    duplicates: Vec<String>,
}

impl Discriminator {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            variants: IndexMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Maps `value` to `T`.
    pub fn variant<T: Schema>(self, value: impl Into<String>) -> Self {
        self.variant_type(value, SchemaType::of::<T>())
    }

    /// Maps `value` to a runtime schema type.
    pub fn variant_type(mut self, value: impl Into<String>, ty: SchemaType) -> Self {
        let value = value.into();
        if self.variants.contains_key(&value) {
            self.duplicates.push(value);
        } else {
            self.variants.insert(value, ty);
        }
        self
    }

    /// The discriminator property name.
    #[inline]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[inline]
    pub fn get(&self, value: &str) -> Option<SchemaType> {
        self.variants.get(value).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SchemaType)> {
        self.variants.iter().map(|(value, ty)| (value.as_str(), *ty))
    }

    pub(crate) fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Adds the variants of `other`, returning the first value already mapped.
    pub(crate) fn merge(&mut self, other: Discriminator) -> Result<(), String> {
        if let Some(value) = other.variants.keys().find(|v| self.variants.contains_key(*v)) {
            return Err(value.clone());
        }
        self.variants.extend(other.variants);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Resolution

/// Outcome of consulting the discriminators of a base type.
///
/// Everything except [`Resolution::Matched`] means the base type itself is
/// used; the variants tell why, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The type has no discriminators.
    NotDiscriminated,
    /// None of the discriminator properties occur in the document.
    Absent,
    /// The first present discriminator holds an object, array or null.
    NotScalar { field: String },
    /// The first present discriminator holds a value that maps to nothing.
    Unmapped { field: String, value: String },
    /// The first present discriminator selects `ty`.
    Matched {
        field: String,
        value: String,
        ty: SchemaType,
    },
}

impl Resolution {
    #[inline]
    pub fn matched(&self) -> Option<SchemaType> {
        match self {
            Self::Matched { ty, .. } => Some(*ty),
            _ => None,
        }
    }
}

/// Resolves against an ordered list of discriminators.
///
/// Only the first discriminator whose property is present is consulted.
pub(crate) fn resolve(
    discriminators: &[Discriminator],
    object: &Map<String, Value>,
    case_insensitive: bool,
) -> Resolution {
    for discriminator in discriminators {
        let Some(raw) = find_property(object, discriminator.field(), case_insensitive) else {
            continue;
        };
        let field = discriminator.field().to_owned();
        let Some(value) = scalar_text(raw) else {
            return Resolution::NotScalar { field };
        };
        return match discriminator.get(&value) {
            Some(ty) => Resolution::Matched { field, value, ty },
            None => Resolution::Unmapped { field, value },
        };
    }
    Resolution::Absent
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::find_property;

    #[test]
    fn property_lookup_folds_like_field_names() {
        let serde_json::Value::Object(object) = json!({"GRÖSSE": 1, "Ärmel": 2, "size": 3, "SIZE": 4})
        else {
            unreachable!()
        };

        assert_eq!(find_property(&object, "SIZE", true), Some(&json!(4)));
        assert_eq!(find_property(&object, "Size", true), Some(&json!(3)));
        assert_eq!(find_property(&object, "ärmel", true), Some(&json!(2)));
        assert_eq!(find_property(&object, "grösse", true), Some(&json!(1)));
        assert_eq!(find_property(&object, "ärmel", false), None);
    }
}
