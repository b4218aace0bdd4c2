use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigurationError;
use crate::info::access::{DecodeHook, EncodeHook, Lens};
use crate::info::field::normalize;
use crate::info::{DescriptorBuilder, FieldDescriptor, Schema};
use crate::value::{ChangeSet, OpenMap};

// -----------------------------------------------------------------------------
// TypeDescriptor

pub(crate) struct NamedHook<H: ?Sized> {
    pub wire_name: &'static str,
    pub hook: Arc<H>,
}

/// The resolved wire layout of a [`Schema`] type.
///
/// Fields are keyed by normalized wire name and keep declaration order, with
/// flattened components first. Descriptors are immutable once built and are
/// shared through the registry's cache.
pub struct TypeDescriptor {
    pub(crate) name: &'static str,
    pub(crate) path: &'static str,
    pub(crate) fields: IndexMap<String, FieldDescriptor>,
    pub(crate) decode_hooks: IndexMap<String, NamedHook<dyn DecodeHook>>,
    pub(crate) encode_hooks: IndexMap<String, NamedHook<dyn EncodeHook>>,
    pub(crate) open_map: Option<Arc<dyn Lens<OpenMap>>>,
    pub(crate) change_set: Option<Arc<dyn Lens<ChangeSet>>>,
}

impl TypeDescriptor {
    /// Builds the descriptor of `T` from its [`Schema::describe`].
    pub fn of<T: Schema>() -> Result<Self, ConfigurationError> {
        let mut builder = DescriptorBuilder::<T>::new();
        T::describe(&mut builder);
        builder.build()
    }

    /// Short type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Full Rust type path.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in emission order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Looks up a field by wire name, ignoring case.
    pub fn field(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(&normalize(wire_name))
    }

    pub(crate) fn field_by_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.get(key)
    }

    pub fn has_decode_override(&self, wire_name: &str) -> bool {
        self.decode_hooks.contains_key(&normalize(wire_name))
    }

    pub fn has_encode_override(&self, wire_name: &str) -> bool {
        self.encode_hooks.contains_key(&normalize(wire_name))
    }

    /// Returns `true` if unmapped properties are captured instead of dropped.
    #[inline]
    pub fn has_open_map(&self) -> bool {
        self.open_map.is_some()
    }

    #[inline]
    pub fn has_change_set(&self) -> bool {
        self.change_set.is_some()
    }

    pub(crate) fn decode_hook(&self, key: &str) -> Option<&NamedHook<dyn DecodeHook>> {
        self.decode_hooks.get(key)
    }

    pub(crate) fn encode_hook(&self, key: &str) -> Option<&NamedHook<dyn EncodeHook>> {
        self.encode_hooks.get(key)
    }

    pub(crate) fn open_map<'a>(&self, target: &'a dyn Any) -> Option<&'a OpenMap> {
        self.open_map.as_ref()?.get(target)
    }

    pub(crate) fn open_map_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut OpenMap> {
        self.open_map.as_ref()?.get_mut(target)
    }

    pub(crate) fn change_set<'a>(&self, target: &'a dyn Any) -> Option<&'a ChangeSet> {
        self.change_set.as_ref()?.get(target)
    }

    pub(crate) fn empty<T>(name: &'static str) -> Self {
        Self {
            name,
            path: type_name::<T>(),
            fields: IndexMap::new(),
            decode_hooks: IndexMap::new(),
            encode_hooks: IndexMap::new(),
            open_map: None,
            change_set: None,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields.values().collect::<Vec<_>>())
            .field("decode_overrides", &self.decode_hooks.keys().collect::<Vec<_>>())
            .field("encode_overrides", &self.encode_hooks.keys().collect::<Vec<_>>())
            .field("open_map", &self.open_map.is_some())
            .field("change_set", &self.change_set.is_some())
            .finish()
    }
}
