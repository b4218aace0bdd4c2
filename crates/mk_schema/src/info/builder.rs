use core::any::type_name;
use core::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::de::Decoder;
use crate::error::{ConfigurationError, DecodeError};
use crate::info::access::{
    DecodeHook, DecodeHookFn, DirectField, EncodeHook, EncodeHookFn, FieldAccess, FieldLens, Lens,
    Projected,
};
use crate::info::descriptor::NamedHook;
use crate::info::field::normalize;
use crate::info::{FieldDescriptor, Schema, TypeDescriptor, ViewContext};
use crate::value::{ChangeSet, Dynamic, OpenMap};
use crate::wire::Wire;

// -----------------------------------------------------------------------------
// FieldConfig

/// Chained configuration of a field declared with [`DescriptorBuilder::field`].
pub struct FieldConfig<'a> {
    field: &'a mut FieldDescriptor,
}

impl FieldConfig<'_> {
    /// Uses `wire_name` as the property name instead of the logical name.
    pub fn rename(self, wire_name: &'static str) -> Self {
        self.field.set_wire_name(wire_name);
        self
    }

    /// Lets the field appear in `context`.
    pub fn context(self, context: ViewContext) -> Self {
        self.field.add_context(context);
        self
    }

    /// Lets the field appear in `context` even when it is unchanged.
    ///
    /// Contexts declared with [`context`](Self::context) are unaffected, so a
    /// field without any still appears in [`ViewContext::Default`].
    pub fn always(self, context: ViewContext) -> Self {
        self.field.add_always(context);
        self
    }

    /// Emits the field as `wire_name` under `context`, which it then also
    /// appears in.
    ///
    /// Decoding still accepts only the primary wire name.
    pub fn context_name(self, context: ViewContext, wire_name: &'static str) -> Self {
        self.field.set_context_name(context, wire_name);
        self
    }

    /// Skips the property when the value encodes to `null`.
    pub fn omit_null(self) -> Self {
        self.field.set_omit_null();
        self
    }

    /// Nests the collection inside an envelope, as in `{"items": [...]}`.
    pub fn proxy(self, property: &'static str) -> Self {
        self.field.set_proxy(property);
        self
    }
}

// -----------------------------------------------------------------------------
// DescriptorBuilder

#[derive(Default)]
struct Parts {
    fields: Vec<FieldDescriptor>,
    decode_hooks: Vec<NamedHook<dyn DecodeHook>>,
    encode_hooks: Vec<NamedHook<dyn EncodeHook>>,
    open_maps: Vec<Arc<dyn Lens<OpenMap>>>,
    change_sets: Vec<Arc<dyn Lens<ChangeSet>>>,
}

/// Collects the declarations of a [`Schema`] type.
///
/// Declarations made directly on the builder belong to the type itself.
/// Declarations pulled in with [`flatten`](Self::flatten) are inherited:
/// a direct declaration with the same wire name replaces the inherited one
/// but keeps its position. Duplicates among direct declarations are
/// reported by [`TypeDescriptor::of`] as a [`ConfigurationError`].
pub struct DescriptorBuilder<T: Schema> {
    inherited: Parts,
    own: Parts,
    errors: Vec<ConfigurationError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Schema> DescriptorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            inherited: Parts::default(),
            own: Parts::default(),
            errors: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a field under its logical `name`.
    pub fn field<F: Wire>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> FieldConfig<'_> {
        let access: Arc<dyn FieldAccess> = Arc::new(DirectField { get, get_mut });
        let index = self.own.fields.len();
        self.own
            .fields
            .push(FieldDescriptor::new(name, type_name::<F>(), access));
        FieldConfig {
            field: &mut self.own.fields[index],
        }
    }

    /// Inherits every declaration of the component `B`.
    ///
    /// The component's properties appear at the same level as the fields of
    /// `T`, so `{"id": .., "revision": ..}` can fill both a base part and
    /// the type extending it.
    pub fn flatten<B: Schema>(
        &mut self,
        get: fn(&T) -> &B,
        get_mut: fn(&mut T) -> &mut B,
    ) -> &mut Self {
        let base = match TypeDescriptor::of::<B>() {
            Ok(base) => base,
            Err(err) => {
                self.errors.push(err);
                return self;
            }
        };

        for field in base.fields.into_values() {
            let access: Arc<dyn FieldAccess> = Arc::new(Projected::<T, B, dyn FieldAccess>::new(
                get,
                get_mut,
                field.access_arc(),
            ));
            self.inherited.fields.push(field.with_access(access));
        }
        for named in base.decode_hooks.into_values() {
            let hook: Arc<dyn DecodeHook> = Arc::new(Projected::<T, B, dyn DecodeHook>::new(
                get,
                get_mut,
                named.hook,
            ));
            self.inherited.decode_hooks.push(NamedHook {
                wire_name: named.wire_name,
                hook,
            });
        }
        for named in base.encode_hooks.into_values() {
            let hook: Arc<dyn EncodeHook> = Arc::new(Projected::<T, B, dyn EncodeHook>::new(
                get,
                get_mut,
                named.hook,
            ));
            self.inherited.encode_hooks.push(NamedHook {
                wire_name: named.wire_name,
                hook,
            });
        }
        if let Some(inner) = base.open_map {
            let lens: Arc<dyn Lens<OpenMap>> = Arc::new(
                Projected::<T, B, dyn Lens<OpenMap>>::new(get, get_mut, inner),
            );
            self.inherited.open_maps.push(lens);
        }
        if let Some(inner) = base.change_set {
            let lens: Arc<dyn Lens<ChangeSet>> = Arc::new(
                Projected::<T, B, dyn Lens<ChangeSet>>::new(get, get_mut, inner),
            );
            self.inherited.change_sets.push(lens);
        }
        self
    }

    /// Replaces field decoding for `wire_name` with `func`.
    ///
    /// The property does not need to be a declared field, which allows one
    /// property to populate several fields.
    pub fn decode_override<F>(&mut self, wire_name: &'static str, func: F) -> &mut Self
    where
        F: Fn(&mut T, &Value, &Decoder<'_>) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        let hook: Arc<dyn DecodeHook> = Arc::new(DecodeHookFn::<T, F>::new(func));
        self.own.decode_hooks.push(NamedHook { wire_name, hook });
        self
    }

    /// Replaces the encoded value of the declared field `wire_name`.
    ///
    /// The returned value is encoded by its runtime type.
    pub fn encode_override<F>(&mut self, wire_name: &'static str, func: F) -> &mut Self
    where
        F: Fn(&T) -> Dynamic + Send + Sync + 'static,
    {
        let hook: Arc<dyn EncodeHook> = Arc::new(EncodeHookFn::<T, F>::new(func));
        self.own.encode_hooks.push(NamedHook { wire_name, hook });
        self
    }

    /// Captures properties without a declared field into an [`OpenMap`].
    pub fn extensions(
        &mut self,
        get: fn(&T) -> &OpenMap,
        get_mut: fn(&mut T) -> &mut OpenMap,
    ) -> &mut Self {
        let lens: Arc<dyn Lens<OpenMap>> = Arc::new(FieldLens {
            get,
            get_mut: Some(get_mut),
        });
        self.own.open_maps.push(lens);
        self
    }

    /// Names the [`ChangeSet`] consulted by changed-only contexts.
    pub fn change_set(&mut self, get: fn(&T) -> &ChangeSet) -> &mut Self {
        let lens: Arc<dyn Lens<ChangeSet>> = Arc::new(FieldLens { get, get_mut: None });
        self.own.change_sets.push(lens);
        self
    }

    pub(crate) fn build(self) -> Result<TypeDescriptor, ConfigurationError> {
        let Self {
            inherited,
            own,
            mut errors,
            ..
        } = self;
        if !errors.is_empty() {
            return Err(errors.swap_remove(0));
        }

        let mut descriptor = TypeDescriptor::empty::<T>(T::NAME);

        for field in inherited.fields {
            descriptor.fields.insert(field.key().to_owned(), field);
        }
        let mut declared: IndexMap<String, ()> = IndexMap::new();
        for field in own.fields {
            if declared.insert(field.key().to_owned(), ()).is_some() {
                return Err(ConfigurationError::DuplicateField {
                    type_name: T::NAME,
                    wire_name: field.wire_name().to_owned(),
                });
            }
            descriptor.fields.insert(field.key().to_owned(), field);
        }

        descriptor.decode_hooks = merge_hooks::<T, _>(inherited.decode_hooks, own.decode_hooks, "decode")?;
        descriptor.encode_hooks = merge_hooks::<T, _>(inherited.encode_hooks, own.encode_hooks, "encode")?;

        if let Some(named) = descriptor
            .encode_hooks
            .iter()
            .find_map(|(key, named)| (!descriptor.fields.contains_key(key)).then_some(named))
        {
            return Err(ConfigurationError::OrphanEncodeOverride {
                type_name: T::NAME,
                wire_name: named.wire_name.to_owned(),
            });
        }
        if let Some(field) = descriptor
            .fields
            .values()
            .find(|field| field.proxy().is_some() && descriptor.decode_hooks.contains_key(field.key()))
        {
            return Err(ConfigurationError::ProxyWithOverride {
                type_name: T::NAME,
                wire_name: field.wire_name().to_owned(),
            });
        }

        descriptor.open_map = pick_one::<T, _>(inherited.open_maps, own.open_maps, "extension map")?;
        descriptor.change_set = pick_one::<T, _>(inherited.change_sets, own.change_sets, "change set")?;

        Ok(descriptor)
    }
}

fn merge_hooks<T: Schema, H: ?Sized>(
    inherited: Vec<NamedHook<H>>,
    own: Vec<NamedHook<H>>,
    direction: &'static str,
) -> Result<IndexMap<String, NamedHook<H>>, ConfigurationError> {
    let mut merged = IndexMap::new();
    for named in inherited {
        merged.insert(normalize(named.wire_name), named);
    }
    let mut declared: IndexMap<String, ()> = IndexMap::new();
    for named in own {
        let key = normalize(named.wire_name);
        if declared.insert(key.clone(), ()).is_some() {
            return Err(ConfigurationError::DuplicateOverride {
                type_name: T::NAME,
                wire_name: named.wire_name.to_owned(),
                direction,
            });
        }
        merged.insert(key, named);
    }
    Ok(merged)
}

fn pick_one<T: Schema, V: ?Sized>(
    inherited: Vec<Arc<V>>,
    mut own: Vec<Arc<V>>,
    what: &'static str,
) -> Result<Option<Arc<V>>, ConfigurationError> {
    if own.len() > 1 {
        return Err(ConfigurationError::ConflictingCapability {
            type_name: T::NAME,
            what,
        });
    }
    Ok(own.pop().or_else(|| inherited.into_iter().last()))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::error::ConfigurationError;
    use crate::info::{DescriptorBuilder, Schema, TypeDescriptor, ViewContext, ViewContexts};
    use crate::value::{Dynamic, OpenMap};

    #[derive(Default, Debug)]
    struct Base {
        id: String,
        note: Option<String>,
    }

    impl Schema for Base {
        const NAME: &'static str = "Base";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.field("id", |v| &v.id, |v| &mut v.id);
            d.field("note", |v| &v.note, |v| &mut v.note);
        }
    }

    #[derive(Default, Debug)]
    struct Derived {
        base: Base,
        note: i32,
        revision: Option<String>,
    }

    impl Schema for Derived {
        const NAME: &'static str = "Derived";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.flatten(|v| &v.base, |v| &mut v.base);
            d.field("revision", |v| &v.revision, |v| &mut v.revision)
                .context(ViewContext::Create);
            d.field("note", |v| &v.note, |v| &mut v.note);
        }
    }

    #[derive(Default, Debug)]
    struct Twice {
        a: i32,
        b: i32,
    }

    impl Schema for Twice {
        const NAME: &'static str = "Twice";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.field("a", |v| &v.a, |v| &mut v.a).rename("Value");
            d.field("b", |v| &v.b, |v| &mut v.b).rename("value");
        }
    }

    #[derive(Default, Debug)]
    struct Orphan {
        a: i32,
    }

    impl Schema for Orphan {
        const NAME: &'static str = "Orphan";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.field("a", |v| &v.a, |v| &mut v.a);
            d.encode_override("b", |v| Dynamic::from(v.a));
        }
    }

    #[derive(Default, Debug)]
    struct TwoMaps {
        a: OpenMap,
        b: OpenMap,
    }

    impl Schema for TwoMaps {
        const NAME: &'static str = "TwoMaps";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.extensions(|v| &v.a, |v| &mut v.a);
            d.extensions(|v| &v.b, |v| &mut v.b);
        }
    }

    #[derive(Default, Debug)]
    struct ProxyOverride {
        items: Vec<i32>,
    }

    impl Schema for ProxyOverride {
        const NAME: &'static str = "ProxyOverride";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.field("items", |v| &v.items, |v| &mut v.items).proxy("items");
            d.decode_override("items", |_, _, _| Ok(()));
        }
    }

    #[test]
    fn flattened_fields_come_first_and_can_be_replaced() {
        let descriptor = TypeDescriptor::of::<Derived>().unwrap();
        let names: Vec<_> = descriptor.fields().map(|f| f.wire_name()).collect();
        assert_eq!(names, ["id", "note", "revision"]);
        assert_eq!(descriptor.field("NOTE").unwrap().type_path(), "i32");
        assert_eq!(descriptor.field("revision").unwrap().contexts().bits(), 0b010);
    }

    #[derive(Default, Debug)]
    struct Keyed {
        id: String,
        title: String,
    }

    impl Schema for Keyed {
        const NAME: &'static str = "Keyed";

        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.field("id", |v| &v.id, |v| &mut v.id).always(ViewContext::Patch);
            d.field("title", |v| &v.title, |v| &mut v.title)
                .context_name(ViewContext::Create, "name");
        }
    }

    #[test]
    fn always_and_context_names_keep_the_default_context() {
        let descriptor = TypeDescriptor::of::<Keyed>().unwrap();

        let id = descriptor.field("id").unwrap();
        assert_eq!(id.contexts(), ViewContexts::DEFAULT);
        assert!(id.participates_in(ViewContext::Default));
        assert!(id.participates_in(ViewContext::Patch));
        assert!(!id.participates_in(ViewContext::Create));

        let title = descriptor.field("title").unwrap();
        assert!(title.participates_in(ViewContext::Default));
        assert!(title.participates_in(ViewContext::Create));
        assert!(!title.participates_in(ViewContext::Patch));
        assert_eq!(title.wire_name_for(ViewContext::Create), "name");
        assert_eq!(title.wire_name_for(ViewContext::Default), "title");
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        assert!(matches!(
            TypeDescriptor::of::<Twice>(),
            Err(ConfigurationError::DuplicateField { wire_name, .. }) if wire_name == "value"
        ));
        assert!(matches!(
            TypeDescriptor::of::<Orphan>(),
            Err(ConfigurationError::OrphanEncodeOverride { .. })
        ));
        assert!(matches!(
            TypeDescriptor::of::<TwoMaps>(),
            Err(ConfigurationError::ConflictingCapability { .. })
        ));
        assert!(matches!(
            TypeDescriptor::of::<ProxyOverride>(),
            Err(ConfigurationError::ProxyWithOverride { .. })
        ));
    }
}
