use core::any::{Any, TypeId, type_name};
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

use crate::de::Decoder;
use crate::error::{ConfigurationError, DecodeError, JsonPath};
use crate::info::{Mapped, Schema, SchemaType, TypeDescriptor, TypeKey};
use crate::registry::discriminator::{self, Discriminator, Resolution};
use crate::registry::{DescriptorCache, HashMap, HashSet, TypeIdMap};
use crate::value::Dynamic;
use crate::wire::Wire;

// -----------------------------------------------------------------------------
// TypeEntry

fn decode_value<T: Wire + Into<Dynamic>>(
    value: &Value,
    decoder: &Decoder<'_>,
) -> Result<Dynamic, DecodeError> {
    T::decode(value, decoder).map(Into::into)
}

fn short_name(path: &'static str) -> &'static str {
    path.rsplit("::").next().unwrap_or(path)
}

/// A scalar type the runtime-typed API can decode into.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    path: &'static str,
    decode: fn(&Value, &Decoder<'_>) -> Result<Dynamic, DecodeError>,
}

impl ValueType {
    pub fn of<T: Wire + Into<Dynamic>>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
            decode: decode_value::<T>,
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        short_name(self.path)
    }

    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    #[inline]
    pub fn decode(&self, value: &Value, decoder: &Decoder<'_>) -> Result<Dynamic, DecodeError> {
        (self.decode)(value, decoder)
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.path).finish()
    }
}

/// A registered type.
#[derive(Debug, Clone, Copy)]
pub enum TypeEntry {
    Object(SchemaType),
    Value(ValueType),
}

impl TypeEntry {
    #[inline]
    pub fn id(&self) -> TypeId {
        match self {
            Self::Object(ty) => ty.id(),
            Self::Value(ty) => ty.id(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Object(ty) => ty.name(),
            Self::Value(ty) => ty.name(),
        }
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Object(ty) => ty.path(),
            Self::Value(ty) => ty.path(),
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<SchemaType> {
        match self {
            Self::Object(ty) => Some(*ty),
            Self::Value(_) => None,
        }
    }
}

// -----------------------------------------------------------------------------
// SchemaRegistry

type Caster<I> = Arc<dyn Fn(Box<dyn Mapped>) -> Result<Box<I>, Box<dyn Mapped>> + Send + Sync>;

fn caster<I: ?Sized + 'static, C: Schema>(cast: fn(Box<C>) -> Box<I>) -> Caster<I> {
    Arc::new(move |object: Box<dyn Mapped>| object.downcast::<C>().map(cast))
}

/// The catalog of mapped types.
///
/// Besides the types themselves the registry records, per requested type:
///
/// - the default concrete implementation of a mask,
/// - how a concrete value is cast into a mask (`Box<C>` into `Box<dyn M>`),
/// - the discriminators selecting a subtype from a document property.
///
/// It also owns the [`DescriptorCache`]. Registration happens through
/// `&mut self`, usually during startup; decoding and encoding only need
/// `&self`. Share a finished registry through [`SchemaRegistryArc`] or a
/// [`Mapper`](crate::Mapper).
///
/// # Example
///
/// ```
/// use mk_schema::{Mapped, Schema, impl_mask, info::DescriptorBuilder};
/// use mk_schema::registry::{Discriminator, SchemaRegistry};
///
/// trait Shape: Mapped {}
/// impl_mask!(Shape);
///
/// #[derive(Default, Debug)]
/// struct Circle { r: f64 }
/// impl Shape for Circle {}
/// impl Schema for Circle {
///     const NAME: &'static str = "Circle";
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.field("r", |v| &v.r, |v| &mut v.r);
///     }
/// }
///
/// let mut registry = SchemaRegistry::new();
/// registry.register_default::<dyn Shape, Circle>(|c| c);
/// registry
///     .register_discriminated::<dyn Shape>(Discriminator::new("kind").variant::<Circle>("circle"))
///     .unwrap();
///
/// let ty = registry.resolve_default(mk_schema::TypeKey::of::<dyn Shape>()).unwrap();
/// assert_eq!(ty.name(), "Circle");
/// ```
pub struct SchemaRegistry {
    types: TypeIdMap<TypeEntry>,
    path_to_id: HashMap<&'static str, TypeId>,
    name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
    defaults: TypeIdMap<SchemaType>,
    casts: HashMap<(TypeId, TypeId), Box<dyn Any + Send + Sync>>,
    discriminated: TypeIdMap<Vec<Discriminator>>,
    descriptors: DescriptorCache,
}

impl Default for SchemaRegistry {
    /// See [`SchemaRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.types.len())
            .field("defaults", &self.defaults.len())
            .field("discriminated", &self.discriminated.len())
            .field("descriptors", &self.descriptors.len())
            .finish_non_exhaustive()
    }
}

impl SchemaRegistry {
    /// Creates a registry without any registrations.
    pub fn empty() -> Self {
        Self {
            types: TypeIdMap::new(),
            path_to_id: HashMap::default(),
            name_to_id: HashMap::default(),
            ambiguous_names: HashSet::default(),
            defaults: TypeIdMap::new(),
            casts: HashMap::default(),
            discriminated: TypeIdMap::new(),
            descriptors: DescriptorCache::new(),
        }
    }

    /// Creates a registry with the scalar types registered as values.
    ///
    /// - `bool` `char` `String`
    /// - `i8 - i128` `u8 - u128`
    /// - `f32` `f64` `BigDecimal`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_value::<bool>();
        registry.register_value::<char>();
        registry.register_value::<i8>();
        registry.register_value::<i16>();
        registry.register_value::<i32>();
        registry.register_value::<i64>();
        registry.register_value::<i128>();
        registry.register_value::<u8>();
        registry.register_value::<u16>();
        registry.register_value::<u32>();
        registry.register_value::<u64>();
        registry.register_value::<u128>();
        registry.register_value::<f32>();
        registry.register_value::<f64>();
        registry.register_value::<BigDecimal>();
        registry.register_value::<String>();
        registry
    }

    fn add_indices(&mut self, entry: &TypeEntry) {
        let name = entry.name();
        if !self.ambiguous_names.contains(name) {
            if self.name_to_id.contains_key(name) {
                self.name_to_id.remove(name);
                self.ambiguous_names.insert(name);
            } else {
                self.name_to_id.insert(name, entry.id());
            }
        }
        self.path_to_id.insert(entry.path(), entry.id());
    }

    fn insert_entry(&mut self, entry: TypeEntry) -> bool {
        if self.types.contains(&entry.id()) {
            return false;
        }
        self.add_indices(&entry);
        self.types.insert(entry.id(), entry);
        true
    }

    fn insert_cast<I: ?Sized + 'static, C: Schema>(&mut self, cast: fn(Box<C>) -> Box<I>) {
        self.casts.insert(
            (TypeId::of::<I>(), TypeId::of::<C>()),
            Box::new(caster::<I, C>(cast)),
        );
    }

    /// Registers a schema type. Returns `false` if it was already registered.
    pub fn register<T: Schema>(&mut self) -> bool {
        self.register_type(SchemaType::of::<T>())
    }

    /// Registers a schema type known only at runtime.
    pub fn register_type(&mut self, ty: SchemaType) -> bool {
        if !self.insert_entry(TypeEntry::Object(ty)) {
            return false;
        }
        log::debug!("registered schema type `{}`", ty.path());
        true
    }

    /// Registers a scalar type for runtime-typed decoding.
    pub fn register_value<T: Wire + Into<Dynamic>>(&mut self) -> bool {
        self.insert_entry(TypeEntry::Value(ValueType::of::<T>()))
    }

    /// Declares `C` as an implementation of the mask `I`.
    ///
    /// `cast` converts the concrete box into the mask box; for a trait
    /// object `dyn M` this is just `|c| c`.
    pub fn implement<I: ?Sized + 'static, C: Schema>(
        &mut self,
        cast: fn(Box<C>) -> Box<I>,
    ) -> &mut Self {
        self.register::<C>();
        self.insert_cast::<I, C>(cast);
        self
    }

    /// Declares `C` as the type created when `I` is requested and no
    /// discriminator selects something else.
    ///
    /// A later registration for the same `I` replaces the earlier one.
    pub fn register_default<I: ?Sized + 'static, C: Schema>(
        &mut self,
        cast: fn(Box<C>) -> Box<I>,
    ) -> &mut Self {
        self.implement::<I, C>(cast);
        if let Some(previous) = self
            .defaults
            .insert(TypeId::of::<I>(), SchemaType::of::<C>())
        {
            log::debug!(
                "default implementation of `{}` changed from `{}` to `{}`",
                type_name::<I>(),
                previous.name(),
                C::NAME
            );
        }
        self
    }

    /// Adds a discriminator to the base type `B`.
    ///
    /// Discriminators are consulted in registration order. Registering the
    /// same property twice merges the value maps. Variant types are
    /// registered as a side effect; casting them into a mask still needs
    /// [`implement`](Self::implement).
    pub fn register_discriminated<B: ?Sized + 'static>(
        &mut self,
        discriminator: Discriminator,
    ) -> Result<(), ConfigurationError> {
        let base = type_name::<B>();
        if discriminator.is_empty() {
            return Err(ConfigurationError::EmptyDiscriminator {
                base,
                field: discriminator.field().to_owned(),
            });
        }
        if let Some(value) = discriminator.duplicates().first() {
            return Err(ConfigurationError::DuplicateDiscriminatorValue {
                base,
                field: discriminator.field().to_owned(),
                value: value.clone(),
            });
        }

        for (_, ty) in discriminator.iter() {
            self.register_type(ty);
        }

        let entries = self
            .discriminated
            .get_or_insert(TypeId::of::<B>(), Vec::new);
        match entries
            .iter_mut()
            .find(|entry| entry.field() == discriminator.field())
        {
            Some(existing) => {
                let field = discriminator.field().to_owned();
                existing.merge(discriminator).map_err(|value| {
                    ConfigurationError::DuplicateDiscriminatorValue { base, field, value }
                })?;
            }
            None => {
                log::debug!(
                    "discriminator `{}` registered for `{base}` with {} values",
                    discriminator.field(),
                    discriminator.len()
                );
                entries.push(discriminator);
            }
        }
        Ok(())
    }

    /// Returns the discriminators of `base` in consultation order.
    pub fn discriminators(&self, base: TypeId) -> &[Discriminator] {
        self.discriminated.get(&base).map_or(&[], Vec::as_slice)
    }

    // -------------------------------------------------------------------------
    // Resolution

    /// Returns the concrete type created when `requested` is asked for
    /// without a document.
    pub fn resolve_default(&self, requested: TypeKey) -> Result<SchemaType, DecodeError> {
        if let Some(TypeEntry::Object(ty)) = self.types.get(&requested.id()) {
            return Ok(*ty);
        }
        self.defaults
            .get(&requested.id())
            .copied()
            .ok_or(DecodeError::NoImplementation {
                path: JsonPath::root(),
                type_name: requested.name(),
            })
    }

    /// Returns the subtype selected by `document`, or `base` itself.
    ///
    /// With `case_insensitive` set, the discriminator property may differ in
    /// case from its declared name; values always match exactly.
    pub fn resolve_discriminated(
        &self,
        base: TypeId,
        document: &Map<String, Value>,
        case_insensitive: bool,
    ) -> TypeId {
        self.resolve_discriminated_detailed(base, document, case_insensitive)
            .matched()
            .map_or(base, |ty| ty.id())
    }

    /// Like [`resolve_discriminated`](Self::resolve_discriminated), but tells
    /// why no subtype was selected.
    pub fn resolve_discriminated_detailed(
        &self,
        base: TypeId,
        document: &Map<String, Value>,
        case_insensitive: bool,
    ) -> Resolution {
        match self.discriminated.get(&base) {
            Some(entries) => discriminator::resolve(entries, document, case_insensitive),
            None => Resolution::NotDiscriminated,
        }
    }

    /// Picks the concrete type to create for `requested` given `document`.
    ///
    /// A matching discriminator wins. Otherwise a registered schema type is
    /// used as is, and a mask falls back to its default implementation,
    /// whose own discriminators are consulted in turn.
    pub fn resolve(
        &self,
        requested: TypeKey,
        document: &Map<String, Value>,
        case_insensitive: bool,
    ) -> Result<SchemaType, DecodeError> {
        let resolution =
            self.resolve_discriminated_detailed(requested.id(), document, case_insensitive);
        if let Some(ty) = resolution.matched() {
            return Ok(ty);
        }
        log_fallback(requested, &resolution);

        if let Some(TypeEntry::Object(ty)) = self.types.get(&requested.id()) {
            return Ok(*ty);
        }
        let default = self.resolve_default(requested)?;
        let nested = self.resolve_discriminated_detailed(default.id(), document, case_insensitive);
        if nested.matched().is_none() {
            log_fallback(default.key(), &nested);
        }
        Ok(nested.matched().unwrap_or(default))
    }

    /// Converts a decoded object into the mask `I`.
    pub fn cast<I: ?Sized + 'static>(&self, object: Box<dyn Mapped>) -> Result<Box<I>, DecodeError> {
        let concrete = object.schema_type();
        let not_implemented = || DecodeError::NotImplemented {
            path: JsonPath::root(),
            mask: type_name::<I>(),
            concrete: concrete.name(),
        };
        let caster = self
            .casts
            .get(&(TypeId::of::<I>(), concrete.id()))
            .and_then(|caster| caster.downcast_ref::<Caster<I>>())
            .ok_or_else(not_implemented)?;
        caster(object).map_err(|_| not_implemented())
    }

    /// Returns `true` if `concrete` can be cast into the mask `I`.
    pub fn implements<I: ?Sized + 'static>(&self, concrete: TypeId) -> bool {
        self.casts.contains_key(&(TypeId::of::<I>(), concrete))
    }

    // -------------------------------------------------------------------------
    // Descriptors

    /// Returns the cached descriptor of `ty`.
    #[inline]
    pub fn describe(&self, ty: SchemaType) -> Result<Arc<TypeDescriptor>, ConfigurationError> {
        self.descriptors.describe(ty)
    }

    #[inline]
    pub fn describe_of<T: Schema>(&self) -> Result<Arc<TypeDescriptor>, ConfigurationError> {
        self.describe(SchemaType::of::<T>())
    }

    #[inline]
    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    /// Drops all cached descriptors, e.g. between tests.
    pub fn clear_descriptors(&self) {
        self.descriptors.clear();
    }

    // -------------------------------------------------------------------------
    // Lookup

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.types.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeEntry> {
        self.types.get(&type_id)
    }

    /// Looks up a type by its full Rust path.
    pub fn get_with_path(&self, path: &str) -> Option<&TypeEntry> {
        self.path_to_id.get(path).and_then(|id| self.types.get(id))
    }

    /// Looks up a type by short name. Names shared by several types resolve
    /// to nothing; see [`is_ambiguous`](Self::is_ambiguous).
    pub fn get_with_name(&self, name: &str) -> Option<&TypeEntry> {
        self.name_to_id.get(name).and_then(|id| self.types.get(id))
    }

    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    /// Registers every type annotated with `#[schema(auto_register)]`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled, in which
    /// case nothing is registered.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            let count = crate::registry::auto_register::register_all(self);
            log::debug!("auto registration visited {count} types");
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

fn log_fallback(requested: TypeKey, resolution: &Resolution) {
    match resolution {
        Resolution::Unmapped { field, value } => log::trace!(
            "discriminator `{field}` = `{value}` selects no subtype of `{}`",
            requested.name()
        ),
        Resolution::NotScalar { field } => log::trace!(
            "discriminator `{field}` of `{}` is not a scalar",
            requested.name()
        ),
        _ => {}
    }
}

// -----------------------------------------------------------------------------
// SchemaRegistryArc

/// A shared, lockable [`SchemaRegistry`].
#[derive(Clone, Default)]
pub struct SchemaRegistryArc {
    internal: Arc<RwLock<SchemaRegistry>>,
}

impl fmt::Debug for SchemaRegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.read(), f)
    }
}

impl From<SchemaRegistry> for SchemaRegistryArc {
    fn from(registry: SchemaRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }
}

impl SchemaRegistryArc {
    /// Takes a read lock on the underlying registry.
    pub fn read(&self) -> RwLockReadGuard<'_, SchemaRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying registry.
    pub fn write(&self) -> RwLockWriteGuard<'_, SchemaRegistry> {
        self.internal.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// Tests
