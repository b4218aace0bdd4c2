use core::any::{Any, TypeId, type_name};
use core::fmt;

use crate::error::ConfigurationError;
use crate::info::{DescriptorBuilder, TypeDescriptor};

// -----------------------------------------------------------------------------
// Schema

/// A type whose wire shape is described by a [`TypeDescriptor`].
///
/// Usually derived with [`#[derive(Schema)]`](crate::derive::Schema). A manual
/// implementation declares its fields on the builder:
///
/// ```
/// use mk_schema::{Schema, info::DescriptorBuilder};
///
/// #[derive(Default, Debug)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Schema for Point {
///     const NAME: &'static str = "Point";
///
///     fn describe(descriptor: &mut DescriptorBuilder<Self>) {
///         descriptor.field("x", |p| &p.x, |p| &mut p.x);
///         descriptor.field("y", |p| &p.y, |p| &mut p.y);
///     }
/// }
///
/// let descriptor = mk_schema::info::TypeDescriptor::of::<Point>().unwrap();
/// assert_eq!(descriptor.len(), 2);
/// ```
///
/// `Default` provides the blank instance that decoding populates.
pub trait Schema: Default + fmt::Debug + Send + Sync + Sized + 'static {
    /// Short name used in diagnostics and name lookups.
    const NAME: &'static str;

    /// Declares fields, overrides and capabilities of this type.
    fn describe(descriptor: &mut DescriptorBuilder<Self>);
}

// -----------------------------------------------------------------------------
// Mapped

/// Object-safe view of a [`Schema`] value.
///
/// Implemented for every `Schema` type. Mask traits use it as a supertrait so
/// that `Box<dyn Mask>` can be decoded and encoded by runtime type.
pub trait Mapped: Any + fmt::Debug + Send + Sync {
    fn schema_type(&self) -> SchemaType;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Schema> Mapped for T {
    #[inline]
    fn schema_type(&self) -> SchemaType {
        SchemaType::of::<T>()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Mapped {
    #[inline]
    pub fn is<T: Schema>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Schema>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Schema>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Takes the value as a `T`, giving the box back on mismatch.
    pub fn downcast<T: Schema>(self: Box<Self>) -> Result<Box<T>, Box<dyn Mapped>> {
        if self.is::<T>() {
            // `is` checked above
            Ok(self.into_any().downcast::<T>().unwrap_or_else(|_| unreachable!()))
        } else {
            Err(self)
        }
    }
}

// -----------------------------------------------------------------------------
// SchemaType

/// Runtime handle of a [`Schema`] type.
///
/// Carries what the engine needs to build its descriptor and to create a
/// blank instance without knowing the static type.
#[derive(Clone, Copy)]
pub struct SchemaType {
    id: TypeId,
    name: &'static str,
    path: &'static str,
    describe: fn() -> Result<TypeDescriptor, ConfigurationError>,
    create: fn() -> Box<dyn Mapped>,
}

fn create_default<T: Schema>() -> Box<dyn Mapped> {
    Box::new(T::default())
}

impl SchemaType {
    #[inline]
    pub fn of<T: Schema>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            path: type_name::<T>(),
            describe: TypeDescriptor::of::<T>,
            create: create_default::<T>,
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The short name from [`Schema::NAME`].
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The full Rust type path.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Builds a fresh descriptor. Prefer the registry's cached
    /// [`describe`](crate::registry::SchemaRegistry::describe).
    #[inline]
    pub fn describe(&self) -> Result<TypeDescriptor, ConfigurationError> {
        (self.describe)()
    }

    /// Creates a default instance.
    #[inline]
    pub fn create(&self) -> Box<dyn Mapped> {
        (self.create)()
    }

    #[inline]
    pub const fn key(&self) -> TypeKey {
        TypeKey {
            id: self.id,
            name: self.path,
        }
    }
}

impl PartialEq for SchemaType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SchemaType {}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaType").field(&self.path).finish()
    }
}

// -----------------------------------------------------------------------------
// TypeKey

/// A requested target type for runtime-typed decoding.
///
/// Unlike [`SchemaType`], the key may name an unsized mask such as
/// `dyn PartMask`, which the registry resolves to a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}
