//! The schema registry: registered types, mask implementations,
//! discriminated catalogs and the descriptor cache.

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "auto_register")]
mod auto_register;
mod cache;
mod discriminator;
mod schema_registry;
mod type_map;

// -----------------------------------------------------------------------------
// Exports

#[cfg(feature = "auto_register")]
pub use auto_register::AutoRegistration;
pub use cache::DescriptorCache;
pub use discriminator::{Discriminator, Resolution};
pub use schema_registry::{SchemaRegistry, SchemaRegistryArc, TypeEntry, ValueType};
pub use type_map::TypeIdMap;

pub(crate) use discriminator::find_property;
pub(crate) use type_map::{HashMap, HashSet};
