//! Type metadata: the [`Schema`] trait, view contexts and descriptors.
//!
//! A [`TypeDescriptor`] is the per-type answer to "which wire properties map
//! to which fields, in which contexts". It is built once from
//! [`Schema::describe`] and cached by the
//! [`SchemaRegistry`](crate::registry::SchemaRegistry).

// -----------------------------------------------------------------------------
// Modules

mod access;
mod builder;
mod context;
mod descriptor;
mod field;
mod schema;

// -----------------------------------------------------------------------------
// Exports

pub use builder::{DescriptorBuilder, FieldConfig};
pub use context::{ViewContext, ViewContexts};
pub use descriptor::TypeDescriptor;
pub use field::FieldDescriptor;
pub use schema::{Mapped, Schema, SchemaType, TypeKey};

pub(crate) use access::{DecodeHook, EncodeHook, FieldAccess};
pub(crate) use field::normalize;
