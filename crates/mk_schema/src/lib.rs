#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names this crate `mk_schema`; inside the crate itself that
// name must resolve as well.
extern crate self as mk_schema;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod macros;
mod mapper;
mod options;

pub mod de;
pub mod info;
pub mod registry;
pub mod ser;
pub mod value;
pub mod wire;

#[cfg(test)]
mod fixtures;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports {
    pub use serde_json::Value;

    #[cfg(feature = "auto_register")]
    pub use crate::registry::AutoRegistration;
    #[cfg(feature = "auto_register")]
    pub use inventory;
}

pub use mk_schema_derive as derive;
pub use mk_schema_derive::Schema;

pub use error::{ConfigurationError, DecodeError, EncodeError, JsonPath, kind_of};
pub use info::{Mapped, Schema, SchemaType, TypeKey, ViewContext, ViewContexts};
pub use mapper::Mapper;
pub use options::MappingOptions;
pub use registry::{Discriminator, Resolution, SchemaRegistry, SchemaRegistryArc};
pub use value::{ChangeSet, Dynamic, OpenMap, Primitive};
pub use wire::Wire;
