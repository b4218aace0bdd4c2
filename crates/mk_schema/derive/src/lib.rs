//! Derive support for `mk_schema`.
//!
//! See [`Schema`].
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static SCHEMA_ATTRIBUTE_NAME: &str = "schema";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod path;
mod schema_impl;

// -----------------------------------------------------------------------------
// Macros

/// # Schema Derivation
///
/// `#[derive(Schema)]` implements `mk_schema::Schema` for a struct with named
/// fields. Every field is declared under its Rust name, which is also its
/// property name unless renamed. The type must implement `Default` and
/// `Debug`, and every declared field type must implement `Wire`.
///
/// ## Type attributes
///
/// - `name = "Part"`: the schema name, defaults to the struct name.
/// - `rename_all = "camelCase"`: property naming for all fields. Also
///   accepts `"PascalCase"`, `"snake_case"` and `"lowercase"`.
/// - `auto_register`: submit the type for `SchemaRegistry::auto_register`.
///   Ignored for generic types.
/// - `customize`: after the generated declarations, call
///   `Self::customize(descriptor)`, an associated function the user writes
///   to add overrides.
///
/// ## Field attributes
///
/// - `rename = "qty"`: the property name.
/// - `context(default, create, patch)`: contexts the field appears in. A
///   field without contexts appears in `default` only.
/// - `always(patch)`: appear in a changed-only context even when unchanged.
/// - `patch_name = "..."`, `create_name = "..."`: property name used when
///   encoding for that context.
/// - `omit_null`: skip the property when it encodes to `null`.
/// - `proxy = "items"`: nest the collection inside `{"items": [...]}`.
/// - `flatten`: inherit every declaration of a nested schema type.
/// - `extensions`: capture unknown properties into this `OpenMap`.
/// - `change_set`: the `ChangeSet` consulted by changed-only contexts.
/// - `skip`: not mapped.
///
/// ## Example
///
/// ```rust, ignore
/// #[derive(Schema, Default, Debug)]
/// #[schema(rename_all = "camelCase", auto_register)]
/// struct Part {
///     #[schema(context(default, patch), always(patch))]
///     id: String,
///     #[schema(rename = "qty")]
///     quantity: i16,
///     part_number: Option<String>,
///     #[schema(extensions)]
///     extra: OpenMap,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    schema_impl::expand(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
