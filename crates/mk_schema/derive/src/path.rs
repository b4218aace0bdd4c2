//! Paths into `mk_schema` used by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the correct access path to the `mk_schema` crate.
///
/// 1. For crates that depend on `mk_schema`, `::mk_schema` is returned.
/// 2. For crates that depend on `mk_core`, `::mk_core::schema` is returned.
/// 3. For other situations, `::mk_schema` is returned, but this may be incorrect.
///
/// Reading the manifest is relatively expensive, so the path is obtained once
/// per derive and passed around.
pub(crate) fn mk_schema() -> syn::Path {
    mk_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("mk_schema"))
}

#[inline(always)]
pub(crate) fn descriptor_builder_(mk_schema_path: &syn::Path) -> TokenStream {
    quote! {
        #mk_schema_path::info::DescriptorBuilder
    }
}

#[inline(always)]
pub(crate) fn view_context_(mk_schema_path: &syn::Path) -> TokenStream {
    quote! {
        #mk_schema_path::info::ViewContext
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn macro_exports_(mk_schema_path: &syn::Path) -> TokenStream {
    quote! {
        #mk_schema_path::__macro_exports
    }
}
