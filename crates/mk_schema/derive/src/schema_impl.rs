use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, LitStr};

use crate::attributes::{FieldAttributes, FieldRole, TypeAttributes};
use crate::path;

const UNSUPPORTED: &str = "`Schema` can only be derived for structs with named fields";

/// Expand `#[derive(Schema)]`.
pub(crate) fn expand(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let fields: Vec<&Field> = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => return Err(syn::Error::new(data.fields.span(), UNSUPPORTED)),
        },
        _ => return Err(syn::Error::new(ast.ident.span(), UNSUPPORTED)),
    };

    let type_attrs = TypeAttributes::parse(&ast.attrs)?;
    let mk_schema_path = path::mk_schema();

    let declarations = fields
        .into_iter()
        .map(|field| declare_field(field, &type_attrs, &mk_schema_path))
        .collect::<syn::Result<Vec<_>>>()?;

    let ident = &ast.ident;
    let name = match &type_attrs.name {
        Some(name) => name.clone(),
        None => LitStr::new(&ident.unraw().to_string(), ident.span()),
    };
    let customize = type_attrs
        .customize
        .then(|| quote! { Self::customize(descriptor); });

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let descriptor_builder_ = path::descriptor_builder_(&mk_schema_path);
    let auto_register = auto_register_impl(ast, &type_attrs, &mk_schema_path);

    Ok(quote! {
        impl #impl_generics #mk_schema_path::Schema for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;

            #[allow(unused_variables)]
            fn describe(descriptor: &mut #descriptor_builder_<Self>) {
                #(#declarations)*
                #customize
            }
        }

        #auto_register
    })
}

fn declare_field(
    field: &Field,
    type_attrs: &TypeAttributes,
    mk_schema_path: &syn::Path,
) -> syn::Result<TokenStream> {
    let attrs = FieldAttributes::parse(&field.attrs)?;
    let Some(member) = &field.ident else {
        return Err(syn::Error::new(field.span(), UNSUPPORTED));
    };
    let ty = &field.ty;

    Ok(match attrs.role {
        FieldRole::Skip => TokenStream::new(),
        FieldRole::Flatten => quote! {
            descriptor.flatten::<#ty>(|v| &v.#member, |v| &mut v.#member);
        },
        FieldRole::Extensions => quote! {
            descriptor.extensions(|v| &v.#member, |v| &mut v.#member);
        },
        FieldRole::ChangeSet => quote! {
            descriptor.change_set(|v| &v.#member);
        },
        FieldRole::Property => {
            let logical = member.unraw().to_string();
            let config = property_config(&attrs, &logical, type_attrs, mk_schema_path);
            quote! {
                descriptor.field::<#ty>(#logical, |v| &v.#member, |v| &mut v.#member) #(#config)*;
            }
        }
    })
}

fn property_config(
    attrs: &FieldAttributes,
    logical: &str,
    type_attrs: &TypeAttributes,
    mk_schema_path: &syn::Path,
) -> Vec<TokenStream> {
    let view_context_ = path::view_context_(mk_schema_path);
    let mut config = Vec::new();

    match (&attrs.rename, type_attrs.rename_all) {
        (Some(rename), _) => config.push(quote! { .rename(#rename) }),
        (None, Some(rule)) => {
            let renamed = rule.apply(logical);
            if renamed != logical {
                config.push(quote! { .rename(#renamed) });
            }
        }
        (None, None) => {}
    }
    for context in &attrs.contexts {
        let context = context.to_tokens_with(&view_context_);
        config.push(quote! { .context(#context) });
    }
    for context in &attrs.always {
        let context = context.to_tokens_with(&view_context_);
        config.push(quote! { .always(#context) });
    }
    for (context, wire_name) in &attrs.context_names {
        let context = context.to_tokens_with(&view_context_);
        config.push(quote! { .context_name(#context, #wire_name) });
    }
    if attrs.omit_null {
        config.push(quote! { .omit_null() });
    }
    if let Some(proxy) = &attrs.proxy {
        config.push(quote! { .proxy(#proxy) });
    }
    config
}

/// Generate `auto_register` implementation
#[cfg(feature = "auto_register")]
fn auto_register_impl(
    ast: &DeriveInput,
    type_attrs: &TypeAttributes,
    mk_schema_path: &syn::Path,
) -> TokenStream {
    let Some(span) = type_attrs.auto_register else {
        return TokenStream::new();
    };
    // Invalid for generic types.
    if !ast.generics.params.is_empty() {
        return TokenStream::new();
    }

    let macro_exports_ = path::macro_exports_(mk_schema_path);
    let ident = &ast.ident;
    quote::quote_spanned! { span =>
        #macro_exports_::inventory::submit! {
            #macro_exports_::AutoRegistration::of::<#ident>()
        }
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
fn auto_register_impl(_: &DeriveInput, _: &TypeAttributes, _: &syn::Path) -> TokenStream {
    TokenStream::new()
}
