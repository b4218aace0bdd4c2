//! Parsing of `#[schema(...)]` attributes.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr};

use crate::SCHEMA_ATTRIBUTE_NAME;

fn schema_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(SCHEMA_ATTRIBUTE_NAME))
}

// -----------------------------------------------------------------------------
// RenameRule

#[derive(Debug, Clone, Copy)]
pub(crate) enum RenameRule {
    CamelCase,
    PascalCase,
    SnakeCase,
    LowerCase,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "camelCase" => Ok(Self::CamelCase),
            "PascalCase" => Ok(Self::PascalCase),
            "snake_case" => Ok(Self::SnakeCase),
            "lowercase" => Ok(Self::LowerCase),
            _ => Err(syn::Error::new(
                lit.span(),
                "unknown rename rule, expected one of `camelCase`, `PascalCase`, `snake_case`, `lowercase`",
            )),
        }
    }

    /// Applies the rule to a snake_case field name.
    pub(crate) fn apply(self, field: &str) -> String {
        match self {
            Self::SnakeCase => field.to_owned(),
            Self::LowerCase => field.to_ascii_lowercase(),
            Self::PascalCase => field.split('_').map(capitalize).collect(),
            Self::CamelCase => {
                let pascal: String = field.split('_').map(capitalize).collect();
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => pascal,
                }
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// -----------------------------------------------------------------------------
// Context

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    Default,
    Create,
    Patch,
}

impl Context {
    fn from_meta(meta: &ParseNestedMeta) -> syn::Result<Self> {
        if meta.path.is_ident("default") {
            Ok(Self::Default)
        } else if meta.path.is_ident("create") {
            Ok(Self::Create)
        } else if meta.path.is_ident("patch") {
            Ok(Self::Patch)
        } else {
            Err(meta.error("unknown view context, expected `default`, `create` or `patch`"))
        }
    }

    pub(crate) fn to_tokens_with(self, view_context_: &TokenStream) -> TokenStream {
        match self {
            Self::Default => quote!(#view_context_::Default),
            Self::Create => quote!(#view_context_::Create),
            Self::Patch => quote!(#view_context_::Patch),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Attributes on the struct itself.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub name: Option<LitStr>,
    pub rename_all: Option<RenameRule>,
    pub auto_register: Option<Span>,
    pub customize: bool,
}

impl TypeAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in schema_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    this.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("rename_all") {
                    let lit: LitStr = meta.value()?.parse()?;
                    this.rename_all = Some(RenameRule::parse(&lit)?);
                } else if meta.path.is_ident("auto_register") {
                    this.auto_register = Some(meta.path.span());
                } else if meta.path.is_ident("customize") {
                    this.customize = true;
                } else {
                    return Err(meta.error(
                        "unknown schema attribute, expected `name`, `rename_all`, `auto_register` or `customize`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// What a field contributes to the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FieldRole {
    #[default]
    Property,
    Flatten,
    Extensions,
    ChangeSet,
    Skip,
}

/// Attributes on a single field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub role: FieldRole,
    pub rename: Option<LitStr>,
    pub contexts: Vec<Context>,
    pub always: Vec<Context>,
    pub context_names: Vec<(Context, LitStr)>,
    pub omit_null: bool,
    pub proxy: Option<LitStr>,
}

impl FieldAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in schema_attributes(attrs) {
            attr.parse_nested_meta(|meta| this.parse_one(&meta))?;

            if this.role != FieldRole::Property && this.configures_property() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "`flatten`, `extensions`, `change_set` and `skip` fields take no property options",
                ));
            }
        }
        Ok(this)
    }

    fn parse_one(&mut self, meta: &ParseNestedMeta) -> syn::Result<()> {
        let path = &meta.path;
        if path.is_ident("rename") {
            self.rename = Some(meta.value()?.parse()?);
        } else if path.is_ident("context") {
            meta.parse_nested_meta(|inner| {
                self.contexts.push(Context::from_meta(&inner)?);
                Ok(())
            })?;
        } else if path.is_ident("always") {
            meta.parse_nested_meta(|inner| {
                self.always.push(Context::from_meta(&inner)?);
                Ok(())
            })?;
        } else if path.is_ident("patch_name") {
            self.context_names.push((Context::Patch, meta.value()?.parse()?));
        } else if path.is_ident("create_name") {
            self.context_names.push((Context::Create, meta.value()?.parse()?));
        } else if path.is_ident("omit_null") {
            self.omit_null = true;
        } else if path.is_ident("proxy") {
            self.proxy = Some(meta.value()?.parse()?);
        } else if path.is_ident("flatten") {
            self.set_role(FieldRole::Flatten, meta)?;
        } else if path.is_ident("extensions") {
            self.set_role(FieldRole::Extensions, meta)?;
        } else if path.is_ident("change_set") {
            self.set_role(FieldRole::ChangeSet, meta)?;
        } else if path.is_ident("skip") {
            self.set_role(FieldRole::Skip, meta)?;
        } else {
            return Err(meta.error("unknown schema field attribute"));
        }
        Ok(())
    }

    fn set_role(&mut self, role: FieldRole, meta: &ParseNestedMeta) -> syn::Result<()> {
        if self.role != FieldRole::Property {
            return Err(meta.error(
                "a field takes at most one of `flatten`, `extensions`, `change_set` and `skip`",
            ));
        }
        self.role = role;
        Ok(())
    }

    fn configures_property(&self) -> bool {
        self.rename.is_some()
            || !self.contexts.is_empty()
            || !self.always.is_empty()
            || !self.context_names.is_empty()
            || self.omit_null
            || self.proxy.is_some()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use syn::{Data, DeriveInput, Field, parse_quote};

    use super::{Context, FieldAttributes, FieldRole, RenameRule, TypeAttributes};

    fn first_field(ast: DeriveInput) -> Field {
        let Data::Struct(data) = ast.data else {
            unreachable!()
        };
        data.fields.into_iter().next().unwrap()
    }

    #[test]
    fn rename_rules() {
        assert_eq!(RenameRule::CamelCase.apply("part_number"), "partNumber");
        assert_eq!(RenameRule::PascalCase.apply("part_number"), "PartNumber");
        assert_eq!(RenameRule::SnakeCase.apply("part_number"), "part_number");
        assert_eq!(RenameRule::LowerCase.apply("id"), "id");
        assert_eq!(RenameRule::CamelCase.apply("id"), "id");
    }

    #[test]
    fn field_attributes_parse() {
        let field = first_field(parse_quote! {
            struct Part {
                #[schema(rename = "qty", context(default, patch), always(patch), patch_name = "q", omit_null)]
                quantity: i16,
            }
        });
        let attrs = FieldAttributes::parse(&field.attrs).unwrap();

        assert_eq!(attrs.role, FieldRole::Property);
        assert_eq!(attrs.rename.unwrap().value(), "qty");
        assert_eq!(attrs.contexts, [Context::Default, Context::Patch]);
        assert_eq!(attrs.always, [Context::Patch]);
        assert_eq!(attrs.context_names[0].1.value(), "q");
        assert!(attrs.omit_null);
    }

    #[test]
    fn roles_are_exclusive() {
        let field = first_field(parse_quote! {
            struct Derived {
                #[schema(flatten, skip)]
                base: Base,
            }
        });
        assert!(FieldAttributes::parse(&field.attrs).is_err());

        let field = first_field(parse_quote! {
            struct Derived {
                #[schema(flatten, rename = "x")]
                base: Base,
            }
        });
        assert!(FieldAttributes::parse(&field.attrs).is_err());
    }

    #[test]
    fn type_attributes_parse() {
        let ast: syn::DeriveInput = parse_quote! {
            #[schema(name = "Item", rename_all = "camelCase", customize)]
            struct Part {}
        };
        let attrs = TypeAttributes::parse(&ast.attrs).unwrap();
        assert_eq!(attrs.name.unwrap().value(), "Item");
        assert!(attrs.customize);
        assert!(attrs.auto_register.is_none());

        let ast: syn::DeriveInput = parse_quote! {
            #[schema(rename_all = "kebab-case")]
            struct Part {}
        };
        assert!(TypeAttributes::parse(&ast.attrs).is_err());
    }
}
