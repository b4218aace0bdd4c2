//! Types shared by the unit tests.

use crate::error::DecodeError;
use crate::info::{DescriptorBuilder, Mapped};
use crate::registry::{Discriminator, SchemaRegistry};
use crate::value::{ChangeSet, Dynamic, OpenMap};
use crate::{Schema, impl_mask, register_mask};

pub trait PartMask: Mapped {
    fn id(&self) -> &str;
}

impl_mask!(PartMask);

#[derive(Schema, Default, Debug, Clone, PartialEq)]
pub struct Part {
    #[schema(context(default, patch), always(patch))]
    pub id: String,
    #[schema(context(default, create, patch), omit_null)]
    pub title: Option<String>,
    #[schema(omit_null)]
    pub description: Option<String>,
    #[schema(rename = "qty")]
    pub quantity: i16,
    pub weight: f64,
    #[schema(change_set)]
    pub changes: ChangeSet,
}

impl Part {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Schema, Default, Debug, Clone, PartialEq)]
pub struct Alternate {
    #[schema(flatten)]
    pub base: Part,
    pub alternate_for: Option<String>,
}

#[derive(Schema, Default, Debug, Clone, PartialEq)]
#[schema(name = "EngItem")]
pub struct EngItem {
    #[schema(flatten)]
    pub base: Part,
    pub revision: Option<String>,
}

impl PartMask for Part {
    fn id(&self) -> &str {
        &self.id
    }
}

impl PartMask for Alternate {
    fn id(&self) -> &str {
        &self.base.id
    }
}

impl PartMask for EngItem {
    fn id(&self) -> &str {
        &self.base.id
    }
}

#[derive(Schema, Default, Debug)]
#[schema(auto_register)]
pub struct Document {
    pub id: String,
    #[schema(extensions)]
    pub extra: OpenMap,
}

#[derive(Schema, Default, Debug, PartialEq)]
pub struct Assembly {
    pub id: String,
    #[schema(proxy = "items")]
    pub children: Vec<Part>,
}

#[derive(Schema, Default, Debug, PartialEq)]
pub struct Kit {
    pub id: String,
    #[schema(proxy = "items")]
    pub children: Option<Vec<Part>>,
}

/// Only renamed under `Patch`.
#[derive(Schema, Default, Debug, PartialEq)]
pub struct Revision {
    pub id: String,
    #[schema(patch_name = "t")]
    pub title: String,
}

/// Keyed by `id` in patches, declares no contexts.
#[derive(Schema, Default, Debug, PartialEq)]
pub struct Note {
    #[schema(always(patch))]
    pub id: String,
    pub text: String,
}

#[derive(Schema, Default, Debug)]
pub struct Tree {
    pub parts: Vec<Box<dyn PartMask>>,
    pub root: Option<Box<dyn PartMask>>,
}

#[derive(Schema, Default, Debug, PartialEq)]
#[schema(rename_all = "camelCase")]
pub struct Draft {
    #[schema(context(default, create), create_name = "draftTitle")]
    pub title: String,
    pub part_number: String,
}

#[derive(Schema, Default, Debug)]
#[schema(customize)]
pub struct Priced {
    pub id: String,
    #[schema(skip)]
    pub amount: f64,
    #[schema(skip)]
    pub currency: String,
    pub label: String,
}

impl Priced {
    fn customize(descriptor: &mut DescriptorBuilder<Self>) {
        // "12.50 EUR" fills two fields
        descriptor.decode_override("price", |priced, value, decoder| {
            let text: String = decoder.decode(value)?;
            let Some((amount, currency)) = text.split_once(' ') else {
                return Err(DecodeError::custom(format!("`{text}` is not `<amount> <currency>`")));
            };
            priced.amount = amount
                .parse()
                .map_err(|_| DecodeError::coercion(amount, "f64"))?;
            priced.currency = currency.to_owned();
            Ok(())
        });
        descriptor.encode_override("label", |priced| Dynamic::from(priced.label.to_uppercase()));
    }
}

/// A registry with `dyn PartMask` defaulting to `Part` and a `type`
/// discriminator on both the mask and `Part`.
pub fn registry() -> SchemaRegistry {
    let catalog = || {
        Discriminator::new("type")
            .variant::<Alternate>("Alternate")
            .variant::<EngItem>("EngItem")
    };

    let mut registry = SchemaRegistry::new();
    registry.register_default::<dyn PartMask, Part>(|part| part);
    register_mask!(registry, dyn PartMask => Alternate, EngItem);
    registry.register_discriminated::<dyn PartMask>(catalog()).unwrap();
    registry.register_discriminated::<Part>(catalog()).unwrap();
    registry
}
