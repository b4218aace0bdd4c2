use std::sync::Arc;

use serde_json::Value;

use crate::de::Decoder;
use crate::error::{DecodeError, EncodeError};
use crate::info::{TypeKey, ViewContext};
use crate::options::MappingOptions;
use crate::registry::{SchemaRegistry, SchemaRegistryArc};
use crate::ser::Encoder;
use crate::value::Dynamic;
use crate::wire::Wire;

// -----------------------------------------------------------------------------
// Mapper

/// A shareable entry point bundling a registry with options.
///
/// Cloning is cheap; clones share the registry. Every call takes a read
/// lock on the registry for its duration.
#[derive(Debug, Clone)]
pub struct Mapper {
    registry: SchemaRegistryArc,
    options: Arc<MappingOptions>,
}

impl Mapper {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self::with_options(registry, MappingOptions::default())
    }

    pub fn with_options(registry: SchemaRegistry, options: MappingOptions) -> Self {
        Self::from_shared(registry.into(), options)
    }

    /// Uses a registry that may still receive registrations elsewhere.
    pub fn from_shared(registry: SchemaRegistryArc, options: MappingOptions) -> Self {
        Self {
            registry,
            options: Arc::new(options),
        }
    }

    #[inline]
    pub fn registry(&self) -> &SchemaRegistryArc {
        &self.registry
    }

    #[inline]
    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    pub fn decode_value<T: Wire>(&self, value: &Value) -> Result<T, DecodeError> {
        let registry = self.registry.read();
        Decoder::new(&registry, &self.options).decode(value)
    }

    pub fn decode_str<T: Wire>(&self, json: &str) -> Result<T, DecodeError> {
        let registry = self.registry.read();
        Decoder::new(&registry, &self.options).decode_str(json)
    }

    /// Decodes `json` into the runtime type `target`.
    pub fn decode_as_str(&self, json: &str, target: TypeKey) -> Result<Dynamic, DecodeError> {
        let value: Value = serde_json::from_str(json)?;
        let registry = self.registry.read();
        Decoder::new(&registry, &self.options).decode_as(&value, target)
    }

    /// Decodes the array under the configured wrapper property.
    pub fn decode_wrapped_str<T: Wire>(
        &self,
        json: &str,
        ignore_if_missing: bool,
    ) -> Result<Vec<T>, DecodeError> {
        self.decode_wrapped_named_str(json, &self.options.wrapper_property, ignore_if_missing)
    }

    /// Decodes the array under the root property `wrapper`.
    pub fn decode_wrapped_named_str<T: Wire>(
        &self,
        json: &str,
        wrapper: &str,
        ignore_if_missing: bool,
    ) -> Result<Vec<T>, DecodeError> {
        let registry = self.registry.read();
        Decoder::new(&registry, &self.options).decode_wrapped_str(json, wrapper, ignore_if_missing)
    }

    pub fn encode_value<T: Wire>(&self, value: &T, context: ViewContext) -> Result<Value, EncodeError> {
        let registry = self.registry.read();
        Encoder::new(&registry, context, &self.options).encode(value)
    }

    pub fn encode_to_string<T: Wire>(
        &self,
        value: &T,
        context: ViewContext,
    ) -> Result<String, EncodeError> {
        let registry = self.registry.read();
        Encoder::new(&registry, context, &self.options).encode_to_string(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Mapper;
    use crate::error::{DecodeError, EncodeError};
    use crate::fixtures::{
        Alternate, Assembly, Document, Draft, EngItem, Kit, Note, Part, PartMask, Priced,
        Revision, Tree, registry,
    };
    use crate::info::{Mapped, TypeKey, ViewContext};
    use crate::options::MappingOptions;
    use crate::value::Dynamic;
    use crate::wire::Wire;

    fn mapper() -> Mapper {
        Mapper::new(registry())
    }

    fn mapper_with(options: MappingOptions) -> Mapper {
        Mapper::with_options(registry(), options)
    }

    fn assert_round_trip<T: Wire + PartialEq + core::fmt::Debug>(mapper: &Mapper, value: T) {
        let encoded = mapper.encode_value(&value, ViewContext::Default).unwrap();
        let decoded: T = mapper.decode_value(&encoded).unwrap();
        assert_eq!(decoded, value, "decoded from {encoded}");
    }

    fn assert_stable_encoding<T: Wire>(mapper: &Mapper, json: &str) {
        let value: T = mapper.decode_str(json).unwrap();
        let encoded = mapper.encode_value(&value, ViewContext::Default).unwrap();
        let again: T = mapper.decode_value(&encoded).unwrap();
        assert_eq!(mapper.encode_value(&again, ViewContext::Default).unwrap(), encoded);
    }

    #[test]
    fn part_round_trip() {
        let mapper = mapper();
        let json = r#"{"id":"P1","title":"Bracket","qty":10,"weight":2.5}"#;

        let part: Part = mapper.decode_str(json).unwrap();
        assert_eq!(part.id, "P1");
        assert_eq!(part.title.as_deref(), Some("Bracket"));
        assert_eq!(part.quantity, 10);
        assert_eq!(part.weight, 2.5);

        assert_eq!(mapper.encode_to_string(&part, ViewContext::Default).unwrap(), json);
    }

    #[test]
    fn numbers_coerce_into_field_types() {
        let mapper = mapper();

        let part: Part = mapper.decode_str(r#"{"qty": 10.0, "weight": 10}"#).unwrap();
        assert_eq!(part.quantity, 10);
        assert_eq!(part.weight, 10.0);

        let part: Part = mapper.decode_str(r#"{"qty": "42"}"#).unwrap();
        assert_eq!(part.quantity, 42);

        let err = mapper.decode_str::<Part>(r#"{"qty": 10.5}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Coercion { target: "i16", .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.qty");

        let strict = mapper_with(MappingOptions {
            lenient_numbers: false,
            ..Default::default()
        });
        assert!(strict.decode_str::<Part>(r#"{"qty": "42"}"#).is_err());
    }

    #[test]
    fn shape_errors_carry_the_path() {
        let mapper = mapper();
        let err = mapper
            .decode_str::<Assembly>(r#"{"children": {"items": [{"id": "P1"}, {"weight": "heavy"}]}}"#)
            .unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "$.children[1].weight");

        let err = mapper.decode_str::<Part>("[1, 2]").unwrap_err();
        assert!(matches!(err, DecodeError::Shape { found: "array", .. }));
    }

    #[test]
    fn masks_follow_discriminators() {
        let mapper = mapper();

        let alternate: Box<dyn PartMask> = mapper
            .decode_str(r#"{"type": "Alternate", "id": "A1", "alternate_for": "P1"}"#)
            .unwrap();
        let object: &dyn Mapped = &*alternate;
        let alternate = object.downcast_ref::<Alternate>().unwrap();
        assert_eq!(alternate.base.id, "A1");
        assert_eq!(alternate.alternate_for.as_deref(), Some("P1"));

        let fallback: Box<dyn PartMask> = mapper.decode_str(r#"{"type": "Unknown", "id": "X"}"#).unwrap();
        assert_eq!(fallback.schema_type().name(), "Part");
        assert_eq!(fallback.id(), "X");

        let untagged: Box<dyn PartMask> = mapper.decode_str(r#"{"id": "P2"}"#).unwrap();
        assert_eq!(untagged.schema_type().name(), "Part");
    }

    #[test]
    fn static_types_ignore_discriminators() {
        let part: Part = mapper()
            .decode_str(r#"{"type": "Alternate", "id": "A1", "alternate_for": "P1"}"#)
            .unwrap();
        assert_eq!(part, Part::new("A1"));
    }

    #[test]
    fn mask_collections_keep_runtime_types() {
        let mapper = mapper();
        let json = r#"{
            "parts": [{"id": "P1"}, {"type": "EngItem", "id": "E1", "revision": "B"}],
            "root": {"type": "Alternate", "id": "A1"}
        }"#;

        let tree: Tree = mapper.decode_str(json).unwrap();
        assert_eq!(tree.parts.len(), 2);
        assert_eq!(tree.parts[1].schema_type().name(), "EngItem");
        assert_eq!(tree.root.as_ref().unwrap().id(), "A1");

        let value = mapper.encode_value(&tree, ViewContext::Default).unwrap();
        assert_eq!(value["parts"][1]["revision"], "B");
        assert_eq!(value["parts"][1]["id"], "E1");
        assert_eq!(value["root"]["id"], "A1");
        assert!(value["parts"][0].get("revision").is_none());
    }

    #[test]
    fn runtime_typed_decoding() {
        let mapper = mapper();

        let list = mapper
            .decode_as_str(
                r#"[{"id": "P1"}, {"type": "EngItem", "id": "E1"}, null]"#,
                TypeKey::of::<dyn PartMask>(),
            )
            .unwrap();
        let items = list.as_list().unwrap();
        assert_eq!(items[0].as_object().unwrap().schema_type().name(), "Part");
        assert!(items[1].downcast_ref::<EngItem>().is_some());
        assert!(items[2].is_null());

        let scalar = mapper.decode_as_str("42", TypeKey::of::<i16>()).unwrap();
        assert_eq!(scalar.as_i64(), Some(42));

        let err = mapper.decode_as_str(r#"{"id": "D1"}"#, TypeKey::of::<dyn Send>()).unwrap_err();
        assert!(matches!(err, DecodeError::NoImplementation { .. }));
    }

    #[test]
    fn unknown_properties_are_captured_or_dropped() {
        let mapper = mapper();
        let json = r#"{"id": "D1", "color": "red", "size": 3}"#;

        let document: Document = mapper.decode_str(json).unwrap();
        assert_eq!(document.extra.len(), 2);
        assert_eq!(document.extra["color"].as_str(), Some("red"));
        assert_eq!(document.extra["size"].as_i64(), Some(3));
        assert_eq!(mapper.encode_to_string(&document, ViewContext::Default).unwrap(), json.replace(' ', ""));

        let part: Part = mapper.decode_str(json).unwrap();
        assert_eq!(part, Part::new("D1"));
    }

    #[test]
    fn extensions_never_replace_declared_properties() {
        let mut document = Document {
            id: "D1".into(),
            ..Default::default()
        };
        document.extra.insert("id".into(), Dynamic::from("shadow"));
        document.extra.insert("note".into(), Dynamic::from("kept"));

        let value = mapper().encode_value(&document, ViewContext::Default).unwrap();
        assert_eq!(value, json!({"id": "D1", "note": "kept"}));

        let value = mapper().encode_value(&document, ViewContext::Create).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn wrapped_collections() {
        let mapper = mapper();

        let parts: Vec<Part> = mapper
            .decode_wrapped_str(r#"{"member": [{"id": "P1"}, {"id": "P2"}]}"#, false)
            .unwrap();
        assert_eq!(parts.len(), 2);

        let json = r#"{"members": [{"id": "P1"}]}"#;
        let err = mapper.decode_wrapped_str::<Part>(json, false).unwrap_err();
        assert!(matches!(err, DecodeError::MissingWrapper(ref name) if name == "member"));
        assert!(mapper.decode_wrapped_str::<Part>(json, true).unwrap().is_empty());
        assert!(mapper.decode_wrapped_str::<Part>(r#"{"member": null}"#, true).unwrap().is_empty());

        let parts: Vec<Part> = mapper.decode_wrapped_named_str(json, "members", false).unwrap();
        assert_eq!(parts[0].id, "P1");

        let members = mapper_with(MappingOptions {
            wrapper_property: "members".into(),
            ..Default::default()
        });
        assert_eq!(members.decode_wrapped_str::<Part>(json, false).unwrap().len(), 1);

        let err = mapper.decode_wrapped_str::<Part>(r#"{"member": {}}"#, true).unwrap_err();
        assert!(matches!(err, DecodeError::Shape { .. }));
    }

    #[test]
    fn patch_emits_changed_and_always_fields() {
        let mapper = mapper();
        let mut part = Part {
            title: Some("T".into()),
            description: Some("D".into()),
            quantity: 5,
            ..Part::new("P1")
        };

        assert_eq!(mapper.encode_to_string(&part, ViewContext::Patch).unwrap(), r#"{"id":"P1"}"#);

        part.changes.mark("title");
        // `qty` is not declared for patches
        part.changes.mark("qty");
        assert_eq!(
            mapper.encode_to_string(&part, ViewContext::Patch).unwrap(),
            r#"{"id":"P1","title":"T"}"#
        );

        assert_eq!(mapper.encode_to_string(&part, ViewContext::Create).unwrap(), r#"{"title":"T"}"#);
    }

    #[test]
    fn flattened_change_sets_apply_to_subtypes() {
        let mut alternate = Alternate {
            base: Part {
                title: Some("T".into()),
                ..Part::new("A1")
            },
            alternate_for: Some("P1".into()),
        };
        alternate.base.changes.mark("title");

        let value = mapper().encode_value(&alternate, ViewContext::Patch).unwrap();
        assert_eq!(value, json!({"id": "A1", "title": "T"}));
    }

    #[test]
    fn proxy_collections_use_an_envelope() {
        let mapper = mapper();
        let assembly: Assembly = mapper
            .decode_str(r#"{"id": "A", "children": {"items": [{"id": "P1"}, {"id": "P2"}]}}"#)
            .unwrap();
        assert_eq!(assembly.children.len(), 2);

        let value = mapper.encode_value(&assembly, ViewContext::Default).unwrap();
        assert_eq!(value["children"]["items"][1]["id"], "P2");

        let err = mapper
            .decode_str::<Assembly>(r#"{"children": [{"id": "P1"}]}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Shape { .. }));
    }

    #[test]
    fn null_proxy_collections() {
        let mapper = mapper();
        let kit = Kit {
            id: "K".into(),
            children: None,
        };
        let value = mapper.encode_value(&kit, ViewContext::Default).unwrap();
        assert_eq!(value, json!({"id": "K", "children": null}));
        assert_eq!(mapper.decode_value::<Kit>(&value).unwrap(), kit);

        let kit: Kit = mapper.decode_str(r#"{"id": "K", "children": {"items": null}}"#).unwrap();
        assert_eq!(kit.children, None);

        let kit: Kit = mapper
            .decode_str(r#"{"id": "K", "children": {"items": [{"id": "P1"}]}}"#)
            .unwrap();
        assert_eq!(kit.children.unwrap()[0].id, "P1");

        let err = mapper
            .decode_str::<Kit>(r#"{"children": {"items": 5}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Shape { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.children.items");
    }

    #[test]
    fn overrides_replace_field_handling() {
        let mapper = mapper();
        let priced: Priced = mapper
            .decode_str(r#"{"id": "X", "price": "12.5 EUR", "label": "box"}"#)
            .unwrap();
        assert_eq!(priced.amount, 12.5);
        assert_eq!(priced.currency, "EUR");

        assert_eq!(
            mapper.encode_to_string(&priced, ViewContext::Default).unwrap(),
            r#"{"id":"X","label":"BOX"}"#
        );

        let err = mapper.decode_str::<Priced>(r#"{"price": "cheap"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Custom { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.price");
    }

    #[test]
    fn context_names_and_rename_all() {
        let mapper = mapper();
        let draft: Draft = mapper
            .decode_str(r#"{"title": "Wing", "partNumber": "W-1", "draftTitle": "ignored"}"#)
            .unwrap();
        assert_eq!(draft.title, "Wing");
        assert_eq!(draft.part_number, "W-1");

        assert_eq!(
            mapper.encode_to_string(&draft, ViewContext::Create).unwrap(),
            r#"{"draftTitle":"Wing"}"#
        );
        assert_eq!(
            mapper.encode_to_string(&draft, ViewContext::Default).unwrap(),
            r#"{"title":"Wing","partNumber":"W-1"}"#
        );
    }

    #[test]
    fn context_options_keep_fields_in_default() {
        let mapper = mapper();

        let revision = Revision {
            id: "X".into(),
            title: "T".into(),
        };
        assert_eq!(
            mapper.encode_value(&revision, ViewContext::Default).unwrap(),
            json!({"id": "X", "title": "T"})
        );
        assert_eq!(
            mapper.encode_value(&revision, ViewContext::Patch).unwrap(),
            json!({"t": "T"})
        );
        assert_eq!(
            mapper.encode_value(&revision, ViewContext::Create).unwrap(),
            json!({})
        );

        let note = Note {
            id: "N".into(),
            text: "hi".into(),
        };
        assert_eq!(
            mapper.encode_value(&note, ViewContext::Default).unwrap(),
            json!({"id": "N", "text": "hi"})
        );
        assert_eq!(
            mapper.encode_value(&note, ViewContext::Patch).unwrap(),
            json!({"id": "N"})
        );
    }

    #[test]
    fn default_encoding_round_trips() {
        let mapper = mapper();
        let part = Part {
            title: Some("Bracket".into()),
            description: Some("steel".into()),
            quantity: -3,
            weight: 0.1,
            ..Part::new("P1")
        };

        assert_round_trip(&mapper, part.clone());
        assert_round_trip(&mapper, Part::new("P2"));
        assert_round_trip(
            &mapper,
            Alternate {
                base: part.clone(),
                alternate_for: Some("P0".into()),
            },
        );
        assert_round_trip(
            &mapper,
            EngItem {
                base: part.clone(),
                revision: Some("B".into()),
            },
        );
        assert_round_trip(
            &mapper,
            Assembly {
                id: "A".into(),
                children: vec![part.clone(), Part::new("P2")],
            },
        );
        assert_round_trip(
            &mapper,
            Kit {
                id: "K".into(),
                children: Some(vec![part]),
            },
        );
        assert_round_trip(&mapper, Kit::default());
        assert_round_trip(
            &mapper,
            Draft {
                title: "Wing".into(),
                part_number: "W-1".into(),
            },
        );
        assert_round_trip(
            &mapper,
            Revision {
                id: "X".into(),
                title: "T".into(),
            },
        );
        assert_round_trip(
            &mapper,
            Note {
                id: "N".into(),
                text: "hi".into(),
            },
        );

        let tree = r#"{"parts": [{"id": "P1", "qty": 2}], "root": null}"#;
        assert_stable_encoding::<Tree>(&mapper, tree);
        assert_stable_encoding::<Priced>(&mapper, r#"{"id": "X", "label": "box"}"#);
        assert_stable_encoding::<Document>(&mapper, r#"{"id": "D", "color": "red", "n": 1}"#);
    }

    #[test]
    fn property_matching_case() {
        let json = r#"{"ID": "P1", "Qty": 3}"#;

        let part: Part = mapper().decode_str(json).unwrap();
        assert_eq!((part.id.as_str(), part.quantity), ("P1", 3));

        let strict = mapper_with(MappingOptions {
            case_insensitive: false,
            ..Default::default()
        });
        let part: Part = strict.decode_str(json).unwrap();
        assert_eq!(part, Part::default());
    }

    #[test]
    fn encoding_edge_cases() {
        let mapper = mapper();

        let none: Option<Part> = None;
        assert_eq!(mapper.encode_to_string(&none, ViewContext::Default).unwrap(), "{}");

        let part = Part {
            weight: f64::NAN,
            ..Part::new("P1")
        };
        let err = mapper.encode_value(&part, ViewContext::Default).unwrap_err();
        assert!(matches!(err, EncodeError::NonFinite { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.weight");

        let pretty = mapper_with(MappingOptions {
            pretty: true,
            ..Default::default()
        });
        let text = pretty.encode_to_string(&Part::new("P1"), ViewContext::Patch).unwrap();
        assert_eq!(text, "{\n  \"id\": \"P1\"\n}");
    }

    #[test]
    fn shared_registry_accepts_late_registrations() {
        let mapper = mapper();
        let clone = mapper.clone();
        clone.registry().write().register::<Draft>();
        assert!(mapper.registry().read().get_with_name("Draft").is_some());
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn auto_registered_types() {
        let mut registry = crate::SchemaRegistry::empty();
        assert!(registry.auto_register());
        assert!(registry.contains(core::any::TypeId::of::<Document>()));
    }
}
