/// Implements [`Wire`](crate::Wire) for boxed masks.
///
/// A mask is a trait with [`Mapped`](crate::Mapped) as a supertrait. After
/// this macro, `Box<dyn Mask>` can be used as a field type, inside `Vec` and
/// `Option`, or decoded directly. Decoding resolves the concrete type through
/// the registry; encoding writes the fields of the runtime type.
///
/// ```
/// use mk_schema::{Mapped, impl_mask};
///
/// trait Shape: Mapped {}
/// trait Labelled: Mapped {}
///
/// impl_mask!(Shape, Labelled);
/// ```
#[macro_export]
macro_rules! impl_mask {
    ($($mask:path),+ $(,)?) => {
        $(
            impl $crate::Wire for ::std::boxed::Box<dyn $mask> {
                fn decode(
                    value: &$crate::__macro_exports::Value,
                    decoder: &$crate::de::Decoder<'_>,
                ) -> ::core::result::Result<Self, $crate::DecodeError> {
                    decoder.decode_mask::<dyn $mask>(value)
                }

                fn encode(
                    &self,
                    encoder: &$crate::ser::Encoder<'_>,
                ) -> ::core::result::Result<$crate::__macro_exports::Value, $crate::EncodeError> {
                    let object: &dyn $crate::Mapped = &**self;
                    encoder.encode_object(object)
                }
            }
        )+
    };
}

/// Declares concrete types as implementations of a mask.
///
/// Shorthand for [`SchemaRegistry::implement`](crate::SchemaRegistry::implement)
/// with the identity cast, which is all a trait-object mask needs.
///
/// ```
/// use mk_schema::{Mapped, Schema, SchemaRegistry, register_mask};
///
/// trait Shape: Mapped {}
///
/// #[derive(Schema, Default, Debug)]
/// struct Circle { r: f64 }
/// impl Shape for Circle {}
///
/// #[derive(Schema, Default, Debug)]
/// struct Square { side: f64 }
/// impl Shape for Square {}
///
/// let mut registry = SchemaRegistry::new();
/// register_mask!(registry, dyn Shape => Circle, Square);
///
/// assert!(registry.implements::<dyn Shape>(core::any::TypeId::of::<Square>()));
/// ```
#[macro_export]
macro_rules! register_mask {
    ($registry:expr, dyn $mask:path => $($concrete:ty),+ $(,)?) => {{
        let registry: &mut $crate::SchemaRegistry = &mut $registry;
        $(
            registry.implement::<dyn $mask, $concrete>(|object| object);
        )+
    }};
}
