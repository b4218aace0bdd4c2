//! Type-erased accessors stored inside descriptors.
//!
//! A descriptor is shared between all instances of a type and works on
//! `&dyn Any`. Each accessor downcasts to its owner type and then applies a
//! typed function. Flattened components wrap an inner accessor in
//! [`Projected`], which first navigates from the outer type to the component.

use core::any::{Any, type_name};
use core::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::de::Decoder;
use crate::error::{DecodeError, EncodeError};
use crate::ser::Encoder;
use crate::value::Dynamic;
use crate::wire::Wire;

fn mismatch<T>() -> String {
    format!("descriptor of `{}` applied to another type", type_name::<T>())
}

// -----------------------------------------------------------------------------
// Traits

pub(crate) trait FieldAccess: Send + Sync {
    fn decode(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError>;

    fn encode(&self, target: &dyn Any, encoder: &Encoder<'_>) -> Result<Value, EncodeError>;

    fn is_null(&self, target: &dyn Any) -> bool;
}

pub(crate) trait DecodeHook: Send + Sync {
    fn apply(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError>;
}

pub(crate) trait EncodeHook: Send + Sync {
    fn value(&self, target: &dyn Any) -> Result<Dynamic, EncodeError>;
}

pub(crate) trait Lens<V>: Send + Sync {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a V>;

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut V>;
}

// -----------------------------------------------------------------------------
// Direct accessors

pub(crate) struct DirectField<T, F> {
    pub get: fn(&T) -> &F,
    pub get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: Wire> FieldAccess for DirectField<T, F> {
    fn decode(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError> {
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(|| DecodeError::custom(mismatch::<T>()))?;
        *(self.get_mut)(target) = F::decode(value, decoder)?;
        Ok(())
    }

    fn encode(&self, target: &dyn Any, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        let target = target
            .downcast_ref::<T>()
            .ok_or_else(|| EncodeError::custom(mismatch::<T>()))?;
        (self.get)(target).encode(encoder)
    }

    fn is_null(&self, target: &dyn Any) -> bool {
        target
            .downcast_ref::<T>()
            .is_none_or(|target| (self.get)(target).is_null())
    }
}

pub(crate) struct DecodeHookFn<T, F> {
    func: F,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T, F> DecodeHookFn<T, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, F> DecodeHook for DecodeHookFn<T, F>
where
    F: Fn(&mut T, &Value, &Decoder<'_>) -> Result<(), DecodeError> + Send + Sync,
{
    fn apply(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError> {
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(|| DecodeError::custom(mismatch::<T>()))?;
        (self.func)(target, value, decoder)
    }
}

pub(crate) struct EncodeHookFn<T, F> {
    func: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> EncodeHookFn<T, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, F> EncodeHook for EncodeHookFn<T, F>
where
    F: Fn(&T) -> Dynamic + Send + Sync,
{
    fn value(&self, target: &dyn Any) -> Result<Dynamic, EncodeError> {
        let target = target
            .downcast_ref::<T>()
            .ok_or_else(|| EncodeError::custom(mismatch::<T>()))?;
        Ok((self.func)(target))
    }
}

pub(crate) struct FieldLens<T, V> {
    pub get: fn(&T) -> &V,
    pub get_mut: Option<fn(&mut T) -> &mut V>,
}

impl<T: 'static, V: 'static> Lens<V> for FieldLens<T, V> {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a V> {
        target.downcast_ref::<T>().map(self.get)
    }

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut V> {
        let get_mut = self.get_mut?;
        target.downcast_mut::<T>().map(get_mut)
    }
}

// -----------------------------------------------------------------------------
// Projected

/// An inner accessor reached through a component field of `T`.
pub(crate) struct Projected<T, B, A: ?Sized> {
    get: fn(&T) -> &B,
    get_mut: fn(&mut T) -> &mut B,
    inner: Arc<A>,
}

impl<T, B, A: ?Sized> Projected<T, B, A> {
    pub fn new(get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B, inner: Arc<A>) -> Self {
        Self {
            get,
            get_mut,
            inner,
        }
    }
}

impl<T: 'static, B: 'static> FieldAccess for Projected<T, B, dyn FieldAccess> {
    fn decode(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError> {
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(|| DecodeError::custom(mismatch::<T>()))?;
        self.inner.decode((self.get_mut)(target), value, decoder)
    }

    fn encode(&self, target: &dyn Any, encoder: &Encoder<'_>) -> Result<Value, EncodeError> {
        let target = target
            .downcast_ref::<T>()
            .ok_or_else(|| EncodeError::custom(mismatch::<T>()))?;
        self.inner.encode((self.get)(target), encoder)
    }

    fn is_null(&self, target: &dyn Any) -> bool {
        target
            .downcast_ref::<T>()
            .is_none_or(|target| self.inner.is_null((self.get)(target)))
    }
}

impl<T: 'static, B: 'static> DecodeHook for Projected<T, B, dyn DecodeHook> {
    fn apply(
        &self,
        target: &mut dyn Any,
        value: &Value,
        decoder: &Decoder<'_>,
    ) -> Result<(), DecodeError> {
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(|| DecodeError::custom(mismatch::<T>()))?;
        self.inner.apply((self.get_mut)(target), value, decoder)
    }
}

impl<T: 'static, B: 'static> EncodeHook for Projected<T, B, dyn EncodeHook> {
    fn value(&self, target: &dyn Any) -> Result<Dynamic, EncodeError> {
        let target = target
            .downcast_ref::<T>()
            .ok_or_else(|| EncodeError::custom(mismatch::<T>()))?;
        self.inner.value((self.get)(target))
    }
}

impl<T: 'static, B: 'static, V: 'static> Lens<V> for Projected<T, B, dyn Lens<V>> {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a V> {
        let target = target.downcast_ref::<T>()?;
        self.inner.get((self.get)(target))
    }

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut V> {
        let target = target.downcast_mut::<T>()?;
        self.inner.get_mut((self.get_mut)(target))
    }
}
