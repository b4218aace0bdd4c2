use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ConfigurationError;
use crate::info::{SchemaType, TypeDescriptor};
use crate::registry::TypeIdMap;

// -----------------------------------------------------------------------------
// DescriptorCache

/// Process-wide memo of built [`TypeDescriptor`]s.
///
/// Lookups take a read lock. A miss builds the descriptor without holding
/// any lock and then stores it unless another thread got there first, in
/// which case the stored descriptor wins and is returned to both callers.
pub struct DescriptorCache {
    table: RwLock<TypeIdMap<Arc<TypeDescriptor>>>,
}

impl Default for DescriptorCache {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorCache {
    #[inline]
    pub const fn new() -> Self {
        Self {
            table: RwLock::new(TypeIdMap::new()),
        }
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, TypeIdMap<Arc<TypeDescriptor>>> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, TypeIdMap<Arc<TypeDescriptor>>> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached descriptor of `ty`, building it on first use.
    ///
    /// Configuration errors are not cached; every call for a broken type
    /// reports the error again.
    pub fn describe(&self, ty: SchemaType) -> Result<Arc<TypeDescriptor>, ConfigurationError> {
        if let Some(descriptor) = self.read().get(&ty.id()) {
            return Ok(Arc::clone(descriptor));
        }

        let built = match ty.describe() {
            Ok(descriptor) => Arc::new(descriptor),
            Err(err) => {
                log::warn!("schema of `{}` is invalid: {err}", ty.path());
                return Err(err);
            }
        };
        log::debug!(
            "built descriptor for `{}` with {} fields",
            ty.name(),
            built.len()
        );

        let mut table = self.write();
        Ok(Arc::clone(table.get_or_insert(ty.id(), || built)))
    }

    /// Returns the descriptor of `ty` if it has been built.
    pub fn get(&self, ty: SchemaType) -> Option<Arc<TypeDescriptor>> {
        self.read().get(&ty.id()).cloned()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drops every cached descriptor.
    pub fn clear(&self) {
        self.write().clear();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::DescriptorCache;
    use crate::fixtures::Part;
    use crate::info::SchemaType;

    #[test]
    fn concurrent_lookups_agree() {
        let cache = Arc::new(DescriptorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.describe(SchemaType::of::<Part>()).unwrap())
            })
            .collect();

        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.get(SchemaType::of::<Part>()).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, &stored)));
    }

    #[test]
    fn clear_forces_rebuild() {
        let cache = DescriptorCache::new();
        let first = cache.describe(SchemaType::of::<Part>()).unwrap();
        cache.clear();
        assert!(cache.is_empty());

        let second = cache.describe(SchemaType::of::<Part>()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), second.len());
    }
}
