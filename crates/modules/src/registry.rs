//! Module metadata lookup, owned by the composition root.

use std::collections::HashMap;

use tessera_inject::TypeKey;

use crate::descriptor::{ModuleDefinition, ModuleDescriptor};

/// Maps module types to their descriptors.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    descriptors: HashMap<TypeKey, ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: ModuleDefinition>(&mut self) -> &mut Self {
        self.insert(M::descriptor());
        self
    }

    /// Store a descriptor, returning the one it replaced.
    pub fn insert(&mut self, descriptor: ModuleDescriptor) -> Option<ModuleDescriptor> {
        self.descriptors.insert(descriptor.module(), descriptor)
    }

    pub fn lookup(&self, key: &TypeKey) -> Option<&ModuleDescriptor> {
        self.descriptors.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.descriptors.contains_key(key)
    }

    pub fn unregister(&mut self, key: &TypeKey) -> Option<ModuleDescriptor> {
        self.descriptors.remove(key)
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
