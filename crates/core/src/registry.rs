//! Explicit, one-shot registration of resource types.
//!
//! There is no runtime reflection to lean on for "every annotated type,
//! discovered once at startup" — the call site enumerates its own resources.
//! This discovery happens exactly once, at process wiring time, before the
//! collector ever runs.

use crate::resource::{Resource, ResourceDescriptor};

#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    descriptors: Vec<&'static ResourceDescriptor>,
}

impl SchemaRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register<T: Resource>(mut self) -> Self {
        self.descriptors.push(T::descriptor());
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            descriptors: self.descriptors,
        }
    }
}

/// The set of resource types the collector will turn into a declared schema.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    descriptors: Vec<&'static ResourceDescriptor>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    #[must_use]
    pub fn descriptors(&self) -> &[&'static ResourceDescriptor] {
        &self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_builds_empty_registry() {
        let registry = SchemaRegistryBuilder::new().build();
        assert!(registry.descriptors().is_empty());
    }
}
