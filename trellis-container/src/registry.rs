//! Insertion-ordered component definition store
//!
//! Registration order matters: it is the tie-break for the dependency
//! resolver, so the registry keeps a name list alongside the definition map.

use crate::component::ComponentDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use trellis_core::{CoreError, CoreResult};

#[derive(Default)]
pub(crate) struct ComponentRegistry {
    order: Vec<String>,
    definitions: HashMap<String, Arc<ComponentDefinition>>,
}

impl ComponentRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a definition, rejecting duplicate names.
    pub(crate) fn insert(&mut self, definition: ComponentDefinition) -> CoreResult<()> {
        let name = definition.name().to_string();
        if self.definitions.contains_key(&name) {
            return Err(CoreError::config(
                "ALREADY_REGISTERED",
                format!("Component {name} is already registered"),
            ));
        }
        self.order.push(name.clone());
        self.definitions.insert(name, Arc::new(definition));
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<ComponentDefinition>> {
        self.definitions.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Registered names in registration order.
    pub(crate) fn names(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
