//! Dependency order resolution
//!
//! Computes a total instantiation order over all registered components via a
//! depth-first traversal: roots are taken in registration order and every
//! component's dependencies are emitted before the component itself, so
//! otherwise-unordered components come out in the order they were
//! registered. A node re-entered while still on the active path is a cycle;
//! a declared dependency that was never registered fails fast, first missing
//! name in declared order.

use crate::registry::ComponentRegistry;
use std::collections::HashSet;
use trellis_core::{CoreError, CoreResult};

/// Returns all registered names ordered so that every component appears
/// after all of its declared dependencies.
pub(crate) fn resolve_order(registry: &ComponentRegistry) -> CoreResult<Vec<String>> {
    let mut order = Vec::with_capacity(registry.len());
    let mut visited = HashSet::new();
    let mut path = HashSet::new();

    for name in registry.names() {
        visit(registry, name, &mut visited, &mut path, &mut order)?;
    }

    Ok(order)
}

fn visit(
    registry: &ComponentRegistry,
    name: &str,
    visited: &mut HashSet<String>,
    path: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> CoreResult<()> {
    if path.contains(name) {
        return Err(CoreError::config(
            "CIRCULAR_DEPENDENCY",
            format!("Circular dependency detected: {name}"),
        ));
    }
    if visited.contains(name) {
        return Ok(());
    }

    let definition = registry.get(name).ok_or_else(|| {
        CoreError::service(
            "UNKNOWN_COMPONENT",
            format!("Component {name} is not registered"),
        )
    })?;

    path.insert(name.to_string());
    for dependency in definition.dependencies() {
        if !registry.contains(dependency) {
            return Err(CoreError::config(
                "MISSING_DEPENDENCY",
                format!("Dependency {dependency} required by {name} is not registered"),
            ));
        }
        visit(registry, dependency, visited, path, order)?;
    }
    path.remove(name);

    visited.insert(name.to_string());
    order.push(name.to_string());
    Ok(())
}
