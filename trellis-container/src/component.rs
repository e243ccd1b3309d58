//! Component definitions and construction primitives
//!
//! This module provides the building blocks the container stores and
//! dispatches on: the [`ComponentImpl`] tagged implementation variant, the
//! [`ComponentCell`] a construction yields, the [`ResolvedDeps`] mapping
//! injected into constructors and factories, and the per-component
//! [`ComponentOptions`].

pub mod lifecycle;

use crate::component::lifecycle::Lifecycle;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use trellis_core::{CoreError, CoreResult};

/// Type alias for component instances stored in the container
///
/// All instances are stored as `Arc<dyn Any + Send + Sync>` to enable
/// type-safe downcasting while remaining shareable across the graph.
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// Construction function for [`ComponentImpl::Constructor`]
pub type ConstructorFn = Arc<dyn Fn(&ResolvedDeps) -> CoreResult<ComponentCell> + Send + Sync>;

/// Production function for [`ComponentImpl::Factory`]
pub type FactoryFn = Arc<dyn Fn(&ResolvedDeps) -> CoreResult<ComponentInstance> + Send + Sync>;

/// Per-component registration options
///
/// # Examples
///
/// ```rust
/// use trellis_container::ComponentOptions;
///
/// assert!(ComponentOptions::default().singleton);
/// assert!(!ComponentOptions::transient().singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Cache the first resolved instance and reuse it (the default)
    pub singleton: bool,
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self { singleton: true }
    }
}

impl ComponentOptions {
    /// Options for a component re-constructed on every resolution
    pub fn transient() -> Self {
        Self { singleton: false }
    }
}

/// The dependencies resolved for a component, keyed by component name
///
/// Constructors and factories receive this mapping as their sole argument.
/// [`get_as`](Self::get_as) keeps component code free of raw downcasts.
#[derive(Default, Clone)]
pub struct ResolvedDeps {
    components: HashMap<String, ComponentInstance>,
}

impl ResolvedDeps {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: String, instance: ComponentInstance) {
        self.components.insert(name, instance);
    }

    /// Returns the raw instance registered under `name`
    pub fn get(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.get(name)
    }

    /// Returns the dependency `name` downcast to `T`
    ///
    /// # Errors
    ///
    /// `ModuleError` `MISSING_DEPENDENCY` when `name` was not injected,
    /// `ModuleError` `DEPENDENCY_TYPE` when the instance is not a `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_container::ResolvedDeps;
    ///
    /// let deps = ResolvedDeps::new();
    /// let missing = deps.get_as::<String>("store").unwrap_err();
    /// assert_eq!(missing.code(), "MODULE_MISSING_DEPENDENCY");
    /// ```
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> CoreResult<Arc<T>> {
        let instance = self.components.get(name).ok_or_else(|| {
            CoreError::module(
                "MISSING_DEPENDENCY",
                format!("Dependency {name} was not injected"),
            )
        })?;
        instance.clone().downcast::<T>().map_err(|_| {
            CoreError::module(
                "DEPENDENCY_TYPE",
                format!("Dependency {name} has an unexpected type"),
            )
        })
    }

    /// Number of injected dependencies
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no dependencies were injected
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ResolvedDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.components.keys()).finish()
    }
}

/// The result of constructing a component: the instance plus its optional
/// lifecycle handle
///
/// Constructors return cells so a component can expose [`Lifecycle`] hooks;
/// factories and plain values yield hook-less cells.
#[derive(Clone)]
pub struct ComponentCell {
    instance: ComponentInstance,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl ComponentCell {
    /// Wraps a plain value without lifecycle hooks
    pub fn from_value<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            instance: Arc::new(value),
            lifecycle: None,
        }
    }

    /// Wraps an already-shared instance without lifecycle hooks
    pub fn from_instance(instance: ComponentInstance) -> Self {
        Self {
            instance,
            lifecycle: None,
        }
    }

    /// Wraps a value whose [`Lifecycle`] hooks the container should drive
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_container::{ComponentCell, Lifecycle};
    ///
    /// struct Scheduler;
    ///
    /// #[async_trait::async_trait]
    /// impl Lifecycle for Scheduler {}
    ///
    /// let cell = ComponentCell::managed(Scheduler);
    /// assert!(cell.lifecycle().is_some());
    /// ```
    pub fn managed<T: Lifecycle + Any + Send + Sync>(value: T) -> Self {
        let shared = Arc::new(value);
        Self {
            instance: shared.clone() as ComponentInstance,
            lifecycle: Some(shared as Arc<dyn Lifecycle>),
        }
    }

    /// The type-erased instance
    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// The lifecycle handle, when the component carries hooks
    pub fn lifecycle(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.lifecycle.as_ref()
    }
}

impl fmt::Debug for ComponentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCell")
            .field("has_lifecycle", &self.lifecycle.is_some())
            .finish_non_exhaustive()
    }
}

/// The implementation registered for a component
///
/// The variant is chosen explicitly at registration and the container
/// dispatches on the tag when materializing instances:
///
/// * `Constructor` builds a [`ComponentCell`] from its resolved
///   dependencies and may expose lifecycle hooks.
/// * `Factory` produces a plain instance from its resolved dependencies.
/// * `Value` is an opaque pre-built instance used as-is; it declares no
///   dependencies.
#[derive(Clone)]
pub enum ComponentImpl {
    /// A class-like constructor with declared dependencies
    Constructor {
        /// Names of the components injected into `construct`
        dependencies: Vec<String>,
        /// Builds the component cell from its resolved dependencies
        construct: ConstructorFn,
    },
    /// A factory function with declared dependencies
    Factory {
        /// Names of the components injected into `produce`
        dependencies: Vec<String>,
        /// Produces the instance from its resolved dependencies
        produce: FactoryFn,
    },
    /// An opaque pre-built value
    Value(ComponentInstance),
}

impl ComponentImpl {
    /// Creates a constructor implementation
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_container::{ComponentCell, ComponentImpl};
    ///
    /// struct Reporter {
    ///     greeting: String,
    /// }
    ///
    /// let implementation = ComponentImpl::constructor(&[], |_deps| {
    ///     Ok(ComponentCell::from_value(Reporter {
    ///         greeting: "hello".to_string(),
    ///     }))
    /// });
    /// assert!(implementation.dependencies().is_empty());
    /// ```
    pub fn constructor<F>(dependencies: &[&str], construct: F) -> Self
    where
        F: Fn(&ResolvedDeps) -> CoreResult<ComponentCell> + Send + Sync + 'static,
    {
        Self::Constructor {
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            construct: Arc::new(construct),
        }
    }

    /// Creates a factory implementation
    pub fn factory<F>(dependencies: &[&str], produce: F) -> Self
    where
        F: Fn(&ResolvedDeps) -> CoreResult<ComponentInstance> + Send + Sync + 'static,
    {
        Self::Factory {
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            produce: Arc::new(produce),
        }
    }

    /// Wraps an opaque value
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    /// The declared dependency names, in declaration order
    pub fn dependencies(&self) -> &[String] {
        match self {
            ComponentImpl::Constructor { dependencies, .. }
            | ComponentImpl::Factory { dependencies, .. } => dependencies,
            ComponentImpl::Value(_) => &[],
        }
    }

    /// Materializes an instance from the already-resolved dependencies
    pub(crate) fn instantiate(&self, deps: &ResolvedDeps) -> CoreResult<ComponentCell> {
        match self {
            ComponentImpl::Constructor { construct, .. } => (**construct)(deps),
            ComponentImpl::Factory { produce, .. } => {
                Ok(ComponentCell::from_instance((**produce)(deps)?))
            }
            ComponentImpl::Value(value) => Ok(ComponentCell::from_instance(value.clone())),
        }
    }
}

impl fmt::Debug for ComponentImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentImpl::Constructor { dependencies, .. } => f
                .debug_struct("Constructor")
                .field("dependencies", dependencies)
                .finish_non_exhaustive(),
            ComponentImpl::Factory { dependencies, .. } => f
                .debug_struct("Factory")
                .field("dependencies", dependencies)
                .finish_non_exhaustive(),
            ComponentImpl::Value(_) => write!(f, "Value(<instance>)"),
        }
    }
}

/// A registered component: name, implementation, options, and the
/// dependency list recorded from the implementation at registration time
pub struct ComponentDefinition {
    pub(crate) name: String,
    pub(crate) implementation: ComponentImpl,
    pub(crate) options: ComponentOptions,
    pub(crate) dependencies: Vec<String>,
}

impl ComponentDefinition {
    pub(crate) fn new(
        name: String,
        implementation: ComponentImpl,
        options: ComponentOptions,
    ) -> Self {
        let dependencies = implementation.dependencies().to_vec();
        Self {
            name,
            implementation,
            options,
            dependencies,
        }
    }

    /// The component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registration options
    pub fn options(&self) -> ComponentOptions {
        self.options
    }

    /// The declared dependency names
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// The registered implementation
    pub fn implementation(&self) -> &ComponentImpl {
        &self.implementation
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("singleton", &self.options.singleton)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Settings {
        retries: u32,
    }

    #[test]
    fn test_options_default_to_singleton() {
        assert!(ComponentOptions::default().singleton);
        assert!(!ComponentOptions::transient().singleton);
    }

    #[test]
    fn test_resolved_deps_typed_access() {
        let mut deps = ResolvedDeps::new();
        deps.insert("settings".to_string(), Arc::new(Settings { retries: 3 }));

        let settings = deps.get_as::<Settings>("settings").expect("typed access");
        assert_eq!(settings.retries, 3);

        let missing = deps.get_as::<Settings>("absent").unwrap_err();
        assert_eq!(missing.code(), "MODULE_MISSING_DEPENDENCY");

        let mistyped = deps.get_as::<String>("settings").unwrap_err();
        assert_eq!(mistyped.code(), "MODULE_DEPENDENCY_TYPE");
    }

    #[test]
    fn test_value_has_no_dependencies() {
        let implementation = ComponentImpl::value(Settings { retries: 1 });
        assert!(implementation.dependencies().is_empty());

        let cell = implementation.instantiate(&ResolvedDeps::new()).expect("instantiate");
        assert!(cell.lifecycle().is_none());
        let settings = cell
            .instance()
            .clone()
            .downcast::<Settings>()
            .expect("downcast");
        assert_eq!(settings.retries, 1);
    }

    #[test]
    fn test_value_instances_are_shared() {
        let implementation = ComponentImpl::value(Settings { retries: 9 });
        let first = implementation.instantiate(&ResolvedDeps::new()).expect("first");
        let second = implementation.instantiate(&ResolvedDeps::new()).expect("second");
        assert!(Arc::ptr_eq(first.instance(), second.instance()));
    }

    #[test]
    fn test_factory_receives_dependencies() {
        let implementation = ComponentImpl::factory(&["settings"], |deps| {
            let settings = deps.get_as::<Settings>("settings")?;
            Ok(Arc::new(settings.retries * 2) as ComponentInstance)
        });
        assert_eq!(implementation.dependencies(), ["settings".to_string()]);

        let mut deps = ResolvedDeps::new();
        deps.insert("settings".to_string(), Arc::new(Settings { retries: 21 }));
        let cell = implementation.instantiate(&deps).expect("instantiate");
        let doubled = cell.instance().clone().downcast::<u32>().expect("downcast");
        assert_eq!(*doubled, 42);
    }

    #[test]
    fn test_constructor_errors_propagate() {
        let implementation = ComponentImpl::constructor(&[], |_| {
            Err(trellis_core::CoreError::module("INIT_FAILED", "no disk space"))
        });
        let err = implementation.instantiate(&ResolvedDeps::new()).unwrap_err();
        assert_eq!(err.code(), "MODULE_INIT_FAILED");
    }

    #[test]
    fn test_definition_records_implementation_dependencies() {
        let implementation = ComponentImpl::constructor(&["a", "b"], |_| {
            Ok(ComponentCell::from_value(()))
        });
        let definition = ComponentDefinition::new(
            "svc".to_string(),
            implementation,
            ComponentOptions::default(),
        );
        assert_eq!(definition.name(), "svc");
        assert_eq!(definition.dependencies(), ["a".to_string(), "b".to_string()]);
        assert!(definition.options().singleton);
    }
}
