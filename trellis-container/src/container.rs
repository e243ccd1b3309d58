//! The component lifecycle container
//!
//! `ComponentContainer` owns the registry of component definitions, the
//! singleton instance cache, the manifest store, and the event emitter. It
//! materializes instances on demand with their dependencies injected, drives
//! orchestrated initialization across the dependency graph, and tears the
//! graph down in reverse order, containing per-component shutdown failures.

use crate::component::{
    ComponentCell, ComponentDefinition, ComponentImpl, ComponentInstance, ComponentOptions,
    ResolvedDeps,
};
use crate::event::{ContainerEvent, EventEmitter};
use crate::manifest::Manifest;
use crate::registry::ComponentRegistry;
use crate::resolver;
use dashmap::DashMap;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use trellis_core::{CoreError, CoreResult};

/// The central component lifecycle container
///
/// The container moves between two phases: *uninitialized* and
/// *initialized*. [`initialize`](Self::initialize) resolves the full
/// dependency order, constructs every component, and runs their
/// `initialize` hooks; [`shutdown`](Self::shutdown) runs `shutdown` hooks in
/// reverse resolution order, clears the singleton cache, and returns to the
/// uninitialized phase. [`resolve`](Self::resolve) works in either phase;
/// once the container is initialized, newly constructed components are
/// initialized inline.
///
/// The container is not designed for concurrent entry: callers serialize
/// mutations and `initialize`/`shutdown` calls on one logical lane.
///
/// # Examples
///
/// ```rust
/// # async fn example() -> trellis_core::CoreResult<()> {
/// use std::sync::Arc;
/// use trellis_container::{ComponentCell, ComponentContainer, ComponentImpl};
///
/// struct Clock;
/// struct Journal {
///     clock: Arc<Clock>,
/// }
///
/// let container = ComponentContainer::new();
/// container.register(
///     "clock",
///     ComponentImpl::constructor(&[], |_| Ok(ComponentCell::from_value(Clock))),
/// )?;
/// container.register(
///     "journal",
///     ComponentImpl::constructor(&["clock"], |deps| {
///         Ok(ComponentCell::from_value(Journal {
///             clock: deps.get_as::<Clock>("clock")?,
///         }))
///     }),
/// )?;
///
/// container.initialize().await?;
/// let journal: Arc<Journal> = container.resolve_as("journal").await?;
/// # let _ = journal;
/// container.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ComponentContainer {
    /// Component definitions in registration order
    registry: RwLock<ComponentRegistry>,
    /// Manifests keyed by type name
    manifests: DashMap<String, Arc<Manifest>>,
    /// Singleton cache, populated at first resolution
    instances: DashMap<String, ComponentCell>,
    /// Names in the order their singletons entered the cache
    resolution_order: Mutex<Vec<String>>,
    /// Whether `initialize` has completed
    initialized: AtomicBool,
    /// Event publisher for lifecycle events
    emitter: Arc<EventEmitter>,
}

impl ComponentContainer {
    /// Creates an empty, uninitialized container
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(ComponentRegistry::new()),
            manifests: DashMap::new(),
            instances: DashMap::new(),
            resolution_order: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            emitter: Arc::new(EventEmitter::new()),
        }
    }

    /// The container's event emitter, for subscribing to lifecycle events
    pub fn events(&self) -> &EventEmitter {
        &self.emitter
    }

    /// Whether the container is currently in the initialized phase
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Registers a component under a unique name with default options
    ///
    /// The dependency list is recorded from the implementation. Emits
    /// `component:registered`.
    ///
    /// # Errors
    ///
    /// `ConfigError` `ALREADY_REGISTERED` when the name is in use.
    pub fn register(
        &self,
        name: impl Into<String>,
        implementation: ComponentImpl,
    ) -> CoreResult<()> {
        self.register_with_options(name, implementation, ComponentOptions::default())
    }

    /// Registers a component with explicit options
    pub fn register_with_options(
        &self,
        name: impl Into<String>,
        implementation: ComponentImpl,
        options: ComponentOptions,
    ) -> CoreResult<()> {
        let name = name.into();
        self.registry.write().insert(ComponentDefinition::new(
            name.clone(),
            implementation,
            options,
        ))?;
        tracing::debug!(component = %name, "component registered");
        self.emitter
            .emit(&ContainerEvent::ComponentRegistered { name });
        Ok(())
    }

    /// Registers a manifest under a unique type name
    ///
    /// Emits `manifest:registered`.
    ///
    /// # Errors
    ///
    /// `ConfigError` `MANIFEST_EXISTS` when the type is in use.
    pub fn register_manifest(
        &self,
        manifest_type: impl Into<String>,
        manifest: Manifest,
    ) -> CoreResult<()> {
        let manifest_type = manifest_type.into();
        if self.manifests.contains_key(&manifest_type) {
            return Err(CoreError::config(
                "MANIFEST_EXISTS",
                format!("Manifest already registered for type: {manifest_type}"),
            ));
        }
        self.manifests
            .insert(manifest_type.clone(), Arc::new(manifest));
        tracing::debug!(manifest_type = %manifest_type, "manifest registered");
        self.emitter
            .emit(&ContainerEvent::ManifestRegistered { manifest_type });
        Ok(())
    }

    /// Returns the manifest registered under a type name
    pub fn manifest(&self, manifest_type: &str) -> Option<Arc<Manifest>> {
        self.manifests.get(manifest_type).map(|m| m.value().clone())
    }

    /// Whether a manifest is registered under the type name
    pub fn has_manifest(&self, manifest_type: &str) -> bool {
        self.manifests.contains_key(manifest_type)
    }

    /// Whether a component is registered under the name
    pub fn has_component(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    /// Registered component names, in registration order
    pub fn component_names(&self) -> Vec<String> {
        self.registry.read().names().to_vec()
    }

    /// Computes the instantiation order for all registered components
    ///
    /// Every component appears after all of its declared dependencies;
    /// otherwise-unordered components keep registration order.
    ///
    /// # Errors
    ///
    /// `ConfigError` `MISSING_DEPENDENCY` or `CIRCULAR_DEPENDENCY`.
    pub fn resolve_dependency_order(&self) -> CoreResult<Vec<String>> {
        resolver::resolve_order(&self.registry.read())
    }

    /// Resolves a component instance by name
    ///
    /// Singletons are constructed once and cached; non-singletons are
    /// constructed fresh on every call. Dependencies are resolved
    /// recursively in declared order. When the container is already
    /// initialized, a newly constructed component's `initialize` hook runs
    /// before this method returns. Emits `component:resolved` for every
    /// construction.
    ///
    /// # Errors
    ///
    /// `ServiceError` `UNKNOWN_COMPONENT` for unregistered names;
    /// construction and initialization errors propagate verbatim.
    pub async fn resolve(&self, name: &str) -> CoreResult<ComponentInstance> {
        Ok(self.resolve_cell(name).await?.instance().clone())
    }

    /// Resolves a component and downcasts it to `T`
    ///
    /// # Errors
    ///
    /// Everything [`resolve`](Self::resolve) raises, plus `ServiceError`
    /// `TYPE_MISMATCH` when the instance is not a `T`.
    pub async fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> CoreResult<Arc<T>> {
        self.resolve(name).await?.downcast::<T>().map_err(|_| {
            CoreError::service(
                "TYPE_MISMATCH",
                format!("Component {name} has an unexpected type"),
            )
        })
    }

    fn resolve_cell<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CoreResult<ComponentCell>> {
        Box::pin(async move {
            let definition = self.registry.read().get(name).ok_or_else(|| {
                CoreError::service(
                    "UNKNOWN_COMPONENT",
                    format!("Component {name} is not registered"),
                )
            })?;

            if definition.options().singleton
                && let Some(existing) = self.instances.get(name)
            {
                return Ok(existing.value().clone());
            }

            let mut deps = ResolvedDeps::new();
            for dependency in definition.dependencies() {
                let cell = self.resolve_cell(dependency).await?;
                deps.insert(dependency.clone(), cell.instance().clone());
            }

            let cell = definition.implementation().instantiate(&deps)?;

            if definition.options().singleton {
                self.instances.insert(name.to_string(), cell.clone());
                self.resolution_order.lock().push(name.to_string());
            }

            if self.initialized.load(Ordering::SeqCst)
                && let Some(lifecycle) = cell.lifecycle()
            {
                lifecycle.initialize().await?;
            }

            tracing::debug!(component = %name, "component resolved");
            self.emitter.emit(&ContainerEvent::ComponentResolved {
                name: name.to_string(),
                instance: cell.instance().clone(),
            });

            Ok(cell)
        })
    }

    /// Initializes the whole component graph
    ///
    /// Resolves the dependency order, constructs every component in that
    /// order, and awaits each component's `initialize` hook. Any failure
    /// aborts the operation and propagates; the container stays
    /// uninitialized. On success the phase flips and `initialized` is
    /// emitted.
    ///
    /// # Errors
    ///
    /// `ServiceError` `ALREADY_INITIALIZED` on a second call; order
    /// computation, construction, and hook errors propagate.
    pub async fn initialize(&self) -> CoreResult<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Err(CoreError::service(
                "ALREADY_INITIALIZED",
                "Container is already initialized",
            ));
        }

        let order = self.resolve_dependency_order()?;
        tracing::info!(components = order.len(), "initializing container");

        for name in &order {
            let cell = self.resolve_cell(name).await?;
            if let Some(lifecycle) = cell.lifecycle() {
                tracing::debug!(component = %name, "running component initialize");
                lifecycle.initialize().await?;
            }
        }

        self.initialized.store(true, Ordering::SeqCst);
        self.emitter.emit(&ContainerEvent::Initialized);
        tracing::info!("container initialized");
        Ok(())
    }

    /// Shuts the component graph down
    ///
    /// Traverses cached instances in reverse resolution order and awaits
    /// each component's `shutdown` hook. Hook failures are contained: they
    /// are logged, emitted as `shutdown:error`, and the traversal continues.
    /// Afterwards the instance cache is cleared, the phase returns to
    /// uninitialized, and `shutdown` is emitted. Calling this on a container
    /// that was never initialized is a no-op.
    pub async fn shutdown(&self) {
        if !self.initialized.load(Ordering::SeqCst) {
            return;
        }

        let order: Vec<String> = {
            let order = self.resolution_order.lock();
            order.iter().rev().cloned().collect()
        };
        tracing::info!(components = order.len(), "shutting down container");

        for name in order {
            let lifecycle = self
                .instances
                .get(&name)
                .and_then(|cell| cell.lifecycle().cloned());
            if let Some(lifecycle) = lifecycle
                && let Err(error) = lifecycle.shutdown().await
            {
                tracing::warn!(component = %name, error = %error, "component shutdown failed");
                self.emitter.emit(&ContainerEvent::ShutdownError {
                    name,
                    error: Arc::new(error),
                });
            }
        }

        self.instances.clear();
        self.resolution_order.lock().clear();
        self.initialized.store(false, Ordering::SeqCst);
        self.emitter.emit(&ContainerEvent::Shutdown);
        tracing::info!("container shut down");
    }
}

impl Default for ComponentContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContainer")
            .field("components", &self.registry.read().names())
            .field("cached_instances", &self.instances.len())
            .field("initialized", &self.initialized.load(Ordering::SeqCst))
            .finish()
    }
}
