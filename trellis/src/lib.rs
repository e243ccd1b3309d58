//! # Trellis - A Component Lifecycle Container for Rust
//!
//! Trellis manages the life of an application's components: registration,
//! dependency-ordered construction, singleton caching, orchestrated
//! initialization and shutdown, and filesystem discovery of component
//! batches, all observable through synchronous lifecycle events and
//! reported through one structured error taxonomy.
//!
//! ## Crates
//!
//! Trellis is a small workspace; this crate re-exports the whole surface:
//!
//! - **trellis-core**: the [`CoreError`] taxonomy with stable codes, cause
//!   chains, and a lossless JSON wire format
//! - **trellis-container**: the [`ComponentContainer`] with its registry,
//!   dependency resolver, instance cache, lifecycle coordinator, and
//!   [`EventEmitter`]
//! - **trellis-discovery**: the [`DiscoveryService`] pipeline and its
//!   pluggable filesystem collaborators
//!
//! ## How components fit together
//!
//! A component is registered under a unique name as a constructor, a
//! factory, or an opaque value ([`ComponentImpl`]), with its dependencies
//! declared by name. The container computes a total instantiation order
//! (dependencies first, registration order breaking ties), injects each
//! component's resolved dependencies as a [`ResolvedDeps`] mapping, caches
//! singletons, and drives optional [`Lifecycle`] hooks: `initialize` in
//! dependency order, `shutdown` in reverse, tolerating per-component
//! shutdown failures so teardown always completes.
//!
//! # Quick Start
//!
//! ```rust
//! # async fn example() -> trellis::CoreResult<()> {
//! use std::sync::Arc;
//! use trellis::{ComponentCell, ComponentContainer, ComponentImpl, Lifecycle};
//!
//! struct Database;
//!
//! #[async_trait::async_trait]
//! impl Lifecycle for Database {
//!     async fn initialize(&self) -> trellis::CoreResult<()> {
//!         // open pools, warm caches, ...
//!         Ok(())
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = ComponentContainer::new();
//! container.register(
//!     "database",
//!     ComponentImpl::constructor(&[], |_| Ok(ComponentCell::managed(Database))),
//! )?;
//! container.register(
//!     "users",
//!     ComponentImpl::constructor(&["database"], |deps| {
//!         Ok(ComponentCell::from_value(UserService {
//!             db: deps.get_as::<Database>("database")?,
//!         }))
//!     }),
//! )?;
//!
//! container.initialize().await?;
//! let users: Arc<UserService> = container.resolve_as("users").await?;
//! # let _ = users;
//! container.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Re-export error handling types
pub use trellis_core::error;
pub use trellis_core::{CoreError, CoreResult, ErrorCause, ErrorKind};

// Re-export the lifecycle_listener macro
pub use trellis_container::lifecycle_listener;

// Re-export all container types and traits
pub use trellis_container::{
    ComponentCell, ComponentContainer, ComponentDefinition, ComponentImpl, ComponentInstance,
    ComponentOptions, ConfigSchema, ConstructorFn, ContainerEvent, EventEmitter, EventListener,
    FactoryFn, Lifecycle, LifecycleListenerDefinition, Manifest, ResolvedDeps,
};

// Re-export the discovery pipeline and its collaborator contracts
pub use trellis_discovery::{
    ComponentConfig, ConfigLoader, ConfigValidator, DirectoryScanner, DiscoveredComponent,
    DiscoveryService, DiscoveryServiceBuilder, FileConfigLoader, FsDirectoryScanner,
    ImplementationLoader, SchemaConfigValidator, StaticImplementationLoader,
};
