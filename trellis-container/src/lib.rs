//! Trellis Container - Component lifecycle container core
//!
//! This crate provides the runtime container at the heart of Trellis: a
//! string-keyed registry of component definitions, a deterministic
//! dependency resolver, a singleton instance cache with dependency
//! injection, an orchestrated initialize/shutdown coordinator, and a
//! synchronous lifecycle event emitter.
//!
//! ## Core Features
//!
//! * **Explicit implementations**: components register as a constructor, a
//!   factory, or an opaque value ([`ComponentImpl`]); the container
//!   dispatches on the tag.
//! * **Deterministic ordering**: instantiation follows the dependency graph
//!   with registration order as the tie-break, and shutdown runs in exact
//!   reverse.
//! * **Singleton and transient scopes**: first-resolved singletons are
//!   cached until shutdown; transients are rebuilt on every resolution.
//! * **Error-tolerant teardown**: per-component shutdown failures are
//!   contained and surfaced as `shutdown:error` events.
//! * **Lifecycle events**: every registration, resolution, and phase change
//!   is observable through the [`EventEmitter`].
//!
//! # Quick Start
//!
//! ```rust
//! # async fn example() -> trellis_core::CoreResult<()> {
//! use std::sync::Arc;
//! use trellis_container::{ComponentCell, ComponentContainer, ComponentImpl};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let container = ComponentContainer::new();
//! container.register(
//!     "greeter",
//!     ComponentImpl::constructor(&[], |_| {
//!         Ok(ComponentCell::from_value(Greeter { greeting: "hello" }))
//!     }),
//! )?;
//!
//! container.initialize().await?;
//! let greeter: Arc<Greeter> = container.resolve_as("greeter").await?;
//! assert_eq!(greeter.greeting, "hello");
//! # Ok(())
//! # }
//! ```

mod component;
mod container;
mod event;
mod manifest;
mod registry;
mod resolver;

pub use component::{
    ComponentCell, ComponentDefinition, ComponentImpl, ComponentInstance, ComponentOptions,
    ConstructorFn, FactoryFn, ResolvedDeps, lifecycle::Lifecycle,
};

pub use container::ComponentContainer;

pub use event::{ContainerEvent, EventEmitter, EventListener, LifecycleListenerDefinition};

pub use manifest::{ConfigSchema, Manifest};

/// Macro for registering lifecycle event listeners
///
/// Statically registers a handler that receives every [`ContainerEvent`]
/// emitted by any [`EventEmitter`] created after program start.
///
/// # Arguments
///
/// * `$name` - A string literal identifying the listener
/// * `$handler` - A function that handles container events
///
/// # Examples
///
/// ```rust
/// use trellis_container::{ContainerEvent, lifecycle_listener};
///
/// fn audit(event: &ContainerEvent) {
///     if let ContainerEvent::Initialized = event {
///         println!("container came up");
///     }
/// }
///
/// lifecycle_listener!("audit", audit);
/// ```
#[macro_export]
macro_rules! lifecycle_listener {
    ($name:expr, $handler:expr) => {
        inventory::submit! {
            $crate::LifecycleListenerDefinition {
                name: $name,
                handler: $handler,
            }
        }
    };
}
