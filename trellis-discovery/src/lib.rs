//! Trellis Discovery - Filesystem component discovery
//!
//! This crate turns directories on disk into batches of loadable component
//! definitions. A [`DiscoveryService`] scans a directory for entries, loads
//! and validates each entry's configuration against a registered manifest's
//! schema, resolves each entry's implementation, and reports the results,
//! containing per-entry failures so one broken component never blocks the
//! rest.
//!
//! All filesystem and parsing concerns live behind four injected
//! collaborators ([`DirectoryScanner`], [`ConfigLoader`], [`ConfigValidator`],
//! [`ImplementationLoader`]); default implementations cover the common
//! directory-of-config-files case, and tests swap in stubs.
//!
//! # Quick Start
//!
//! ```rust
//! # async fn example() -> trellis_core::CoreResult<()> {
//! use std::sync::Arc;
//! use trellis_container::{ComponentContainer, ComponentImpl, ConfigSchema, Manifest};
//! use trellis_discovery::{DiscoveryService, StaticImplementationLoader};
//!
//! let container = Arc::new(ComponentContainer::new());
//! container.register_manifest("plugin", Manifest::new(ConfigSchema::new(["name"])))?;
//!
//! let discovery = DiscoveryService::builder(container.clone())
//!     .with_implementation_loader(
//!         StaticImplementationLoader::new().with("metrics", ComponentImpl::value(())),
//!     )
//!     .build();
//!
//! for (name, component) in discovery.discover("plugin", "./plugins").await? {
//!     container.register(name, component.implementation)?;
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod loader;
mod pipeline;

pub use config::ComponentConfig;

pub use loader::{
    ConfigLoader, ConfigValidator, DirectoryScanner, FileConfigLoader, FsDirectoryScanner,
    ImplementationLoader, SchemaConfigValidator, StaticImplementationLoader,
};

pub use pipeline::{DiscoveredComponent, DiscoveryService, DiscoveryServiceBuilder};
