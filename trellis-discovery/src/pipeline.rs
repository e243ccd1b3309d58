//! The discovery pipeline
//!
//! `DiscoveryService` turns a directory of component entries into a batch of
//! loadable component definitions: scan the directory, load and validate
//! each entry's configuration against the manifest's schema, resolve each
//! entry's implementation, and report per-entry failures without aborting
//! the run.

use crate::config::ComponentConfig;
use crate::loader::{
    ConfigLoader, ConfigValidator, DirectoryScanner, FileConfigLoader, FsDirectoryScanner,
    ImplementationLoader, SchemaConfigValidator, StaticImplementationLoader,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use trellis_container::{ComponentContainer, ComponentImpl, ContainerEvent, Manifest};
use trellis_core::{CoreError, CoreResult, ErrorCause};

/// A successfully loaded discovery entry
#[derive(Debug, Clone)]
pub struct DiscoveredComponent {
    /// The component name, taken from the configuration
    pub name: String,
    /// The validated configuration
    pub config: ComponentConfig,
    /// The implementation resolved for the entry
    pub implementation: ComponentImpl,
}

/// Builder for a [`DiscoveryService`] with swappable collaborators
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use trellis_container::{ComponentContainer, ComponentImpl};
/// use trellis_discovery::{DiscoveryService, StaticImplementationLoader};
///
/// let container = Arc::new(ComponentContainer::new());
/// let discovery = DiscoveryService::builder(container)
///     .with_implementation_loader(
///         StaticImplementationLoader::new().with("metrics", ComponentImpl::value(())),
///     )
///     .build();
/// # let _ = discovery;
/// ```
pub struct DiscoveryServiceBuilder {
    container: Arc<ComponentContainer>,
    scanner: Arc<dyn DirectoryScanner>,
    config_loader: Arc<dyn ConfigLoader>,
    validator: Arc<dyn ConfigValidator>,
    implementation_loader: Arc<dyn ImplementationLoader>,
}

impl DiscoveryServiceBuilder {
    fn new(container: Arc<ComponentContainer>) -> Self {
        Self {
            container,
            scanner: Arc::new(FsDirectoryScanner),
            config_loader: Arc::new(FileConfigLoader::default()),
            validator: Arc::new(SchemaConfigValidator),
            implementation_loader: Arc::new(StaticImplementationLoader::new()),
        }
    }

    /// Replaces the directory scanner
    pub fn with_scanner(mut self, scanner: impl DirectoryScanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    /// Replaces the configuration loader
    pub fn with_config_loader(mut self, config_loader: impl ConfigLoader + 'static) -> Self {
        self.config_loader = Arc::new(config_loader);
        self
    }

    /// Replaces the configuration validator
    pub fn with_validator(mut self, validator: impl ConfigValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Replaces the implementation loader
    pub fn with_implementation_loader(
        mut self,
        implementation_loader: impl ImplementationLoader + 'static,
    ) -> Self {
        self.implementation_loader = Arc::new(implementation_loader);
        self
    }

    /// Builds the discovery service
    pub fn build(self) -> DiscoveryService {
        DiscoveryService {
            container: self.container,
            scanner: self.scanner,
            config_loader: self.config_loader,
            validator: self.validator,
            implementation_loader: self.implementation_loader,
        }
    }
}

/// Filesystem-based component discovery against registered manifests
///
/// Discovery emits through the container's event emitter: `discovery:error`
/// for each contained per-entry failure and `discovery:completed` once the
/// run finishes.
pub struct DiscoveryService {
    container: Arc<ComponentContainer>,
    scanner: Arc<dyn DirectoryScanner>,
    config_loader: Arc<dyn ConfigLoader>,
    validator: Arc<dyn ConfigValidator>,
    implementation_loader: Arc<dyn ImplementationLoader>,
}

impl DiscoveryService {
    /// Creates a service with the default collaborators
    ///
    /// The default implementation loader has nothing linked; most hosts want
    /// [`builder`](Self::builder) to supply one.
    pub fn new(container: Arc<ComponentContainer>) -> Self {
        Self::builder(container).build()
    }

    /// Starts building a service with swappable collaborators
    pub fn builder(container: Arc<ComponentContainer>) -> DiscoveryServiceBuilder {
        DiscoveryServiceBuilder::new(container)
    }

    /// Discovers components of a manifest type under a directory
    ///
    /// Returns the loaded components keyed by name. Disabled entries are
    /// skipped silently; entries that fail to load are reported through
    /// `discovery:error` events and do not abort the run.
    ///
    /// # Errors
    ///
    /// `ConfigError` `UNKNOWN_TYPE` when no manifest is registered for the
    /// type; `ServiceError` `DISCOVERY_FAILED` when the directory scan
    /// itself fails.
    pub async fn discover(
        &self,
        manifest_type: &str,
        path: impl AsRef<Path>,
    ) -> CoreResult<HashMap<String, DiscoveredComponent>> {
        let path = path.as_ref();
        let manifest = self.container.manifest(manifest_type).ok_or_else(|| {
            CoreError::config(
                "UNKNOWN_TYPE",
                format!("No manifest registered for type: {manifest_type}"),
            )
        })?;

        let entries = self.scanner.scan_directory(path).await.map_err(|error| {
            CoreError::service(
                "DISCOVERY_FAILED",
                format!("Failed to discover {manifest_type} components"),
            )
            .with_cause(ErrorCause::from(&error))
        })?;
        tracing::debug!(manifest_type, entries = entries.len(), "scanning for components");

        let mut discovered = HashMap::new();
        for entry in entries {
            match self.load_component(&entry, &manifest).await {
                Ok(Some(component)) => {
                    discovered.insert(component.name.clone(), component);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        entry = %entry.display(),
                        error = %error,
                        "failed to load discovered component",
                    );
                    self.container.events().emit(&ContainerEvent::DiscoveryError {
                        entry: entry.display().to_string(),
                        error: Arc::new(error),
                    });
                }
            }
        }

        let count = discovered.len();
        self.container
            .events()
            .emit(&ContainerEvent::DiscoveryCompleted {
                manifest_type: manifest_type.to_string(),
                count,
            });
        tracing::info!(manifest_type, count, "discovery completed");
        Ok(discovered)
    }

    async fn load_component(
        &self,
        entry: &Path,
        manifest: &Manifest,
    ) -> CoreResult<Option<DiscoveredComponent>> {
        let config = self.config_loader.load_config(entry).await.map_err(|error| {
            CoreError::config(
                "CONFIG_LOAD_FAILED",
                format!("Failed to load configuration from {}", entry.display()),
            )
            .with_cause(ErrorCause::from(&error))
        })?;

        if !config.enabled() {
            tracing::debug!(entry = %entry.display(), "entry disabled, skipping");
            return Ok(None);
        }

        match self.validator.validate_config(&config, &manifest.config_schema) {
            Ok(true) => {}
            Ok(false) => {
                return Err(CoreError::config(
                    "INVALID_CONFIG",
                    format!("Invalid configuration for entry {}", entry.display()),
                ));
            }
            Err(error) => {
                return Err(CoreError::config(
                    "INVALID_CONFIG",
                    format!("Invalid configuration for entry {}", entry.display()),
                )
                .with_cause(ErrorCause::from(&error)));
            }
        }

        let name = config.name().map(str::to_string).ok_or_else(|| {
            CoreError::config(
                "INVALID_CONFIG",
                format!(
                    "Configuration for entry {} does not name a component",
                    entry.display()
                ),
            )
        })?;

        let implementation = self
            .implementation_loader
            .load_implementation(entry)
            .await
            .map_err(|error| {
                CoreError::config(
                    "LOAD_FAILED",
                    format!("Failed to load component from {}", entry.display()),
                )
                .with_cause(ErrorCause::from(&error))
            })?;

        Ok(Some(DiscoveredComponent {
            name,
            config,
            implementation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::path::PathBuf;
    use trellis_container::ConfigSchema;

    struct StubScanner {
        entries: Vec<&'static str>,
    }

    #[async_trait]
    impl DirectoryScanner for StubScanner {
        async fn scan_directory(&self, _path: &Path) -> anyhow::Result<Vec<PathBuf>> {
            Ok(self.entries.iter().map(PathBuf::from).collect())
        }
    }

    struct FailingScanner;

    #[async_trait]
    impl DirectoryScanner for FailingScanner {
        async fn scan_directory(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
            anyhow::bail!("cannot read directory {}", path.display())
        }
    }

    struct StubConfigLoader {
        configs: HashMap<&'static str, serde_json::Value>,
    }

    #[async_trait]
    impl ConfigLoader for StubConfigLoader {
        async fn load_config(&self, entry: &Path) -> anyhow::Result<ComponentConfig> {
            let key = entry.to_str().unwrap_or_default();
            let value = self
                .configs
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no configuration for {key}"))?;
            ComponentConfig::from_value(value)
                .ok_or_else(|| anyhow::anyhow!("configuration for {key} is not a mapping"))
        }
    }

    fn container_with_manifest(required: &[&str]) -> Arc<ComponentContainer> {
        let container = Arc::new(ComponentContainer::new());
        container
            .register_manifest(
                "plugin",
                Manifest::new(ConfigSchema::new(required.iter().copied())),
            )
            .expect("manifest");
        container
    }

    fn capture_events(container: &ComponentContainer) -> Arc<Mutex<Vec<String>>> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let errors = captured.clone();
        container
            .events()
            .on(ContainerEvent::DISCOVERY_ERROR, move |event| {
                if let ContainerEvent::DiscoveryError { entry, error } = event {
                    errors.lock().push(format!("error:{entry}:{}", error.code()));
                }
            });
        let completed = captured.clone();
        container
            .events()
            .on(ContainerEvent::DISCOVERY_COMPLETED, move |event| {
                if let ContainerEvent::DiscoveryCompleted {
                    manifest_type,
                    count,
                } = event
                {
                    completed.lock().push(format!("completed:{manifest_type}:{count}"));
                }
            });
        captured
    }

    #[tokio::test]
    async fn test_unknown_manifest_type() {
        let container = Arc::new(ComponentContainer::new());
        let discovery = DiscoveryService::new(container);

        let err = discovery.discover("plugin", "/plugins").await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_UNKNOWN_TYPE");
        assert_eq!(err.message(), "No manifest registered for type: plugin");
    }

    #[tokio::test]
    async fn test_scan_failure_is_fatal() {
        let container = container_with_manifest(&[]);
        let discovery = DiscoveryService::builder(container)
            .with_scanner(FailingScanner)
            .build();

        let err = discovery.discover("plugin", "/plugins").await.unwrap_err();
        assert_eq!(err.code(), "SERVICE_DISCOVERY_FAILED");
        assert_eq!(err.message(), "Failed to discover plugin components");
        let cause = err.cause().expect("scan error as cause");
        assert!(cause.message.contains("cannot read directory"));
    }

    #[tokio::test]
    async fn test_disabled_entries_are_skipped() {
        let container = container_with_manifest(&[]);
        let events = capture_events(&container);
        let discovery = DiscoveryService::builder(container)
            .with_scanner(StubScanner {
                entries: vec!["/p/one"],
            })
            .with_config_loader(StubConfigLoader {
                configs: HashMap::from([("/p/one", json!({ "enabled": false }))]),
            })
            .build();

        let discovered = discovery.discover("plugin", "/p").await.expect("discover");
        assert!(discovered.is_empty());
        assert_eq!(*events.lock(), vec!["completed:plugin:0".to_string()]);
    }

    #[tokio::test]
    async fn test_per_entry_failures_are_contained() {
        let container = container_with_manifest(&["name"]);
        let events = capture_events(&container);
        let discovery = DiscoveryService::builder(container)
            .with_scanner(StubScanner {
                entries: vec!["/p/broken", "/p/good"],
            })
            .with_config_loader(StubConfigLoader {
                configs: HashMap::from([
                    // fails validation: required `name` missing
                    ("/p/broken", json!({ "enabled": true })),
                    ("/p/good", json!({ "name": "good", "enabled": true })),
                ]),
            })
            .with_implementation_loader(
                StaticImplementationLoader::new().with("good", ComponentImpl::value(())),
            )
            .build();

        let discovered = discovery.discover("plugin", "/p").await.expect("discover");
        assert_eq!(discovered.len(), 1);
        assert!(discovered.contains_key("good"));
        assert_eq!(
            *events.lock(),
            vec![
                "error:/p/broken:CONFIG_INVALID_CONFIG".to_string(),
                "completed:plugin:1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_config_load_failure_carries_cause() {
        let container = container_with_manifest(&[]);
        let events = capture_events(&container);
        let discovery = DiscoveryService::builder(container)
            .with_scanner(StubScanner {
                entries: vec!["/p/ghost"],
            })
            .with_config_loader(StubConfigLoader {
                configs: HashMap::new(),
            })
            .build();

        let discovered = discovery.discover("plugin", "/p").await.expect("discover");
        assert!(discovered.is_empty());
        assert_eq!(
            *events.lock(),
            vec![
                "error:/p/ghost:CONFIG_CONFIG_LOAD_FAILED".to_string(),
                "completed:plugin:0".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_implementation_load_failure() {
        let container = container_with_manifest(&[]);
        let events = capture_events(&container);
        let discovery = DiscoveryService::builder(container.clone())
            .with_scanner(StubScanner {
                entries: vec!["/p/orphan"],
            })
            .with_config_loader(StubConfigLoader {
                configs: HashMap::from([("/p/orphan", json!({ "name": "orphan", "enabled": true }))]),
            })
            .build();

        // capture the error payload to check the wrapped message
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        container
            .events()
            .on(ContainerEvent::DISCOVERY_ERROR, move |event| {
                if let ContainerEvent::DiscoveryError { error, .. } = event {
                    sink.lock().push(error.message().to_string());
                }
            });

        let discovered = discovery.discover("plugin", "/p").await.expect("discover");
        assert!(discovered.is_empty());
        assert_eq!(
            *events.lock(),
            vec![
                "error:/p/orphan:CONFIG_LOAD_FAILED".to_string(),
                "completed:plugin:0".to_string(),
            ]
        );
        assert_eq!(
            *messages.lock(),
            vec!["Failed to load component from /p/orphan".to_string()]
        );
    }

    #[tokio::test]
    async fn test_discovered_components_are_keyed_by_name() {
        let container = container_with_manifest(&["name"]);
        let discovery = DiscoveryService::builder(container)
            .with_scanner(StubScanner {
                entries: vec!["/p/metrics", "/p/mailer"],
            })
            .with_config_loader(StubConfigLoader {
                configs: HashMap::from([
                    ("/p/metrics", json!({ "name": "metrics", "enabled": true })),
                    ("/p/mailer", json!({ "name": "mailer", "enabled": true })),
                ]),
            })
            .with_implementation_loader(
                StaticImplementationLoader::new()
                    .with("metrics", ComponentImpl::value(1_u8))
                    .with("mailer", ComponentImpl::value(2_u8)),
            )
            .build();

        let discovered = discovery.discover("plugin", "/p").await.expect("discover");
        assert_eq!(discovered.len(), 2);
        let metrics = &discovered["metrics"];
        assert_eq!(metrics.name, "metrics");
        assert_eq!(metrics.config.name(), Some("metrics"));
    }
}
