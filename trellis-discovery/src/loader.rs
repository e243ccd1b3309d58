//! Discovery collaborators
//!
//! The pipeline never touches the filesystem or parses configuration itself;
//! it calls the four contracts below. Each has a default implementation for
//! the common case (directory entries on disk, `component.toml`/`.yaml`
//! configuration files, required-key schema checks, implementations linked
//! into the binary), and tests or embedders swap in their own.

use crate::config::ComponentConfig;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use trellis_container::{ComponentImpl, ConfigSchema};

/// Enumerates candidate entries under a directory
#[async_trait]
pub trait DirectoryScanner: Send + Sync {
    /// Returns the entry paths to consider for discovery
    async fn scan_directory(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>>;
}

/// Loads the declarative configuration for an entry
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// Returns the configuration mapping for an entry
    async fn load_config(&self, entry: &Path) -> anyhow::Result<ComponentConfig>;
}

/// Validates a configuration against a manifest schema
///
/// Returning `Ok(false)` or an error both mark the configuration invalid;
/// the error additionally becomes the cause of the reported failure.
pub trait ConfigValidator: Send + Sync {
    /// Returns whether the configuration satisfies the schema
    fn validate_config(
        &self,
        config: &ComponentConfig,
        schema: &ConfigSchema,
    ) -> anyhow::Result<bool>;
}

/// Resolves the implementation for an entry
#[async_trait]
pub trait ImplementationLoader: Send + Sync {
    /// Returns the component implementation for an entry
    async fn load_implementation(&self, entry: &Path) -> anyhow::Result<ComponentImpl>;
}

/// Default scanner: immediate subdirectories of the scanned path, sorted
///
/// Sorting keeps discovery deterministic across filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryScanner;

#[async_trait]
impl DirectoryScanner for FsDirectoryScanner {
    async fn scan_directory(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut dir = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("cannot read directory {}", path.display()))?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                entries.push(entry.path());
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// Default config loader: a `component.toml` or `component.yaml`/`.yml`
/// file inside the entry directory, normalized to a JSON mapping
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    file_names: Vec<String>,
}

impl FileConfigLoader {
    /// Creates a loader probing the given file names in order
    pub fn new<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_names: file_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new(["component.toml", "component.yaml", "component.yml"])
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load_config(&self, entry: &Path) -> anyhow::Result<ComponentConfig> {
        for file_name in &self.file_names {
            let candidate = entry.join(file_name);
            if !tokio::fs::try_exists(&candidate).await? {
                continue;
            }
            let content = tokio::fs::read_to_string(&candidate)
                .await
                .with_context(|| format!("cannot read {}", candidate.display()))?;

            let value = if candidate.extension().and_then(|e| e.to_str()) == Some("toml") {
                let parsed: toml::Value = toml::from_str(&content)
                    .with_context(|| format!("invalid TOML in {}", candidate.display()))?;
                serde_json::to_value(parsed)?
            } else {
                let parsed: serde_yaml::Value = serde_yaml::from_str(&content)
                    .with_context(|| format!("invalid YAML in {}", candidate.display()))?;
                serde_json::to_value(parsed)?
            };

            return ComponentConfig::from_value(value).with_context(|| {
                format!("{} is not a table of keys", candidate.display())
            });
        }
        anyhow::bail!("no component configuration found in {}", entry.display())
    }
}

/// Default validator: every `required` key must be present and non-null
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaConfigValidator;

impl ConfigValidator for SchemaConfigValidator {
    fn validate_config(
        &self,
        config: &ComponentConfig,
        schema: &ConfigSchema,
    ) -> anyhow::Result<bool> {
        for key in &schema.required {
            match config.get(key) {
                None | Some(serde_json::Value::Null) => return Ok(false),
                Some(_) => {}
            }
        }
        Ok(true)
    }
}

/// Default implementation loader: a table of implementations linked into the
/// binary, keyed by entry directory name
///
/// Rust has no portable runtime module loading, so hosts pre-register the
/// implementations their component directories refer to.
///
/// # Examples
///
/// ```rust
/// use trellis_container::ComponentImpl;
/// use trellis_discovery::StaticImplementationLoader;
///
/// let loader = StaticImplementationLoader::new()
///     .with("metrics", ComponentImpl::value(()));
/// ```
#[derive(Default)]
pub struct StaticImplementationLoader {
    implementations: HashMap<String, ComponentImpl>,
}

impl StaticImplementationLoader {
    /// Creates an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Links an implementation under an entry directory name
    pub fn with(mut self, entry_name: impl Into<String>, implementation: ComponentImpl) -> Self {
        self.implementations.insert(entry_name.into(), implementation);
        self
    }
}

#[async_trait]
impl ImplementationLoader for StaticImplementationLoader {
    async fn load_implementation(&self, entry: &Path) -> anyhow::Result<ComponentImpl> {
        let key = entry
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        self.implementations.get(key).cloned().ok_or_else(|| {
            anyhow::anyhow!("no implementation linked for entry {}", entry.display())
        })
    }
}
