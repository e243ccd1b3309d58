//! Manifests for discoverable component families
//!
//! A manifest describes a *type* of discoverable component: today that is
//! the configuration schema entries of that type must satisfy. Manifests are
//! registered on the container and consumed by the discovery pipeline.

use serde::{Deserialize, Serialize};

/// Declarative schema a discovered component configuration must satisfy
///
/// # Examples
///
/// ```rust
/// use trellis_container::ConfigSchema;
///
/// let schema = ConfigSchema::new(["name", "enabled"]);
/// assert_eq!(schema.required, ["name".to_string(), "enabled".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Keys that must be present and non-null in the configuration
    #[serde(default)]
    pub required: Vec<String>,
}

impl ConfigSchema {
    /// Creates a schema requiring the given keys
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

/// Metadata for a family of discoverable components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema applied to every discovered configuration of this type
    #[serde(default, rename = "configSchema")]
    pub config_schema: ConfigSchema,
}

impl Manifest {
    /// Creates a manifest with the given configuration schema
    pub fn new(config_schema: ConfigSchema) -> Self {
        Self { config_schema }
    }
}
