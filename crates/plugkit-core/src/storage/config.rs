use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::component::registry::Registry;
use crate::kernel::error::{Error, Result};
use crate::storage::error::StorageSystemError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "json" => Some(ConfigFormat::Json),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            #[cfg(feature = "toml-config")]
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Loader configuration: the component registry and where plugins live.
///
/// ```toml
/// search_paths = ["/opt/app/components"]
/// plugin_directories = ["/opt/app/plugins"]
/// plugin_extensions = ["so"]
///
/// [registry]
/// greeter = "/opt/app/components/libhello_component.so"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories tried, in order, by multi-candidate creation.
    pub search_paths: Vec<PathBuf>,
    /// Directories scanned for plugin libraries.
    pub plugin_directories: Vec<PathBuf>,
    /// File extensions of plugin libraries. Empty means the platform default.
    pub plugin_extensions: Vec<String>,
    /// Component name to library path.
    pub registry: BTreeMap<String, String>,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StorageSystemError::FileNotFound(path.to_path_buf()).into());
        }
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            StorageSystemError::UnsupportedConfigFormat(path.display().to_string())
        })?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(e, "read_loader_config", path.to_path_buf()))?;
        let config = Self::from_str(&content, format)?;
        debug!(
            "Loaded loader config from '{}' ({} registry entries)",
            path.display(),
            config.registry.len()
        );
        Ok(config)
    }

    /// Parse configuration text in the given format.
    pub fn from_str(data: &str, format: ConfigFormat) -> Result<Self> {
        let parsed: std::result::Result<Self, StorageSystemError> = match format {
            ConfigFormat::Json => serde_json::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("JSON", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("YAML", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("TOML", e)),
        };
        Ok(parsed?)
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String> {
        let text: std::result::Result<String, StorageSystemError> = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| StorageSystemError::serialization("JSON", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| StorageSystemError::serialization("YAML", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| StorageSystemError::serialization("TOML", e)),
        };
        Ok(text?)
    }

    /// Write the configuration, choosing the format from the extension.
    /// Unknown extensions are written as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = ConfigFormat::from_path(path).unwrap_or(ConfigFormat::Json);
        let content = self.serialize(format)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(e, "create_config_dir", parent.to_path_buf()))?;
        }
        fs::write(path, content)
            .map_err(|e| Error::io(e, "write_loader_config", path.to_path_buf()))
    }

    /// Add every registry entry to `registry`. Later writes win.
    pub fn apply_to(&self, registry: &Registry) {
        registry.extend(self.registry.iter().map(|(key, path)| (key.as_str(), path.as_str())));
    }
}
