//! Configuration loading and representation.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! explicit overrides (environment variables and command-line flags, resolved
//! by the binary).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderflow_catalog::CatalogJoin;
use orderflow_sales::{BUNDLE_DELIMITER, OrderTransformer, RESERVED_SKU_PREFIXES};

/// File name looked up inside the data directory when no config path is given.
pub const CONFIG_FILE_NAME: &str = "orderflow.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("no data directory configured and none could be determined for this platform")]
    NoDataDir,
}

/// Tunable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where reference tables are kept between runs.
    pub data_dir: Option<PathBuf>,
    /// Order lines whose SKU starts with one of these never ship.
    pub reserved_prefixes: Vec<String>,
    /// Separator between bundle component names; empty disables bundles.
    pub bundle_delimiter: String,
    pub catalog_join: CatalogJoin,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            reserved_prefixes: RESERVED_SKU_PREFIXES.iter().map(|p| p.to_string()).collect(),
            bundle_delimiter: BUNDLE_DELIMITER.to_string(),
            catalog_join: CatalogJoin::default(),
        }
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub data_dir: Option<PathBuf>,
    pub reserved_prefixes: Option<Vec<String>>,
    pub bundle_delimiter: Option<String>,
    pub catalog_join: Option<CatalogJoin>,
}

impl Settings {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Resolve settings from an explicit config path, or the default file in
    /// `search_dir` when it exists, or the built-in defaults.
    pub fn discover(explicit: Option<&Path>, search_dir: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        match search_dir.map(|dir| dir.join(CONFIG_FILE_NAME)) {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides, then re-check the result.
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(prefixes) = overrides.reserved_prefixes {
            self.reserved_prefixes = prefixes;
        }
        if let Some(delimiter) = overrides.bundle_delimiter {
            self.bundle_delimiter = delimiter;
        }
        if let Some(join) = overrides.catalog_join {
            self.catalog_join = join;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserved_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "reserved_prefixes must not contain an empty prefix (it would drop every order line)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The configured data directory, or the platform default.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir().ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn order_transformer(&self) -> OrderTransformer {
        OrderTransformer::new()
            .with_reserved_prefixes(self.reserved_prefixes.iter().cloned())
            .with_bundle_delimiter(self.bundle_delimiter.clone())
            .with_catalog_join(self.catalog_join)
    }
}

/// Platform data directory for orderflow (e.g. `~/.local/share/orderflow`).
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("orderflow"))
}
