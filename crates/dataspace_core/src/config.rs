//! Configuration system for the dataspace tools
//!
//! A single TOML file with one section per concern. Every field has a default,
//! so an empty file (or no file at all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::ConfigError;
use crate::identity::WebId;
use crate::registry::DEFAULT_REGISTRY_URL;
use crate::{CoreError, Result};

/// Environment variable that overrides `identity.access_token`.
pub const TOKEN_ENV_VAR: &str = "DATASPACE_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataspaceConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Who is aggregating and writing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_id: Option<WebId>,
    /// Pre-obtained bearer token; the login flow lives elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
        }
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Durable cache file. `None` keeps the cache in memory only.
    #[serde(default = "default_cache_path")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_expire_after_secs")]
    pub expire_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttl_secs: default_ttl_secs(),
            stale_after_secs: default_stale_after_secs(),
            expire_after_secs: default_expire_after_secs(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(
            Duration::from_secs(self.ttl_secs),
            Duration::from_secs(self.stale_after_secs),
            Duration::from_secs(self.expire_after_secs),
        )
    }
}

fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("dataspace").join("aggregation.json"))
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_stale_after_secs() -> u64 {
    14 * 24 * 60 * 60
}

fn default_expire_after_secs() -> u64 {
    30 * 24 * 60 * 60
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Upper bound on any single store call
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl NetworkConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_concurrent_fetches() -> usize {
    crate::DEFAULT_MAX_CONCURRENT_FETCHES
}

/// Metadata written on the owner's own catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            title: default_catalog_title(),
            description: String::new(),
        }
    }
}

fn default_catalog_title() -> String {
    crate::catalog::DEFAULT_CATALOG_TITLE.to_string()
}

impl DataspaceConfig {
    /// Load configuration from standard locations
    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }

    /// The configured WebID, or [`CoreError::MissingIdentity`].
    pub fn web_id(&self) -> Result<&WebId> {
        self.identity.web_id.as_ref().ok_or(CoreError::MissingIdentity)
    }

    /// Token from the environment if set, else from the file.
    pub fn access_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.identity.access_token.clone())
    }

    /// Reject settings no component could run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let cache = &self.cache;
        if cache.ttl_secs > cache.stale_after_secs || cache.stale_after_secs > cache.expire_after_secs {
            return Err(ConfigError::InvalidValue {
                field: "cache".into(),
                reason: "expected ttl_secs <= stale_after_secs <= expire_after_secs".into(),
            });
        }
        if self.network.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.fetch_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.network.max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.max_concurrent_fetches".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Resolve a path relative to a base directory
/// If the path is absolute, return it as-is
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<DataspaceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    let mut config: DataspaceConfig =
        toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    config
        .validate()
        .map_err(|cause| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: match &cause {
                ConfigError::InvalidValue { field, .. } => field.clone(),
                _ => "content".to_string(),
            },
            expected: "consistent cache thresholds and non-zero network limits".to_string(),
            cause,
        })?;

    // Cache path is relative to the config file, not the working directory
    let base_dir = path.parent().unwrap_or(Path::new("."));
    if let Some(cache_path) = config.cache.path.as_mut() {
        *cache_path = resolve_path(base_dir, cache_path);
    }

    Ok(config)
}

/// Save configuration to a TOML file
pub async fn save_config(config: &DataspaceConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("dataspace.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dataspace").join("config.toml"));
    }

    paths
}

/// Load configuration from the first standard location that exists
pub async fn load_config_from_standard_locations() -> Result<DataspaceConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            return load_config(&path).await;
        }
    }

    Ok(DataspaceConfig::default())
}
