//! Durable cache file: one versioned JSON document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::error::CacheError;

/// Bumped whenever the on-disk layout changes. Files with any other version are discarded.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    /// Completion time of the last full aggregation, cleared by writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_aggregated: Option<DateTime<Utc>>,
    pub catalogs: BTreeMap<String, CacheEntry>,
}

impl CacheFile {
    pub fn new(updated_at: DateTime<Utc>, catalogs: BTreeMap<String, CacheEntry>) -> Self {
        Self {
            version: CACHE_SCHEMA_VERSION,
            updated_at,
            last_aggregated: None,
            catalogs,
        }
    }

    pub fn with_last_aggregated(mut self, last_aggregated: Option<DateTime<Utc>>) -> Self {
        self.last_aggregated = last_aggregated;
        self
    }
}

/// Read the cache file. Anything short of a valid current-version file is `None`.
pub async fn read_cache_file(path: &Path) -> Option<CacheFile> {
    let body = match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no cache file yet");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
            return None;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cache file malformed, starting empty");
            return None;
        }
    };

    let version = value.get("version").and_then(serde_json::Value::as_u64);
    if version != Some(u64::from(CACHE_SCHEMA_VERSION)) {
        tracing::warn!(
            path = %path.display(),
            found = ?version,
            expected = CACHE_SCHEMA_VERSION,
            "cache file version mismatch, discarding"
        );
        return None;
    }

    match serde_json::from_value(value) {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cache file entries malformed, starting empty");
            None
        }
    }
}

/// Write the cache file through a temp file and rename, so readers never see half a file.
pub async fn write_cache_file(path: &Path, file: &CacheFile) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let body = serde_json::to_string_pretty(file)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "cache.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let file = CacheFile::new(Utc::now(), BTreeMap::new());

        write_cache_file(&path, &file).await.unwrap();
        assert!(!temp_path(&path).exists());
        assert_eq!(read_cache_file(&path).await, Some(file));
    }

    #[tokio::test]
    async fn test_other_versions_are_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::write(
            &path,
            r#"{"version": 0, "updated_at": "2024-01-01T00:00:00Z", "catalogs": {"x": 1}}"#,
        )
        .await
        .unwrap();
        assert_eq!(read_cache_file(&path).await, None);
    }

    #[tokio::test]
    async fn test_garbage_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        assert_eq!(read_cache_file(&path).await, None);

        tokio::fs::write(&path, "not json").await.unwrap();
        assert_eq!(read_cache_file(&path).await, None);
    }
}
