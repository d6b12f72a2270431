//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/tutor/config.toml).

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tutor_core::config::RootConfig;
use tutor_core::error::{Result, TutorError};

use crate::paths::TutorPaths;

/// Configuration service that loads and caches the root configuration.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// parsed is reported as [`TutorError::Config`] rather than silently replaced.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform config file.
    pub fn new() -> Result<Self> {
        let path = TutorPaths::config_file().map_err(|e| TutorError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a service reading `path`. Used by tests and embedders.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RootConfig> {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = Self::load(&self.path)?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Writes `config` to the file and replaces the cached copy.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        tracing::debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    fn load(path: &Path) -> Result<RootConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No configuration at {}, using defaults", path.display());
                return Ok(RootConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            TutorError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(dir.path().join("config.toml"));

        assert_eq!(service.get_config().unwrap(), RootConfig::default());
    }

    #[test]
    fn test_reads_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[background_tasks]\nauto_retry_delay_ms = 100\n\n[notifications]\nenabled = false\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).get_config().unwrap();

        assert_eq!(config.background_tasks.auto_retry_delay_ms, 100);
        assert_eq!(config.background_tasks.tick_interval_ms, 2_000);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[background_tasks\ntick_interval_ms = ").unwrap();

        let err = ConfigService::with_path(&path).get_config().unwrap_err();

        assert!(err.is_config(), "{err:?}");
    }

    #[test]
    fn test_cache_and_invalidate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(&path);
        assert!(service.get_config().unwrap().logging.level == "info");

        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().logging.level, "info");

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().logging.level, "debug");
    }

    #[test]
    fn test_save_then_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let service = ConfigService::with_path(&path);

        let mut config = RootConfig::default();
        config.background_tasks.max_auto_retries = 3;
        config.logging.json = true;
        service.save(&config).unwrap();

        let reloaded = ConfigService::with_path(&path).get_config().unwrap();
        assert_eq!(reloaded, config);
    }
}
