// gmark/src/config.rs
use crate::application::services::bookmark_service::DEFAULT_MAX_BATCH_ITEMS;
use crate::client::cache::{DEFAULT_GC_AFTER, DEFAULT_STALE_AFTER};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::repositories::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheOpts {
    /// Seconds a cached query result counts as fresh (default: 30)
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,

    /// Seconds an unused, unsubscribed result is kept (default: 300)
    #[serde(default = "default_gc_secs")]
    pub gc_secs: u64,
}

fn default_stale_secs() -> u64 {
    DEFAULT_STALE_AFTER.as_secs()
}

fn default_gc_secs() -> u64 {
    DEFAULT_GC_AFTER.as_secs()
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            stale_secs: default_stale_secs(),
            gc_secs: default_gc_secs(),
        }
    }
}

impl CacheOpts {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn gc_after(&self) -> Duration {
        Duration::from_secs(self.gc_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_url: String,

    /// Base URL of a remote server; requests stay in-process when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Bookmarks per listing page when a request does not ask for a size
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Largest accepted batch status request
    #[serde(default = "default_max_batch_items")]
    pub max_batch_items: usize,

    #[serde(default)]
    pub cache: CacheOpts,
}

fn default_db_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config/gmark/gmark.db")
        .to_string_lossy()
        .to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_batch_items() -> usize {
    DEFAULT_MAX_BATCH_ITEMS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_url: default_db_path(),
            api_url: None,
            page_size: default_page_size(),
            max_batch_items: default_max_batch_items(),
            cache: CacheOpts::default(),
        }
    }
}

impl Settings {
    fn validate(self) -> DomainResult<Self> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(DomainError::Other(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.max_batch_items == 0 {
            return Err(DomainError::Other(
                "max_batch_items must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config/gmark/config.toml"))
}

fn read_config_file(path: &Path) -> DomainResult<Settings> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DomainError::Other(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str::<Settings>(&text).map_err(|e| {
        DomainError::Other(format!("Invalid config file {}: {}", path.display(), e))
    })
}

/// Defaults, then `~/.config/gmark/config.toml`, then `config_path`, then
/// `GMARK_*` environment variables.
///
/// A missing default config file is fine; a missing explicit one is an error.
#[instrument(level = "debug")]
pub fn load_settings(config_path: Option<&Path>) -> DomainResult<Settings> {
    trace!("Loading settings");

    let mut settings = match config_path {
        Some(path) => read_config_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                trace!("Loading config from: {:?}", path);
                read_config_file(&path)?
            }
            None => Settings::default(),
        },
    };

    if let Ok(db_url) = std::env::var("GMARK_DB_URL") {
        trace!("Using GMARK_DB_URL from environment: {}", db_url);
        settings.db_url = db_url;
    }

    if let Ok(api_url) = std::env::var("GMARK_API_URL") {
        trace!("Using GMARK_API_URL from environment: {}", api_url);
        settings.api_url = Some(api_url).filter(|url| !url.is_empty());
    }

    if let Ok(page_size) = std::env::var("GMARK_PAGE_SIZE") {
        settings.page_size = page_size.trim().parse().map_err(|_| {
            DomainError::Other(format!("GMARK_PAGE_SIZE is not a number: {}", page_size))
        })?;
    }

    debug!("Settings loaded: {:?}", settings);
    settings.validate()
}

pub fn generate_default_config() -> String {
    toml::to_string_pretty(&Settings::default())
        .unwrap_or_else(|_| "# Error generating default configuration".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::EnvGuard;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config_file(content: &str) -> (TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        (temp_dir, config_path)
    }

    fn clear_env() -> EnvGuard {
        let guard = EnvGuard::new();
        for name in EnvGuard::VARS {
            env::remove_var(name);
        }
        guard
    }

    #[test]
    #[serial]
    fn test_config_file_values() {
        let _guard = clear_env();
        let (_dir, path) = create_temp_config_file(
            r#"
            db_url = "/tmp/from-file.db"
            page_size = 50

            [cache]
            stale_secs = 5
            "#,
        );

        let settings = load_settings(Some(&path)).unwrap();

        assert_eq!(settings.db_url, "/tmp/from-file.db");
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.max_batch_items, DEFAULT_MAX_BATCH_ITEMS);
        assert_eq!(settings.cache.stale_after(), Duration::from_secs(5));
        assert_eq!(settings.cache.gc_after(), DEFAULT_GC_AFTER);
        assert_eq!(settings.api_url, None);
    }

    #[test]
    #[serial]
    fn test_environment_variables_override() {
        let _guard = clear_env();
        let (_dir, path) = create_temp_config_file("db_url = \"/tmp/from-file.db\"\n");
        env::set_var("GMARK_DB_URL", "/test/custom.db");
        env::set_var("GMARK_API_URL", "http://localhost:8080");
        env::set_var("GMARK_PAGE_SIZE", "12");

        let settings = load_settings(Some(&path)).unwrap();

        assert_eq!(settings.db_url, "/test/custom.db");
        assert_eq!(settings.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(settings.page_size, 12);
    }

    #[test]
    #[serial]
    fn given_invalid_page_size_then_error() {
        let _guard = clear_env();
        let (_dir, path) = create_temp_config_file("page_size = 0\n");
        assert!(load_settings(Some(&path)).is_err());

        env::set_var("GMARK_PAGE_SIZE", "lots");
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn given_missing_explicit_config_then_error() {
        let _guard = clear_env();
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_generated_config_parses() {
        let generated = generate_default_config();
        let parsed: Settings = toml::from_str(&generated).unwrap();
        assert_eq!(parsed, Settings::default());
        assert!(generated.contains("stale_secs = 30"));
    }
}
