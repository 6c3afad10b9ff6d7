//! Configuration for data sources and the local cache
//!
//! Values come from `<config_dir>/seatfinder/config.toml`, then `.env` and
//! the process environment override them.

pub mod repository;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_REMOTE_URL: &str = "SEATFINDER_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "SEATFINDER_REMOTE_KEY";
pub const ENV_DATA_DIR: &str = "SEATFINDER_DATA_DIR";
pub const ENV_CACHE_PATH: &str = "SEATFINDER_CACHE_PATH";

/// Spreadsheet names tried in the bundled data folder, in order
pub const DEFAULT_CANDIDATES: &[&str] = &["guest-list.xlsx", "guest-list.xls", "guest-list.csv"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub bundled: BundledConfig,
    pub cache: CacheConfig,
}

/// Hosted backend connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

impl RemoteConfig {
    /// Both settings present and non-blank
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

/// Where the bundled guest list and invitations live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundledConfig {
    /// Local folder holding the bundled files
    pub data_dir: Option<PathBuf>,
    /// Base URL holding the bundled files (used when no folder is set)
    pub base_url: Option<String>,
    /// Spreadsheet names to try, first non-empty parse wins
    pub candidates: Vec<String>,
    /// Sub-folder holding per-table invitation files
    pub invitation_dir: String,
    /// Exported table -> invitation map, read when no remote is configured
    pub invitations_file: String,
}

impl Default for BundledConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: None,
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            invitation_dir: "invitations".to_string(),
            invitations_file: "invitations.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    /// Configured cache file, or the per-user default
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("seatfinder").join("cache.db"))
                .unwrap_or_else(|| PathBuf::from("seatfinder-cache.db"))
        })
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("seatfinder").join("config.toml"))
    }

    /// Load from the given file (or the default one) plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Failed to read .env: {}", e);
            }
        }

        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                log::debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        if !config.remote.is_configured() {
            log::warn!(
                "Remote store is not configured; using bundled files and the local cache. Set {} and {} to enable it.",
                ENV_REMOTE_URL,
                ENV_REMOTE_KEY
            );
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(ENV_REMOTE_KEY) {
            self.remote.anon_key = key;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.bundled.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup(ENV_CACHE_PATH).filter(|p| !p.trim().is_empty()) {
            self.cache.path = Some(PathBuf::from(path));
        }
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.config.remote = RemoteConfig {
            url: url.into(),
            anon_key: anon_key.into(),
        };
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.bundled.data_dir = Some(dir.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.bundled.base_url = Some(url.into());
        self
    }

    pub fn candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.bundled.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache.path = Some(path.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.remote.is_configured());
        assert_eq!(config.bundled.candidates, DEFAULT_CANDIDATES);
        assert_eq!(config.bundled.invitation_dir, "invitations");
        assert_eq!(config.bundled.invitations_file, "invitations.json");
        assert!(config.bundled.data_dir.is_none());
    }

    #[test]
    fn test_remote_needs_both_settings() {
        let mut remote = RemoteConfig {
            url: "https://abc.supabase.co".to_string(),
            anon_key: String::new(),
        };
        assert!(!remote.is_configured());
        remote.anon_key = "   ".to_string();
        assert!(!remote.is_configured());
        remote.anon_key = "anon".to_string();
        assert!(remote.is_configured());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
            [remote]
            url = "https://abc.supabase.co"
            anon_key = "anon"

            [bundled]
            data_dir = "public/data"
            "#,
        )
        .unwrap();

        assert!(config.remote.is_configured());
        assert_eq!(config.bundled.data_dir, Some(PathBuf::from("public/data")));
        assert_eq!(config.bundled.candidates, DEFAULT_CANDIDATES);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::builder().remote("https://file.example", "file-key").build();
        let env: HashMap<&str, &str> = [
            (ENV_REMOTE_KEY, "env-key"),
            (ENV_DATA_DIR, "/srv/data"),
            (ENV_CACHE_PATH, ""),
        ]
        .into_iter()
        .collect();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.remote.url, "https://file.example");
        assert_eq!(config.remote.anon_key, "env-key");
        assert_eq!(config.bundled.data_dir, Some(PathBuf::from("/srv/data")));
        assert_eq!(config.cache.path, None);
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::builder()
            .base_url("https://event.example/data")
            .candidates(["Our Party.xlsx", "guest-list.xlsx"])
            .cache_path("/tmp/cache.db")
            .build();

        assert_eq!(config.bundled.base_url.as_deref(), Some("https://event.example/data"));
        assert_eq!(config.bundled.candidates, vec!["Our Party.xlsx", "guest-list.xlsx"]);
        assert_eq!(config.cache.resolved_path(), PathBuf::from("/tmp/cache.db"));
    }
}
