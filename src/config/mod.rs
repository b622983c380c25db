//! Configuration management for careseek
//!
//! Loaded from TOML, overridden by `CARESEEK_SECTION__KEY` environment
//! variables and optional named profiles, then validated as a whole.

use crate::error::{CareseekError, Result};
use crate::orchestrator::OrchestratorSettings;
use crate::provider::SearchCriteria;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

const ENV_PREFIX: &str = "CARESEEK_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Where result sessions are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Json => "json",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            other => Err(format!("Unknown storage backend '{}'", other)),
        }
    }
}

/// Collaborator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub recommendation_url: String,
    pub directory_url: String,
    pub ranking_url: String,
    /// Environment variable holding the bearer key, if any
    pub api_key_env: String,
    /// Per-call timeout, e.g. "30s"
    pub timeout: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            recommendation_url: String::new(),
            directory_url: String::new(),
            ranking_url: String::new(),
            api_key_env: "CARESEEK_API_KEY".to_string(),
            timeout: "30s".to_string(),
        }
    }
}

/// Search defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub page_size: usize,
    /// Criteria used when a results view has nothing to show
    pub default_state: String,
    pub default_city: String,
    pub default_description: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            page_size: crate::filtering::DEFAULT_PAGE_SIZE,
            default_state: "NY".to_string(),
            default_city: "New York".to_string(),
            default_description: "general checkup".to_string(),
        }
    }
}

/// Fallback ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_registry_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_backend: Option<StorageBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CareseekError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load the file at `path`, or defaults (plus env overrides) when absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(CareseekError::ConfigNotFound { .. }) => {
                tracing::debug!("No config at {:?}, using defaults", path);
                let mut config = Self::default();
                config.apply_env_overrides();
                ConfigValidator::validate(&config)?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CareseekError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides and re-validate
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self.profiles.get(profile).cloned().ok_or_else(|| {
            CareseekError::Config(format!("Unknown profile '{}'", profile))
        })?;

        if let Some(backend) = overrides.storage_backend {
            self.storage.backend = backend;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage.data_dir = data_dir;
        }
        if let Some(url) = overrides.recommendation_url {
            self.services.recommendation_url = url;
        }
        if let Some(url) = overrides.directory_url {
            self.services.directory_url = url;
        }
        if let Some(url) = overrides.ranking_url {
            self.services.ranking_url = url;
        }
        if let Some(timeout) = overrides.timeout {
            self.services.timeout = timeout;
        }
        if let Some(page_size) = overrides.page_size {
            self.search.page_size = page_size;
        }
        if overrides.seed.is_some() {
            self.ranking.seed = overrides.seed;
        }

        tracing::debug!("Applied profile '{}'", profile);
        ConfigValidator::validate(self)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: CARESEEK_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `CARESEEK_`-prefixed overrides from `vars`
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        let invalid = |message: String| CareseekError::InvalidConfigValue {
            path: path.to_string(),
            message,
        };

        match path {
            "STORAGE__DATA_DIR" => self.storage.data_dir = PathBuf::from(value),
            "STORAGE__BACKEND" => self.storage.backend = value.parse().map_err(invalid)?,
            "SERVICES__RECOMMENDATION_URL" => self.services.recommendation_url = value.to_string(),
            "SERVICES__DIRECTORY_URL" => self.services.directory_url = value.to_string(),
            "SERVICES__RANKING_URL" => self.services.ranking_url = value.to_string(),
            "SERVICES__API_KEY_ENV" => self.services.api_key_env = value.to_string(),
            "SERVICES__TIMEOUT" => self.services.timeout = value.to_string(),
            "SEARCH__MAX_RESULTS" => {
                self.search.max_results = value
                    .parse()
                    .map_err(|_| invalid(format!("Cannot parse '{}' as a number", value)))?;
            }
            "SEARCH__PAGE_SIZE" => {
                self.search.page_size = value
                    .parse()
                    .map_err(|_| invalid(format!("Cannot parse '{}' as a number", value)))?;
            }
            "RANKING__PINNED_REGISTRY_NUMBER" => {
                self.ranking.pinned_registry_number =
                    Some(value.trim().to_string()).filter(|s| !s.is_empty());
            }
            "RANKING__SEED" => {
                self.ranking.seed = Some(
                    value
                        .parse()
                        .map_err(|_| invalid(format!("Cannot parse '{}' as a seed", value)))?,
                );
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Data directory with a leading `~` expanded
    pub fn data_dir(&self) -> Result<PathBuf> {
        expand_home(&self.storage.data_dir)
    }

    /// Criteria for a results view with nothing to show
    pub fn default_criteria(&self) -> SearchCriteria {
        SearchCriteria::new(
            &self.search.default_state,
            &self.search.default_city,
            &self.search.default_description,
        )
    }

    pub fn orchestrator_settings(&self) -> Result<OrchestratorSettings> {
        Ok(OrchestratorSettings {
            max_results: self.search.max_results,
            step_timeout: Some(parse_duration(&self.services.timeout)?),
            pinned_registry_number: self.ranking.pinned_registry_number.clone(),
            seed: self.ranking.seed,
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CareseekError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("careseek").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| CareseekError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".careseek"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.careseek"),
                backend: StorageBackend::Sqlite,
            },
            services: ServicesConfig::default(),
            search: SearchConfig::default(),
            ranking: RankingConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| CareseekError::Config("Cannot determine home directory".to_string()))?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Parse a duration string such as "250ms", "30s", "5m", "1h"
///
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    let invalid = || CareseekError::InvalidConfigValue {
        path: "duration".to_string(),
        message: format!("Invalid duration format: '{}'", s),
    };

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount * 60),
        "h" => Duration::from_secs(amount * 3600),
        _ => return Err(invalid()),
    };

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.backend = StorageBackend::Json;
        config.ranking.seed = Some(7);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage.backend, StorageBackend::Json);
        assert_eq!(loaded.ranking.seed, Some(7));
        assert_eq!(loaded.search.page_size, 10);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        assert!(matches!(
            Config::load(&path),
            Err(CareseekError::ConfigNotFound { .. })
        ));
        assert!(Config::load_or_default(&path).is_ok());
    }

    #[test]
    fn test_minimal_file_uses_section_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[_meta]\nschema_version = \"1.0.0\"\n\n[storage]\ndata_dir = \"/tmp/careseek\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.search.max_results, 50);
        assert_eq!(config.services.timeout, "30s");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("CARESEEK_STORAGE__BACKEND", "json"),
            ("CARESEEK_SEARCH__PAGE_SIZE", "25"),
            ("CARESEEK_RANKING__SEED", "42"),
            ("CARESEEK_RANKING__PINNED_REGISTRY_NUMBER", " 1234567890 "),
            ("CARESEEK_SEARCH__MAX_RESULTS", "lots"),
            ("OTHER_SEARCH__PAGE_SIZE", "99"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.ranking.seed, Some(42));
        assert_eq!(
            config.ranking.pinned_registry_number.as_deref(),
            Some("1234567890")
        );
        assert_eq!(config.search.max_results, 50);
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "demo".to_string(),
            ProfileOverrides {
                storage_backend: Some(StorageBackend::Json),
                page_size: Some(5),
                seed: Some(1),
                ..ProfileOverrides::default()
            },
        );

        config.apply_profile("demo").unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.search.page_size, 5);
        assert_eq!(config.ranking.seed, Some(1));

        assert!(config.apply_profile("missing").is_err());
    }

    #[test]
    fn test_expand_home() {
        let absolute = PathBuf::from("/var/lib/careseek");
        assert_eq!(expand_home(&absolute).unwrap(), absolute);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/.careseek")).unwrap(),
                home.join(".careseek")
            );
        }
    }

    #[test]
    fn test_orchestrator_settings() {
        let mut config = Config::default();
        config.services.timeout = "2m".to_string();
        config.ranking.pinned_registry_number = Some("42".to_string());

        let settings = config.orchestrator_settings().unwrap();
        assert_eq!(settings.step_timeout, Some(Duration::from_secs(120)));
        assert_eq!(settings.max_results, 50);
        assert_eq!(settings.pinned_registry_number.as_deref(), Some("42"));
    }
}
