use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::digest::GroupingStrategy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DigestConfig {
    pub server: ServerConfig,
    pub miniflux: MinifluxConfig,
    pub digest: DigestSettings,
    pub archive: ArchiveConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
    pub listen: String,
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MinifluxConfig {
    pub host: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DigestSettings {
    pub group_by: GroupingStrategy,
    /// Minify archive HTML before writing.
    pub compress: bool,
    pub mark_as_read: bool,
    pub run_on_startup: bool,
    pub interval_hours: u64,
    /// Base URL the archive is reachable under, used in notifications.
    pub public_url: String,
    pub workers: usize,
    pub jitter_secs: u64,
    pub start_delay_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_dir: String,
    pub max_age_days: u64,
    pub cleanup_interval_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            listen: "0.0.0.0:8080".into(),
            enabled: true,
        }
    }
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            group_by: GroupingStrategy::Day,
            compress: true,
            mark_as_read: true,
            run_on_startup: false,
            interval_hours: 24 * 7,
            public_url: String::new(),
            workers: 4,
            jitter_secs: 30,
            start_delay_secs: 60,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        let base_dir = default_data_dir()
            .join("archive")
            .to_string_lossy()
            .into_owned();
        Self {
            base_dir,
            max_age_days: 21,
            cleanup_interval_hours: 24,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 120,
        }
    }
}

/// Returns `~/.fluxdigest/`, or `./.fluxdigest/` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fluxdigest")
}

/// Returns the default config file path: `~/.fluxdigest/config.toml`
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

impl DigestConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            DigestConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (FLUXDIGEST_*).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FLUXDIGEST_MINIFLUX_HOST") {
            self.miniflux.host = val;
        }
        if let Ok(val) = std::env::var("FLUXDIGEST_MINIFLUX_TOKEN") {
            self.miniflux.api_token = val;
        }
        if let Ok(val) = std::env::var("FLUXDIGEST_AI_API_KEY") {
            self.ai.api_key = val;
        }
        if let Ok(val) = std::env::var("FLUXDIGEST_ARCHIVE_DIR") {
            self.archive.base_dir = val;
        }
        if let Ok(val) = std::env::var("FLUXDIGEST_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.digest.group_by == GroupingStrategy::Ai && self.ai.api_key.trim().is_empty() {
            bail!("digest.group_by is \"ai\" but ai.api_key is not set");
        }
        if self.digest.workers == 0 {
            bail!("digest.workers must be at least 1");
        }
        if self.digest.interval_hours == 0 {
            bail!("digest.interval_hours must be at least 1");
        }
        if self.archive.max_age_days == 0 {
            bail!("archive.max_age_days must be at least 1");
        }
        if self.archive.cleanup_interval_hours == 0 {
            bail!("archive.cleanup_interval_hours must be at least 1");
        }
        Ok(())
    }

    /// Commands that talk to the feed reader need both host and token.
    pub fn require_miniflux(&self) -> Result<()> {
        if self.miniflux.host.trim().is_empty() {
            bail!("miniflux.host is not set");
        }
        if self.miniflux.api_token.trim().is_empty() {
            bail!("miniflux.api_token is not set");
        }
        Ok(())
    }

    /// Resolve the archive base directory, expanding `~` if needed.
    pub fn resolved_archive_dir(&self) -> PathBuf {
        expand_tilde(&self.archive.base_dir)
    }

    pub fn max_archive_age(&self) -> Duration {
        Duration::from_secs(self.archive.max_age_days * 24 * 60 * 60)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_secs)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DigestConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.digest.group_by, GroupingStrategy::Day);
        assert!(config.digest.compress);
        assert_eq!(config.archive.max_age_days, 21);
        assert!(config.archive.base_dir.ends_with("archive"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[miniflux]
host = "https://reader.example.com"
api_token = "secret"

[digest]
group_by = "feed"
compress = false

[archive]
base_dir = "/tmp/archive"
"#;
        let config: DigestConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.miniflux.host, "https://reader.example.com");
        assert_eq!(config.digest.group_by, GroupingStrategy::Feed);
        assert!(!config.digest.compress);
        assert_eq!(config.archive.base_dir, "/tmp/archive");
        // defaults still apply for unset fields
        assert_eq!(config.archive.max_age_days, 21);
        assert!(config.digest.mark_as_read);
        assert!(config.require_miniflux().is_ok());
    }

    #[test]
    fn unknown_grouping_is_rejected() {
        let result: Result<DigestConfig, _> = toml::from_str("[digest]\ngroup_by = \"week\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn ai_grouping_requires_api_key() {
        let mut config = DigestConfig::default();
        config.digest.group_by = GroupingStrategy::Ai;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ai.api_key"));

        config.ai.api_key = "key".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut config = DigestConfig::default();
        config.digest.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_miniflux_credentials_are_reported() {
        let config = DigestConfig::default();
        let err = config.require_miniflux().unwrap_err();
        assert!(err.to_string().contains("miniflux.host"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = DigestConfig::default();
        std::env::set_var("FLUXDIGEST_ARCHIVE_DIR", "/tmp/override-archive");
        std::env::set_var("FLUXDIGEST_AI_API_KEY", "env-key");
        std::env::set_var("FLUXDIGEST_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.archive.base_dir, "/tmp/override-archive");
        assert_eq!(config.ai.api_key, "env-key");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("FLUXDIGEST_ARCHIVE_DIR");
        std::env::remove_var("FLUXDIGEST_AI_API_KEY");
        std::env::remove_var("FLUXDIGEST_LOG_LEVEL");
    }

    #[test]
    fn max_archive_age_is_in_days() {
        let config = DigestConfig::default();
        assert_eq!(config.max_archive_age(), Duration::from_secs(21 * 86_400));
    }
}
