use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides; `__` separates nested keys,
/// e.g. `DM_ASSISTANT_API__BASE_URL`.
pub const ENV_PREFIX: &str = "DM_ASSISTANT_";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tui: TuiConfig,
    pub api: ApiConfig,
    pub google: GoogleConfig,
    pub data: DataConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
}

/// Backend service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// `n_results` sent with rulebook searches.
    pub rulebook_results: usize,
}

/// Google Drive / Docs export configuration.
///
/// The access token is supplied, never acquired: set it here or through
/// `DM_ASSISTANT_GOOGLE__ACCESS_TOKEN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub access_token: Option<String>,
    /// Document copied for every export.
    pub template_id: Option<String>,
    /// Drive folder the copies are placed in.
    pub folder_id: Option<String>,
    pub drive_api_url: String,
    pub docs_api_url: String,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 50 }
    }
}

/// Hosted DM Assistant service.
pub const DEFAULT_BASE_URL: &str = "https://dnd-dm-assistant-691169217190.us-central1.run.app";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rulebook_results: 5,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            template_id: None,
            folder_id: None,
            drive_api_url: "https://www.googleapis.com/drive/v3".to_string(),
            docs_api_url: "https://docs.googleapis.com/v1".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `~/.config/dm-assistant/config.toml`)
    /// layered under `DM_ASSISTANT_*` environment variables.
    /// Returns `Default` if the result cannot be extracted.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        match Self::figment(&config_path).extract() {
            Ok(config) => {
                if config_path.exists() {
                    log::info!("Loaded config from {}", config_path.display());
                } else {
                    log::debug!("No config file at {}, using defaults", config_path.display());
                }
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load config from {}: {e}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Defaults, then the TOML file, then the environment.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("dm-assistant"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Where generated battle maps are written.
    pub fn maps_dir(&self) -> PathBuf {
        self.data_dir().join("maps")
    }

    /// The effective configuration as TOML, with the access token masked.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.google.access_token.is_some() {
            shown.google.access_token = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("dm-assistant").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tui.tick_rate_ms, 50);
        assert_eq!(
            config.api.base_url,
            "https://dnd-dm-assistant-691169217190.us-central1.run.app"
        );
        assert_eq!(config.api.rulebook_results, 5);
        assert!(config.google.access_token.is_none());
        assert!(config.google.template_id.is_none());
        assert!(config.data.data_dir.is_none());
    }

    #[test]
    fn test_config_load_missing_file() {
        Jail::expect_with(|_| {
            let config = AppConfig::load(Some(Path::new("/nonexistent/dm-assistant.toml")));
            assert_eq!(config.tui.tick_rate_ms, 50);
            assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [api]
                base_url = "http://dm.example:9000"

                [google]
                template_id = "tmpl"
                access_token = "from-file"
                "#,
            )?;
            jail.set_env("DM_ASSISTANT_GOOGLE__ACCESS_TOKEN", "from-env");
            jail.set_env("DM_ASSISTANT_TUI__TICK_RATE_MS", "100");

            let config: AppConfig = AppConfig::figment(Path::new("config.toml")).extract()?;
            assert_eq!(config.api.base_url, "http://dm.example:9000");
            assert_eq!(config.api.rulebook_results, 5);
            assert_eq!(config.google.template_id.as_deref(), Some("tmpl"));
            assert_eq!(config.google.access_token.as_deref(), Some("from-env"));
            assert_eq!(config.tui.tick_rate_ms, 100);
            Ok(())
        });
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[api\nbase_url = ")?;
            let config = AppConfig::load(Some(Path::new("config.toml")));
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_toml_roundtrip_masks_token() {
        let mut config = AppConfig::default();
        config.api.base_url = "http://dm.example:9000".into();
        config.google.access_token = Some("secret".into());

        let text = config.to_toml().unwrap();
        assert!(!text.contains("secret"));

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.api, config.api);
        assert_eq!(parsed.google.access_token.as_deref(), Some("<redacted>"));
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = AppConfig::default();
        config.data.data_dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/custom"));
        assert_eq!(config.maps_dir(), PathBuf::from("/tmp/custom/maps"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/custom/logs"));
    }

    #[test]
    fn test_data_dir_default() {
        let dir = AppConfig::default().data_dir();
        assert!(dir.to_string_lossy().contains("dm-assistant") || dir == PathBuf::from("data"));
    }
}
