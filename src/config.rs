use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UvaFeedConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BcraFeedConfig {
    pub base_url: String,
    /// Bearer token for the rate series. Without one the live tier is
    /// skipped and rates come from the fallback tiers.
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BancoFeedConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedsConfig {
    pub uva: Option<UvaFeedConfig>,
    pub bcra: Option<BcraFeedConfig>,
    pub banco: Option<BancoFeedConfig>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        FeedsConfig {
            uva: Some(UvaFeedConfig {
                base_url: "https://criptoya.com".to_string(),
            }),
            bcra: Some(BcraFeedConfig {
                base_url: "https://api.estadisticasbcra.com".to_string(),
                api_token: None,
            }),
            banco: Some(BancoFeedConfig {
                base_url: "https://criptoya.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub feeds: FeedsConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Loads the default config file, falling back to built-in defaults
    /// when none exists yet.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ar", "uvacalc", "uvacalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ar", "uvacalc", "uvacalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
feeds:
  uva:
    base_url: "http://example.com/uva"
  bcra:
    base_url: "http://example.com/bcra"
    api_token: "secret"
data_path: "/tmp/uvacalc"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.feeds.uva.unwrap().base_url,
            "http://example.com/uva"
        );
        let bcra = config.feeds.bcra.unwrap();
        assert_eq!(bcra.base_url, "http://example.com/bcra");
        assert_eq!(bcra.api_token, Some("secret".to_string()));
        // Feeds not mentioned are simply absent
        assert!(config.feeds.banco.is_none());
        assert_eq!(config.data_path, Some("/tmp/uvacalc".to_string()));
    }

    #[test]
    fn test_missing_feeds_section_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("data_path: null").unwrap();
        assert_eq!(
            config.feeds.uva.unwrap().base_url,
            "https://criptoya.com"
        );
        assert!(config.feeds.bcra.unwrap().api_token.is_none());
        assert!(config.feeds.banco.is_some());
    }
}
