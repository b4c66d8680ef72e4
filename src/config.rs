use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Persistent fjall keyspace under the data directory.
    Disk,
    /// Process-local store, nothing survives a restart.
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenErProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub open_er: Option<OpenErProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            open_er: Some(OpenErProviderConfig {
                base_url: "https://open.er-api.com/v6".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Price of one cake in the base currency. Every cached amount is
    /// quoted against this constant.
    #[serde(default = "default_cake_price")]
    pub cake_price_kzt: f64,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Maximum cached-rate age before a refresh is attempted.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// Currency the wage source reports salaries in.
    #[serde(default = "default_reference_currency")]
    pub reference_currency: String,
    #[serde(default = "default_wage_year")]
    pub wage_year: i32,
    #[serde(default = "default_wage_unit")]
    pub wage_unit: String,
    #[serde(default = "default_store")]
    pub store: StoreBackend,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

fn default_cake_price() -> f64 {
    600_000.0
}

fn default_base_currency() -> String {
    "KZT".to_string()
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_reference_currency() -> String {
    "USD".to_string()
}

fn default_wage_year() -> i32 {
    2024
}

fn default_wage_unit() -> String {
    "USD".to_string()
}

fn default_store() -> StoreBackend {
    StoreBackend::Disk
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cake_price_kzt: default_cake_price(),
            base_currency: default_base_currency(),
            ttl_hours: default_ttl_hours(),
            reference_currency: default_reference_currency(),
            wage_year: default_wage_year(),
            wage_unit: default_wage_unit(),
            store: default_store(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "cakerate", "cakerate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "cakerate", "cakerate")
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

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let yaml_str = "data_path: null";
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");

        assert_eq!(config.cake_price_kzt, 600_000.0);
        assert_eq!(config.base_currency, "KZT");
        assert_eq!(config.ttl_hours, 24);
        assert_eq!(config.reference_currency, "USD");
        assert_eq!(config.wage_year, 2024);
        assert_eq!(config.wage_unit, "USD");
        assert_eq!(config.store, StoreBackend::Disk);
        assert_eq!(
            config.providers.open_er.unwrap().base_url,
            "https://open.er-api.com/v6"
        );
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
cake_price_kzt: 500000
base_currency: "KZT"
ttl_hours: 12
store: "memory"
providers:
  open_er:
    base_url: "http://example.com/fx"
data_path: "/tmp/cakerate-test"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.cake_price_kzt, 500_000.0);
        assert_eq!(config.ttl_hours, 12);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(
            config.providers.open_er.unwrap().base_url,
            "http://example.com/fx"
        );
        assert_eq!(config.data_path, Some("/tmp/cakerate-test".to_string()));
    }

    #[test]
    fn test_custom_data_path_wins() {
        let config = AppConfig {
            data_path: Some("/tmp/elsewhere".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/elsewhere")
        );
    }
}
