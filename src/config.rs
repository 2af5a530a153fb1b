use crate::data_structures::{default_selection, Days, TickerRegistry, DEFAULT_DAYS};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PROVIDER_URL: &str = "https://query1.finance.yahoo.com";

// Request governor applied to the /api routes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernorSettings {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            per_second: 10,
            burst_size: 20,
        }
    }
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub provider_base_url: Option<String>,
    pub provider_timeout_secs: Option<u64>,
    pub default_days: Option<u32>,
    pub tickers: Option<TickerRegistry>,
    pub default_companies: Option<Vec<String>>,
    pub governor: Option<GovernorSettings>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub default_days: Days,
    pub registry: Arc<TickerRegistry>,
    pub default_companies: Vec<String>,
    pub governor: GovernorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_name: "stockviz".to_string(),
            environment: "development".to_string(),
            port: 8888,
            provider_base_url: DEFAULT_PROVIDER_URL.to_string(),
            provider_timeout: Duration::from_secs(30),
            default_days: Days::default(),
            registry: Arc::new(TickerRegistry::default()),
            default_companies: default_selection(),
            governor: GovernorSettings::default(),
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .map_err(|e| AppError::Config(format!("failed to read {}: {}", file_path, e)))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self> {
        let yaml_config: ConfigYaml = serde_yaml::from_str(yaml_content)
            .map_err(|e| AppError::Config(format!("failed to parse YAML config: {}", e)))?;

        let registry = yaml_config.tickers.unwrap_or_default();
        let config = Self {
            node_name: yaml_config.node_name,
            environment: yaml_config.environment,
            port: yaml_config.port,
            provider_base_url: yaml_config
                .provider_base_url
                .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string()),
            provider_timeout: Duration::from_secs(yaml_config.provider_timeout_secs.unwrap_or(30)),
            default_days: Days::new(yaml_config.default_days.unwrap_or(DEFAULT_DAYS))?,
            default_companies: yaml_config
                .default_companies
                .unwrap_or_else(|| default_for(&registry)),
            registry: Arc::new(registry),
            governor: yaml_config.governor.unwrap_or_default(),
        };
        config.validate()
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let registry = match env::var("TICKERS") {
            Ok(raw) => parse_tickers(&raw)?,
            Err(_) => TickerRegistry::default(),
        };

        let default_companies = env::var("DEFAULT_COMPANIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<String>>()
            })
            .unwrap_or_else(|_| default_for(&registry));

        let default_days = env::var("DEFAULT_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DAYS);

        let config = Self {
            node_name: env::var("NODE_NAME").unwrap_or(defaults.node_name),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: env_parse("PORT").unwrap_or(defaults.port),
            provider_base_url: env::var("PROVIDER_BASE_URL").unwrap_or(defaults.provider_base_url),
            provider_timeout: env_parse("PROVIDER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            default_days: Days::new(default_days)?,
            registry: Arc::new(registry),
            default_companies,
            governor: GovernorSettings {
                per_second: env_parse("GOVERNOR_PER_SECOND")
                    .unwrap_or(defaults.governor.per_second),
                burst_size: env_parse("GOVERNOR_BURST").unwrap_or(defaults.governor.burst_size),
            },
        };
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.registry.is_empty() {
            return Err(AppError::Config("ticker registry is empty".to_string()));
        }
        if let Some(name) = self.registry.duplicate_name() {
            return Err(AppError::Config(format!("company {} is registered twice", name)));
        }
        if let Some(unknown) = self
            .default_companies
            .iter()
            .find(|name| !self.registry.contains(name))
        {
            return Err(AppError::Config(format!(
                "default company {} is not in the ticker registry",
                unknown
            )));
        }
        if self.governor.per_second == 0 || self.governor.burst_size == 0 {
            return Err(AppError::Config("governor settings must be positive".to_string()));
        }
        Ok(self)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

// Default selection restricted to what the registry actually contains
fn default_for(registry: &TickerRegistry) -> Vec<String> {
    default_selection()
        .into_iter()
        .filter(|name| registry.contains(name))
        .collect()
}

/// Parses `name:SYMBOL,name:SYMBOL` into a registry.
pub fn parse_tickers(raw: &str) -> Result<TickerRegistry> {
    let mut pairs = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, ticker) = entry
            .split_once(':')
            .ok_or_else(|| AppError::Config(format!("ticker entry {} is not name:SYMBOL", entry)))?;
        let (name, ticker) = (name.trim(), ticker.trim());
        if name.is_empty() || ticker.is_empty() {
            return Err(AppError::Config(format!("ticker entry {} is incomplete", entry)));
        }
        pairs.push((name.to_string(), ticker.to_uppercase()));
    }
    Ok(TickerRegistry::from_pairs(pairs))
}
