use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub watsonx: WatsonxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP listen port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding farmers.json, consumers.json, markets/ etc.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Optional directory for a daily rolling log file
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// IBM watsonx credentials. When absent the model branch of `/api/agent`
/// stays disabled and only direct tool calls are served.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatsonxConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl WatsonxConfig {
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.api_key) && present(&self.url)
    }
}

/// `HARVESTQ_<SECTION>__<KEY>` variables; a single `_` follows the prefix
fn env_source() -> Environment {
    Environment::with_prefix("HARVESTQ")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir.as_ref(), env_source())
    }

    fn load_with_env(config_dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("data.dir", "data")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HARVESTQ_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HARVESTQ_SERVER__PORT, etc.)
            .add_source(env)
            // Legacy variable names used by the demo deployment
            .set_override_option("server.port", env_non_empty("PORT"))?
            .set_override_option("watsonx.api_key", env_non_empty("WATSONX_APIKEY"))?
            .set_override_option("watsonx.url", env_non_empty("WATSONX_URL"))?
            .set_override_option("watsonx.project_id", env_non_empty("WATSONX_PROJECT_ID"))?;

        builder.build()?.try_deserialize()
    }

    /// Defaults only, rooted at the given data directory
    pub fn default_config(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            data: DataConfig {
                dir: data_dir.into(),
            },
            logging: LoggingConfig::default(),
            watsonx: WatsonxConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if self.data.dir.as_os_str().is_empty() {
            errors.push("data.dir must not be empty".to_string());
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            errors.push(format!("unknown logging.level: {}", self.logging.level));
        }

        if self.watsonx.api_key.is_some() != self.watsonx.url.is_some() {
            errors.push("watsonx.api_key and watsonx.url must be set together".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default_config("data");
        assert_eq!(cfg.server.port, 8080);
        assert!(!cfg.watsonx.is_configured());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut cfg = AppConfig::default_config("");
        cfg.server.port = 0;
        cfg.logging.level = "loud".to_string();
        cfg.watsonx.api_key = Some("key".to_string());

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_env_overrides_use_single_underscore_after_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let vars: config::Map<String, String> = [
            ("HARVESTQ_SERVER__PORT", "9191"),
            ("HARVESTQ_LOGGING__JSON", "true"),
            ("HARVESTQ_DATA__DIR", "/srv/harvestq"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg = AppConfig::load_with_env(dir.path(), env_source().source(Some(vars))).unwrap();
        assert_eq!(cfg.server.port, 9191);
        assert!(cfg.logging.json);
        assert_eq!(cfg.data.dir, PathBuf::from("/srv/harvestq"));
    }

    #[test]
    fn test_watsonx_requires_both_fields() {
        let mut wx = WatsonxConfig::default();
        wx.api_key = Some("key".to_string());
        assert!(!wx.is_configured());
        wx.url = Some("  ".to_string());
        assert!(!wx.is_configured());
        wx.url = Some("https://us-south.ml.cloud.ibm.com".to_string());
        assert!(wx.is_configured());
    }
}
