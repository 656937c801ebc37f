//! Configuration types and loading
//!
//! Settings come from an optional config file, overridden by `DIRQUERY_*`
//! environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Query planning and projection settings
    pub query: QuerySettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuerySettings {
    /// Page size applied client-side when a query asks for the server
    /// default (`limit = 0`). `None` leaves such pages uncapped.
    pub default_limit: Option<usize>,

    /// Largest explicit limit a query may request
    pub max_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub filter: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,dq_queries=debug".to_string(),
            json: false,
        }
    }
}

/// Settings loading error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config file error: {0}")]
    FileError(String),
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::default().with_env()
    }

    /// Load an optional config file (TOML, YAML or JSON by extension) with
    /// `DIRQUERY__SECTION__KEY` environment overrides, then apply the flat
    /// `DIRQUERY_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("DIRQUERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<EngineConfig>())
            .map_err(|e| SettingsError::FileError(e.to_string()))?;

        config.with_env()
    }

    fn with_env(mut self) -> Result<Self, SettingsError> {
        if let Some(limit) = env_usize("DIRQUERY_DEFAULT_LIMIT")? {
            self.query.default_limit = Some(limit);
        }
        if let Some(max) = env_usize("DIRQUERY_MAX_LIMIT")? {
            self.query.max_limit = Some(max);
        }
        if let Ok(filter) = std::env::var("DIRQUERY_LOG") {
            self.logging.filter = filter;
        }
        if let Ok(json) = std::env::var("DIRQUERY_LOG_JSON") {
            self.logging.json = match json.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(SettingsError::InvalidValue {
                        key: "DIRQUERY_LOG_JSON".to_string(),
                        message: format!("expected a boolean, got {:?}", json),
                    })
                }
            };
        }

        Ok(self)
    }
}

fn env_usize(key: &str) -> Result<Option<usize>, SettingsError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SettingsError::InvalidValue {
                key: key.to_string(),
                message: format!("{} ({:?})", e, raw),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.query.default_limit, None);
        assert_eq!(config.query.max_limit, None);
        assert!(!config.logging.json);
        assert!(config.logging.filter.contains("dq_queries"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("dirquery-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"query": {"default_limit": 10, "max_limit": 100}}"#)
            .unwrap();
        drop(file);

        let config = EngineConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.query.max_limit, Some(100));
        assert!(!config.logging.json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/dirquery.toml");
        assert!(matches!(
            EngineConfig::load(Some(path)),
            Err(SettingsError::FileError(_))
        ));
    }
}
