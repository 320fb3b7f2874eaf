use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Model artifact path; resolved next to the executable when unset
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Classifier backend: "onnx" or "heuristic"
    #[serde(default = "default_model_backend")]
    pub model_backend: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite://water_quality.db".to_string()
}

fn default_model_backend() -> String {
    "onnx".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("AQUA"))
            .build()?
            .try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: default_database_url(),
            model_path: None,
            model_backend: default_model_backend(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; run these serially
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::remove_var("AQUA_BIND_ADDR");
        std::env::remove_var("AQUA_DATABASE_URL");
        std::env::remove_var("AQUA_MODEL_BACKEND");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.database_url, "sqlite://water_quality.db");
        assert_eq!(config.model_backend, "onnx");
        assert_eq!(config.model_path, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::set_var("AQUA_BIND_ADDR", "127.0.0.1:9999");
        std::env::set_var("AQUA_MODEL_BACKEND", "heuristic");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.model_backend, "heuristic");

        std::env::remove_var("AQUA_BIND_ADDR");
        std::env::remove_var("AQUA_MODEL_BACKEND");
    }
}
