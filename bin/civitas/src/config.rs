//! Runtime settings: built-in defaults, overridden by `CIVITAS_*` environment
//! variables (`__` separates nested keys, e.g. `CIVITAS_GEMINI__TEXT_MODEL`).

use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Directory holding one JSON document per storage key.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Deserialize)]
pub struct GeminiSettings {
    /// Only needed by the AI commands. Falls back to `GEMINI_API_KEY`.
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(
            Environment::with_prefix("CIVITAS").prefix_separator("_").separator("__"),
            std::env::var("GEMINI_API_KEY").ok(),
        )
    }

    fn from_env(env: Environment, fallback_key: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("data_dir", "./data")?
            .set_default("log_format", "text")?
            .set_default("gemini.base_url", "https://generativelanguage.googleapis.com/")?
            .set_default("gemini.text_model", "gemini-2.0-flash")?
            .set_default("gemini.image_model", "imagen-4.0-fast-generate-001")?
            .set_default("gemini.timeout_secs", 60)?;
        if let Some(key) = fallback_key {
            builder = builder.set_default("gemini.api_key", key)?;
        }

        builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("CIVITAS").prefix_separator("_").separator("__").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_env(env(&[]), None).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("./data"));
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.gemini.text_model, "gemini-2.0-flash");
        assert_eq!(settings.gemini.timeout_secs, 60);
        assert!(settings.gemini.api_key.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_env(
            env(&[
                ("CIVITAS_DATA_DIR", "/tmp/civitas"),
                ("CIVITAS_LOG_FORMAT", "json"),
                ("CIVITAS_GEMINI__TIMEOUT_SECS", "5"),
                ("CIVITAS_GEMINI__API_KEY", "from-prefix"),
            ]),
            Some("from-fallback".to_string()),
        )
        .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/civitas"));
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.gemini.timeout_secs, 5);
        assert_eq!(
            settings.gemini.api_key.as_ref().map(|k| k.expose_secret().to_string()).as_deref(),
            Some("from-prefix")
        );
    }

    #[test]
    fn test_fallback_api_key() {
        let settings = Settings::from_env(env(&[]), Some("from-fallback".to_string())).unwrap();
        assert_eq!(
            settings.gemini.api_key.map(|k| k.expose_secret().to_string()).as_deref(),
            Some("from-fallback")
        );
    }
}
