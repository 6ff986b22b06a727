//! Configuration loading from deckhand.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use runtime::BuiltinConfig;
use runtime::tools::builtin::{DEFAULT_KB_PATH, DEFAULT_WEATHER_URL, WeatherConfig};
use serde::Deserialize;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "deckhand.toml";

/// Environment variable that overrides `model.name`.
pub const MODEL_VAR: &str = "DECKHAND_MODEL";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub weather: WeatherSection,
}

/// LLM settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub timeout_secs: u64,
    /// Optional system instruction sent with every request.
    pub system: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: runtime::DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            system: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    pub path: PathBuf,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_KB_PATH),
        }
    }
}

/// Weather provider settings. The API key only comes from the environment.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeatherSection {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEATHER_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `explicit` if given, otherwise [`CONFIG_FILE`] when it exists,
    /// otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply environment overrides. `lookup` returns a variable's value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_VAR) {
            self.model.name = model;
        }
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_secs)
    }

    /// Settings for the builtin tools.
    pub fn builtin(&self, weather_api_key: Option<String>) -> BuiltinConfig {
        BuiltinConfig {
            knowledge_base: self.knowledge_base.path.clone(),
            weather: WeatherConfig {
                api_key: weather_api_key,
                url: self.weather.url.clone(),
                timeout: Duration::from_secs(self.weather.timeout_secs),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.model_timeout(), Duration::from_secs(60));
        assert!(config.model.system.is_none());
        assert_eq!(config.knowledge_base.path, PathBuf::from("data/kb.json"));
        assert_eq!(config.weather.timeout_secs, 5);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [model]
            system = "Answer briefly."

            [weather]
            url = "http://localhost:8080/weather"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.model.system.as_deref(), Some("Answer briefly."));
        assert_eq!(config.weather.url, "http://localhost:8080/weather");
        assert_eq!(config.weather.timeout_secs, 5);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::parse("[model\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = Config::parse("[model]\ntimeout_secs = \"soon\"").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[knowledge_base]\npath = \"/srv/kb.json\"").unwrap();
        let config = Config::discover(Some(file.path())).unwrap();
        assert_eq!(config.knowledge_base.path, PathBuf::from("/srv/kb.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::discover(Some(Path::new("/nonexistent/deckhand.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/deckhand.toml"));
    }

    #[test]
    fn environment_overrides_model() {
        let env: HashMap<&str, &str> = HashMap::from([(MODEL_VAR, "gemini-2.5-pro")]);
        let mut config = Config::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.model.name, "gemini-2.5-pro");

        let mut config = Config::default();
        config.apply_env(|_| None);
        assert_eq!(config.model.name, "gemini-2.5-flash");
    }

    #[test]
    fn builtin_settings() {
        let config = Config::parse("[weather]\ntimeout_secs = 2").unwrap();
        let builtin = config.builtin(Some("key".into()));
        assert_eq!(builtin.knowledge_base, PathBuf::from("data/kb.json"));
        assert_eq!(builtin.weather.api_key.as_deref(), Some("key"));
        assert_eq!(builtin.weather.timeout, Duration::from_secs(2));
    }
}
