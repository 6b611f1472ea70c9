//! Configuration loading from file and environment variables.

use narrator_voice::SpeechSettings;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Voices, ducking and backend settings handed to the engine.
    #[serde(default)]
    pub speech: SpeechSettings,

    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the phonetic dictionary file is looked up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DictionaryConfig {
    /// Directory holding `PhoneticDictionary.json`. When unset the
    /// directory of the executable is used, then the working directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "narrator_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    /// No path was given, or the file does not exist.
    Defaults,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `NARRATOR_BACKEND_PROGRAM` overrides `speech.backend.program`
/// - `NARRATOR_DICTIONARY_DIR` overrides `dictionary.dir`
/// - `NARRATOR_LOG_LEVEL` overrides `logging.level`
/// - `NARRATOR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<(Config, ConfigOrigin), ConfigError> {
    let (mut config, origin) = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => (toml::from_str(&contents)?, ConfigOrigin::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Config::default(), ConfigOrigin::Defaults)
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => (Config::default(), ConfigOrigin::Defaults),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok((config, origin))
}

fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(program) = var("NARRATOR_BACKEND_PROGRAM").filter(|p| !p.trim().is_empty()) {
        config.speech.backend.program = PathBuf::from(program);
    }
    if let Some(dir) = var("NARRATOR_DICTIONARY_DIR").filter(|d| !d.trim().is_empty()) {
        config.dictionary.dir = Some(PathBuf::from(dir));
    }
    if let Some(level) = var("NARRATOR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("NARRATOR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
