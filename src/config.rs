// Configuration: read once at startup from `~/.chatterbox/config.json`,
// with a couple of environment overrides applied on top.

use crate::error::ConfigError;
use crate::types::GenerationParameters;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory under the home directory holding the config file.
pub const CONFIG_DIR: &str = ".chatterbox";
pub const CONFIG_FILE: &str = "config.json";

/// Settings from the config file. Keys are camelCase on disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_key: String,
    pub default_model: String,
    pub temperature: f64,
    pub top_p: f64,
    /// Reply length ceiling; left out of requests when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Where `chat.log` and the archives live. A leading `~` is expanded.
    pub log_directory: String,
    /// Completion endpoint override, only settable from the environment.
    #[serde(skip)]
    pub endpoint: Option<String>,
}

impl Config {
    /// Load the config from `CHATTERBOX_CONFIG` or the default location and
    /// apply environment overrides:
    /// - `OPENAI_API_KEY` replaces `apiKey`
    /// - `CHATTERBOX_API_URL` replaces the completion endpoint
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var_os("CHATTERBOX_CONFIG") {
            Some(p) => PathBuf::from(p),
            None => default_config_path()?,
        };
        let mut config = Config::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = set("OPENAI_API_KEY") {
            self.api_key = key;
        }
        if let Some(url) = set("CHATTERBOX_API_URL") {
            self.endpoint = Some(url);
        }
    }

    /// The log directory with `~` expanded.
    pub fn log_dir(&self) -> PathBuf {
        expand_tilde(&self.log_directory, dirs::home_dir().as_deref())
    }

    /// Create the config and log directories if they are missing.
    pub fn ensure_directories(&self) -> io::Result<()> {
        if let Some(home) = dirs::home_dir() {
            fs::create_dir_all(home.join(CONFIG_DIR))?;
        }
        fs::create_dir_all(self.log_dir())
    }

    /// Generation parameters for a chat turn, with per-run overrides taking
    /// precedence over the configured defaults.
    pub fn generation_parameters(
        &self,
        model: Option<&str>,
        temperature: Option<f64>,
        top_p: Option<f64>,
    ) -> GenerationParameters {
        GenerationParameters::new(model.unwrap_or(&self.default_model))
            .temperature(temperature.unwrap_or(self.temperature))
            .top_p(top_p.unwrap_or(self.top_p))
            .max_tokens(self.max_tokens)
    }
}

/// `~/.chatterbox/config.json`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Replace a leading `~` with `home`. Paths like `~user/x` and paths without
/// a home directory are returned unchanged.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}
