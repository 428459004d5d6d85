//! BoardGameGeek client configuration.
//!
//! Values come from, in priority order: environment variables, the `[bgg]`
//! table of `<config_dir>/meeple/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};

use tokio::time::Duration;

use crate::error::BggError;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://boardgamegeek.com/xmlapi2";

const ENV_BASE_URL: &str = "MEEPLE_BGG_BASE_URL";
const ENV_TOKEN: &str = "MEEPLE_BGG_TOKEN";
const ENV_TIMEOUT: &str = "MEEPLE_BGG_TIMEOUT_SECS";
const ENV_MAX_CANDIDATES: &str = "MEEPLE_BGG_MAX_CANDIDATES";

/// Settings for [`BggClient`](crate::BggClient) and its transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BggConfig {
    pub base_url: String,
    /// Bearer token for the XML API, if the account has one.
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
    /// Pause between per-candidate detail fetches in `search_many`.
    pub candidate_delay_ms: u64,
    /// Ids per batched `thing` request.
    pub batch_size: usize,
    /// Upper bound on search candidates fetched in detail. `None` fetches all.
    pub max_candidates: Option<usize>,
}

impl Default for BggConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
            max_attempts: 5,
            initial_backoff_secs: 2,
            candidate_delay_ms: 1000,
            batch_size: 20,
            max_candidates: None,
        }
    }
}

/// Where a setting's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    EnvVar(&'static str),
    ConfigFile,
    Default,
    Missing,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of the settings worth showing to a user.
#[derive(Debug)]
pub struct ConfigSources {
    pub base_url: ConfigSource,
    pub api_token: ConfigSource,
    pub timeout_secs: ConfigSource,
    pub max_candidates: ConfigSource,
}

/// TOML config file format.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct ConfigFile {
    bgg: Option<BggFileConfig>,
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct BggFileConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    initial_backoff_secs: Option<u64>,
    candidate_delay_ms: Option<u64>,
    batch_size: Option<usize>,
    max_candidates: Option<usize>,
}

impl BggConfig {
    /// Load from the environment and the default config file.
    pub fn load() -> Result<(Self, ConfigSources), BggError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::resolve(None, &|key| std::env::var(key).ok()),
        }
    }

    /// Load from the environment and a specific config file.
    ///
    /// A missing file means defaults; an unreadable or malformed one is an
    /// error.
    pub fn load_from(path: &Path) -> Result<(Self, ConfigSources), BggError> {
        let file = match read_config_file(path) {
            Ok(file) => Some(file),
            Err(BggError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config file at {}", path.display());
                None
            }
            Err(e) => return Err(e),
        };
        Self::resolve(file.as_ref(), &|key| std::env::var(key).ok())
    }

    fn resolve(
        file: Option<&BggFileConfig>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(Self, ConfigSources), BggError> {
        let defaults = Self::default();

        let (base_url, base_url_src) = pick(
            env(ENV_BASE_URL).map(|v| (v, ENV_BASE_URL)),
            file.and_then(|f| f.base_url.clone()),
        );
        let (api_token, api_token_src) = pick(
            env(ENV_TOKEN).map(|v| (v, ENV_TOKEN)),
            file.and_then(|f| f.api_token.clone()),
        );
        let (timeout_secs, timeout_src) = pick(
            parse_env(env, ENV_TIMEOUT)?.map(|v| (v, ENV_TIMEOUT)),
            file.and_then(|f| f.timeout_secs),
        );
        let (max_candidates, max_candidates_src) = pick(
            parse_env(env, ENV_MAX_CANDIDATES)?.map(|v| (v, ENV_MAX_CANDIDATES)),
            file.and_then(|f| f.max_candidates),
        );

        let config = Self {
            base_url: base_url.unwrap_or(defaults.base_url),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            timeout_secs: timeout_secs.unwrap_or(defaults.timeout_secs),
            max_attempts: file
                .and_then(|f| f.max_attempts)
                .unwrap_or(defaults.max_attempts),
            initial_backoff_secs: file
                .and_then(|f| f.initial_backoff_secs)
                .unwrap_or(defaults.initial_backoff_secs),
            candidate_delay_ms: file
                .and_then(|f| f.candidate_delay_ms)
                .unwrap_or(defaults.candidate_delay_ms),
            batch_size: file
                .and_then(|f| f.batch_size)
                .unwrap_or(defaults.batch_size),
            max_candidates,
        };
        config.validate()?;

        let sources = ConfigSources {
            base_url: base_url_src.unwrap_or(ConfigSource::Default),
            api_token: api_token_src.unwrap_or(ConfigSource::Missing),
            timeout_secs: timeout_src.unwrap_or(ConfigSource::Default),
            max_candidates: max_candidates_src.unwrap_or(ConfigSource::Missing),
        };
        Ok((config, sources))
    }

    fn validate(&self) -> Result<(), BggError> {
        if self.max_attempts == 0 {
            return Err(BggError::config("max_attempts must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(BggError::config("batch_size must be at least 1"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BggError::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_secs(self.initial_backoff_secs),
        }
    }

    pub fn candidate_delay(&self) -> Duration {
        Duration::from_millis(self.candidate_delay_ms)
    }
}

/// Env value beats file value; reports which one won.
fn pick<T>(
    env: Option<(T, &'static str)>,
    file: Option<T>,
) -> (Option<T>, Option<ConfigSource>) {
    match (env, file) {
        (Some((v, var)), _) => (Some(v), Some(ConfigSource::EnvVar(var))),
        (None, Some(v)) => (Some(v), Some(ConfigSource::ConfigFile)),
        (None, None) => (None, None),
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, BggError> {
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BggError::config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(None),
    }
}

/// Return the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meeple").join("config.toml"))
}

fn read_config_file(path: &Path) -> Result<BggFileConfig, BggError> {
    let content = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&content)
        .map_err(|e| BggError::config(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(config.bgg.unwrap_or_default())
}

/// Write a config file holding the given token, creating parent directories
/// as needed. Other settings in an existing file are preserved.
pub fn save_token(path: &Path, token: &str) -> Result<(), BggError> {
    let mut config: ConfigFile = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|e| {
            BggError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
        Err(e) => return Err(e.into()),
    };
    config.bgg.get_or_insert_with(Default::default).api_token = Some(token.to_string());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| BggError::config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
