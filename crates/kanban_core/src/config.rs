//! Board configuration.
//!
//! Read from `kanban.toml`, then overridden by `KANBAN_*` environment
//! variables.
//!
//! ```toml
//! [remote]
//! kind = "rest"                     # or "memory"
//! database_url = "https://my-board.firebasedatabase.app"
//! auth_token = "..."
//! request_timeout_ms = 10000
//! poll_interval_ms = 2000
//!
//! [cache]
//! path = "/var/lib/kanban/cache.sqlite3"
//!
//! [logging]
//! level = "info"
//! dir = "/var/log/kanban"
//! ```

use crate::store::RestOptions;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "kanban.toml";
const DEFAULT_CACHE_FILE: &str = "kanban-cache.sqlite3";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: &'static str, value: String },
    MissingDatabaseUrl,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
            Self::MissingDatabaseUrl => {
                write!(f, "remote.kind = \"rest\" requires remote.database_url")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// In-process store; data lives as long as the process.
    #[default]
    Memory,
    /// Realtime-database REST endpoint.
    Rest,
}

impl std::str::FromStr for RemoteKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rest" => Ok(Self::Rest),
            _ => Err(ConfigError::InvalidValue {
                key: "remote.kind",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub kind: RemoteKind,
    pub database_url: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let options = RestOptions::default();
        Self {
            kind: RemoteKind::default(),
            database_url: None,
            auth_token: None,
            request_timeout_ms: options.request_timeout.as_millis() as u64,
            poll_interval_ms: options.poll_interval.as_millis() as u64,
        }
    }
}

impl RemoteConfig {
    pub fn rest_options(&self) -> RestOptions {
        RestOptions {
            auth_token: self.auth_token.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `None` keeps the cache in memory.
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_CACHE_FILE)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: Option<String>,
    /// File logging is off when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub logging: LoggingSection,
}

impl BoardConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> ConfigResult<Self> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads `path`; a missing file yields defaults.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// File layer plus process environment, validated.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `KANBAN_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("KANBAN_REMOTE") {
            self.remote.kind = kind.parse()?;
        }
        if let Some(url) = lookup("KANBAN_DATABASE_URL") {
            self.remote.database_url = Some(url);
        }
        if let Some(token) = lookup("KANBAN_AUTH_TOKEN") {
            self.remote.auth_token = Some(token);
        }
        if let Some(raw) = lookup("KANBAN_REQUEST_TIMEOUT_MS") {
            self.remote.request_timeout_ms = parse_millis("remote.request_timeout_ms", &raw)?;
        }
        if let Some(raw) = lookup("KANBAN_POLL_INTERVAL_MS") {
            self.remote.poll_interval_ms = parse_millis("remote.poll_interval_ms", &raw)?;
        }
        if let Some(path) = lookup("KANBAN_CACHE_PATH") {
            self.cache.path = (!path.trim().is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(level) = lookup("KANBAN_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
        if let Some(dir) = lookup("KANBAN_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote.kind == RemoteKind::Rest
            && self
                .remote
                .database_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.remote.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "remote.request_timeout_ms",
                value: "0".to_string(),
            });
        }
        if self.remote.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "remote.poll_interval_ms",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_millis(key: &'static str, raw: &str) -> ConfigResult<u64> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ConfigError, RemoteKind};
    use std::collections::HashMap;
    use std::path::Path;

    #[test]
    fn empty_file_gives_memory_defaults() {
        let config = BoardConfig::from_toml_str("", Path::new("kanban.toml")).unwrap();
        assert_eq!(config.remote.kind, RemoteKind::Memory);
        assert_eq!(config.remote.request_timeout_ms, 10_000);
        assert!(config.cache.path.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sections_parse() {
        let raw = r#"
            [remote]
            kind = "rest"
            database_url = "https://board.example.app"
            poll_interval_ms = 500

            [logging]
            level = "debug"
        "#;
        let config = BoardConfig::from_toml_str(raw, Path::new("kanban.toml")).unwrap();
        assert_eq!(config.remote.kind, RemoteKind::Rest);
        assert_eq!(config.remote.poll_interval_ms, 500);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("KANBAN_REMOTE", "rest"),
            ("KANBAN_DATABASE_URL", "https://env.example.app"),
            ("KANBAN_CACHE_PATH", ""),
            ("KANBAN_REQUEST_TIMEOUT_MS", "2500"),
        ]);
        let mut config = BoardConfig::default();
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.remote.kind, RemoteKind::Rest);
        assert_eq!(
            config.remote.database_url.as_deref(),
            Some("https://env.example.app")
        );
        assert_eq!(config.cache.path, None);
        assert_eq!(config.remote.request_timeout_ms, 2500);
    }

    #[test]
    fn rest_without_url_is_rejected() {
        let mut config = BoardConfig::default();
        config.remote.kind = RemoteKind::Rest;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let mut config = BoardConfig::default();
        let err = config
            .apply_env(|key| (key == "KANBAN_POLL_INTERVAL_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("soon"));
    }
}
