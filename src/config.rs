use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Medboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_REST_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory
/// ~/Medboard/ on all platforms, falling back to the working directory
/// when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the local SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("medboard.db")
}

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "medboard_lib=info,medboard=info,tower_http=warn"
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown backend '{0}' (expected sqlite, memory or rest)")]
    UnknownBackend(String),
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
    #[error("{0} must be set for the rest backend")]
    MissingVar(&'static str),
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Memory,
    Rest,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            "rest" => Ok(Self::Rest),
            other => Err(ConfigError::UnknownBackend(other.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub database_path: PathBuf,
    pub bind: SocketAddr,
    /// Load demo records into an empty store on startup.
    pub seed_demo_data: bool,
    pub rest: Option<RestConfig>,
}

impl AppConfig {
    /// Read `MEDBOARD_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup("MEDBOARD_BACKEND") {
            Some(raw) => raw.parse()?,
            None => BackendKind::Sqlite,
        };

        let database_path = lookup("MEDBOARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(database_path);

        let bind_raw = lookup("MEDBOARD_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        let seed_demo_data = match lookup("MEDBOARD_SEED") {
            Some(raw) => parse_bool("MEDBOARD_SEED", &raw)?,
            None => false,
        };

        let rest = if backend == BackendKind::Rest {
            let base_url = lookup("MEDBOARD_REST_URL").ok_or(ConfigError::MissingVar("MEDBOARD_REST_URL"))?;
            let api_key = lookup("MEDBOARD_REST_KEY").ok_or(ConfigError::MissingVar("MEDBOARD_REST_KEY"))?;
            let timeout_secs = match lookup("MEDBOARD_REST_TIMEOUT_SECS") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "MEDBOARD_REST_TIMEOUT_SECS",
                    value: raw.clone(),
                })?,
                None => DEFAULT_REST_TIMEOUT_SECS,
            };
            Some(RestConfig { base_url, api_key, timeout_secs })
        } else {
            None
        };

        Ok(Self { backend, database_path, bind, seed_demo_data, rest })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: raw.into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Medboard"));
    }

    #[test]
    fn database_under_app_data() {
        assert!(database_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_to_local_sqlite() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert!(!config.seed_demo_data);
        assert!(config.rest.is_none());
    }

    #[test]
    fn rest_backend_requires_url_and_key() {
        let err = AppConfig::from_lookup(lookup(&[("MEDBOARD_BACKEND", "rest")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("MEDBOARD_REST_URL"));

        let config = AppConfig::from_lookup(lookup(&[
            ("MEDBOARD_BACKEND", "REST"),
            ("MEDBOARD_REST_URL", "https://db.example.com"),
            ("MEDBOARD_REST_KEY", "anon"),
            ("MEDBOARD_REST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        let rest = config.rest.unwrap();
        assert_eq!(rest.timeout_secs, 5);
        assert_eq!(rest.api_key, "anon");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("MEDBOARD_BACKEND", "mysql")])),
            Err(ConfigError::UnknownBackend(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("MEDBOARD_BIND", "localhost")])),
            Err(ConfigError::InvalidBind(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("MEDBOARD_SEED", "maybe")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
