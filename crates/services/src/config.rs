//! Runtime configuration read from the environment (optionally via `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use storage::sqlite::PoolSettings;
use tracing::{debug, info};
use vocab_core::time::DisplayZone;

use crate::error::ConfigError;

const DB_URL_ENV: &str = "VOCAB_DB_URL";
const DICTIONARY_PATH_ENV: &str = "VOCAB_DICTIONARY_PATH";
const DB_MAX_CONNECTIONS_ENV: &str = "VOCAB_DB_MAX_CONNECTIONS";
const DB_TIMEOUT_ENV: &str = "VOCAB_DB_TIMEOUT_SECS";
const DEFAULT_WORDS_LIMIT_ENV: &str = "VOCAB_DEFAULT_WORDS_LIMIT";
const HISTORY_LIMIT_ENV: &str = "VOCAB_HISTORY_LIMIT";
const WORDS_PER_PAGE_ENV: &str = "VOCAB_WORDS_PER_PAGE";
const UTC_OFFSET_ENV: &str = "VOCAB_UTC_OFFSET_HOURS";
const STATE_TTL_ENV: &str = "VOCAB_STATE_TTL_SECS";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub dictionary_path: PathBuf,
    pub pool: PoolSettings,
    /// Cap on how many shared words are offered in menus and quizzes.
    pub default_words_limit: u32,
    pub history_limit: u32,
    pub words_per_page: usize,
    pub zone: DisplayZone,
    /// Idle time after which a conversation falls back to the main menu.
    pub state_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_url: "sqlite:vocab.sqlite3?mode=rwc".into(),
            dictionary_path: PathBuf::from("dictionary.xml"),
            pool: PoolSettings::default(),
            default_words_limit: 12,
            history_limit: 10,
            words_per_page: 6,
            zone: DisplayZone::default(),
            state_ttl: Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "loaded .env"),
            Err(err) => debug!(error = %err, "no .env loaded"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing or blank keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(DB_URL_ENV) {
            config.db_url = url;
        }
        if let Some(path) = get(DICTIONARY_PATH_ENV) {
            config.dictionary_path = PathBuf::from(path);
        }
        if let Some(n) = parse_opt::<u32>(DB_MAX_CONNECTIONS_ENV, get(DB_MAX_CONNECTIONS_ENV))? {
            if n == 0 {
                return Err(invalid(DB_MAX_CONNECTIONS_ENV, n.to_string()));
            }
            config.pool.max_connections = n;
        }
        if let Some(secs) = parse_opt::<u64>(DB_TIMEOUT_ENV, get(DB_TIMEOUT_ENV))? {
            config.pool.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_opt(DEFAULT_WORDS_LIMIT_ENV, get(DEFAULT_WORDS_LIMIT_ENV))? {
            config.default_words_limit = n;
        }
        if let Some(n) = parse_opt(HISTORY_LIMIT_ENV, get(HISTORY_LIMIT_ENV))? {
            config.history_limit = n;
        }
        if let Some(n) = parse_opt::<usize>(WORDS_PER_PAGE_ENV, get(WORDS_PER_PAGE_ENV))? {
            if n == 0 {
                return Err(invalid(WORDS_PER_PAGE_ENV, n.to_string()));
            }
            config.words_per_page = n;
        }
        if let Some(hours) = parse_opt::<i32>(UTC_OFFSET_ENV, get(UTC_OFFSET_ENV))? {
            config.zone = DisplayZone::from_hours(hours)
                .ok_or_else(|| invalid(UTC_OFFSET_ENV, hours.to_string()))?;
        }
        if let Some(secs) = parse_opt::<u64>(STATE_TTL_ENV, get(STATE_TTL_ENV))? {
            config.state_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { key, value }
}

fn parse_opt<T: FromStr>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| value.trim().parse::<T>().map_err(|_| invalid(key, value)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_words_limit, 12);
        assert_eq!(config.words_per_page, 6);
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.zone, DisplayZone::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("VOCAB_DB_URL", "sqlite::memory:"),
            ("VOCAB_DB_TIMEOUT_SECS", "5"),
            ("VOCAB_UTC_OFFSET_HOURS", "0"),
            ("VOCAB_HISTORY_LIMIT", " 3 "),
        ]))
        .unwrap();
        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.pool.timeout, Duration::from_secs(5));
        assert_eq!(config.zone, DisplayZone::from_hours(0).unwrap());
        assert_eq!(config.history_limit, 3);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("VOCAB_WORDS_PER_PAGE", "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "VOCAB_WORDS_PER_PAGE",
                ..
            }
        ));
        assert!(AppConfig::from_lookup(lookup(&[("VOCAB_WORDS_PER_PAGE", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("VOCAB_UTC_OFFSET_HOURS", "40")])).is_err());
    }
}
