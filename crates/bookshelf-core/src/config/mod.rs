//! Client configuration.
//!
//! Values come from the environment (a `.env` file is loaded by hosts before
//! this runs) and fall back to defaults suitable for a local backend.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::DEFAULT_SYNC_INTERVAL;
use crate::util::{is_http_url, normalize_text_option};

pub const API_URL_ENV: &str = "BOOKSHELF_API_URL";
pub const DB_PATH_ENV: &str = "BOOKSHELF_DB_PATH";
pub const SYNC_INTERVAL_ENV: &str = "BOOKSHELF_SYNC_INTERVAL_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "BOOKSHELF_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root, without a trailing slash
    pub api_base_url: String,
    /// Local cache file; hosts pick a platform default when unset
    pub db_path: Option<PathBuf>,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            db_path: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| normalize_text_option(lookup(key));
        let defaults = Self::default();

        let api_base_url = match get(API_URL_ENV) {
            Some(url) => normalize_api_url(&url)?,
            None => defaults.api_base_url,
        };
        let sync_interval = get(SYNC_INTERVAL_ENV)
            .map(|value| parse_secs(SYNC_INTERVAL_ENV, &value))
            .transpose()?
            .unwrap_or(defaults.sync_interval);
        let request_timeout = get(HTTP_TIMEOUT_ENV)
            .map(|value| parse_secs(HTTP_TIMEOUT_ENV, &value))
            .transpose()?
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            api_base_url,
            db_path: get(DB_PATH_ENV).map(PathBuf::from),
            sync_interval,
            request_timeout,
        })
    }

    /// Apply explicit overrides (e.g. command-line flags) on top.
    pub fn with_overrides(mut self, api_url: Option<&str>, db_path: Option<PathBuf>) -> Result<Self> {
        if let Some(url) = api_url.and_then(|url| normalize_text_option(Some(url.to_string()))) {
            self.api_base_url = normalize_api_url(&url)?;
        }
        if db_path.is_some() {
            self.db_path = db_path;
        }
        Ok(self)
    }
}

fn normalize_api_url(raw: &str) -> Result<String> {
    let url = raw.trim();
    if is_http_url(url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(format!(
            "API URL must include http:// or https://, got '{url}'"
        )))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::Config(format!(
            "{key} must be a positive number of seconds, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.sync_interval, Duration::from_secs(6 * 60 * 60));
    }

    #[test]
    fn environment_values_are_normalized() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, " https://books.example.com/api/ "),
            (DB_PATH_ENV, "/tmp/bookshelf.db"),
            (SYNC_INTERVAL_ENV, "60"),
            (HTTP_TIMEOUT_ENV, "   "),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://books.example.com/api");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/bookshelf.db")));
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "books.example.com")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(SYNC_INTERVAL_ENV, "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(HTTP_TIMEOUT_ENV, "soon")])).is_err());
    }

    #[test]
    fn overrides_win_over_environment() {
        let config = ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "http://env:1")]))
            .unwrap()
            .with_overrides(Some("http://flag:2/"), Some(PathBuf::from("flag.db")))
            .unwrap();
        assert_eq!(config.api_base_url, "http://flag:2");
        assert_eq!(config.db_path, Some(PathBuf::from("flag.db")));

        let unchanged = config.clone().with_overrides(Some("  "), None).unwrap();
        assert_eq!(unchanged, config);
    }
}
