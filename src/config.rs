//! Runtime configuration read from the environment.
//!
//! The binary loads `.env` (or the bundled `assets/config.env`) before calling
//! [`AppConfig::from_env`], so every knob here can also be set there.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DAILY_LIMIT: u32 = 10;
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Questions a non-admin session may ask before sends are refused.
    pub daily_limit: u32,
    pub reply_delay: Duration,
    /// Signup backend. `None` leaves signup unavailable.
    pub auth_endpoint: Option<String>,
    /// Overrides the platform storage directory on native builds.
    pub data_dir: Option<PathBuf>,
    pub token_ttl: time::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            reply_delay: DEFAULT_REPLY_DELAY,
            auth_endpoint: None,
            data_dir: None,
            token_ttl: time::Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset or blank keys
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = AppConfig::default();

        if let Some(raw) = get("CHAT_DAILY_LIMIT") {
            config.daily_limit = parse_value("CHAT_DAILY_LIMIT", &raw)?;
        }
        if let Some(raw) = get("CHAT_REPLY_DELAY_MS") {
            let ms: u64 = parse_value("CHAT_REPLY_DELAY_MS", &raw)?;
            config.reply_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = get("AUTH_TOKEN_TTL_DAYS") {
            let days: i64 = parse_value("AUTH_TOKEN_TTL_DAYS", &raw)?;
            if days <= 0 {
                return Err(ConfigError::Invalid {
                    key: "AUTH_TOKEN_TTL_DAYS",
                    value: raw,
                });
            }
            config.token_ttl = time::Duration::days(days);
        }
        config.auth_endpoint = get("AUTH_ENDPOINT");
        config.data_dir = get("CHAT_DATA_DIR").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.daily_limit, 10);
        assert_eq!(config.token_ttl, time::Duration::days(7));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CHAT_DAILY_LIMIT", "3"),
            ("CHAT_REPLY_DELAY_MS", "250"),
            ("AUTH_ENDPOINT", "http://localhost:8080/signup"),
            ("CHAT_DATA_DIR", "/tmp/chat"),
        ]))
        .unwrap();
        assert_eq!(config.daily_limit, 3);
        assert_eq!(config.reply_delay, Duration::from_millis(250));
        assert_eq!(
            config.auth_endpoint.as_deref(),
            Some("http://localhost:8080/signup")
        );
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/chat")));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_ENDPOINT", "  ")])).unwrap();
        assert_eq!(config.auth_endpoint, None);
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[("CHAT_DAILY_LIMIT", "ten")])).unwrap_err();
        assert!(err.to_string().contains("CHAT_DAILY_LIMIT"));

        assert!(AppConfig::from_lookup(lookup(&[("AUTH_TOKEN_TTL_DAYS", "0")])).is_err());
    }
}
