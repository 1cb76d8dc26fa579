//! Service settings read from the environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_FOLLOW_UP_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_GEMINI_API_KEY"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY must be set in the environment or a .env file")]
    MissingApiKey,
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Option<Duration>,
}

// Keeps the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub addr: SocketAddr,
    pub follow_up_delay: Duration,
    pub static_dir: PathBuf,
}

impl Config {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|&key| get(key))
            .ok_or(ConfigError::MissingApiKey)?;

        let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = get("GEMINI_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout = get("AI_VISION_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_u64("AI_VISION_REQUEST_TIMEOUT_SECS", v))
            .transpose()?
            .map(Duration::from_secs);

        let follow_up_delay = get("AI_VISION_FOLLOW_UP_DELAY_MS")
            .map(|v| parse_u64("AI_VISION_FOLLOW_UP_DELAY_MS", v))
            .transpose()?
            .map_or(DEFAULT_FOLLOW_UP_DELAY, Duration::from_millis);

        let addr_value = get("AI_VISION_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "AI_VISION_ADDR",
            value: addr_value.clone(),
            reason: e.to_string(),
        })?;

        let static_dir = get("AI_VISION_STATIC_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        Ok(Config {
            gemini: GeminiConfig {
                api_key,
                model,
                base_url,
                request_timeout,
            },
            addr,
            follow_up_delay,
            static_dir,
        })
    }
}

fn parse_u64(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.gemini.base_url, DEFAULT_API_BASE);
        assert_eq!(config.gemini.request_timeout, None);
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.follow_up_delay, DEFAULT_FOLLOW_UP_DELAY);
        assert!(config.static_dir.join("index.html").exists());
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn falls_back_to_google_prefixed_key() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_GEMINI_API_KEY", "k2")])).unwrap();
        assert_eq!(config.gemini.api_key, "k2");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
            ("AI_VISION_ADDR", "127.0.0.1:8080"),
            ("AI_VISION_FOLLOW_UP_DELAY_MS", "250"),
            ("AI_VISION_REQUEST_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.base_url, "http://localhost:9000/v1beta");
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.follow_up_delay, Duration::from_millis(250));
        assert_eq!(config.gemini.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("AI_VISION_FOLLOW_UP_DELAY_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AI_VISION_FOLLOW_UP_DELAY_MS"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "top-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("top-secret"));
    }
}
