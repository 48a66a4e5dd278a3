//! Service configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | 3000 |
//! | `CATALOG_PATH` | built-in reference catalog |
//! | `MODEL_BASE_URL` | https://api.openai.com/v1 |
//! | `MODEL_NAME` | gpt-4o-mini |
//! | `MODEL_API_KEY` | unset (recommendations unavailable) |
//! | `MODEL_TIMEOUT_SECS` | 30 |
//! | `RETRY_BACKOFF_MS` | 1500 |
//! | `SESSION_TTL_SECS` | 1800 |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Generative model endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub catalog_path: Option<PathBuf>,
    /// None when no API key is set
    pub model: Option<ModelSettings>,
    pub model_timeout: Duration,
    pub retry_backoff: Duration,
    pub session_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            catalog_path: None,
            model: None,
            model_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(1500),
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (env, map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model = lookup("MODEL_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(|api_key| ModelSettings {
                base_url: lookup("MODEL_BASE_URL").unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
                model: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
                api_key,
            });

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            catalog_path: lookup("CATALOG_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            model,
            model_timeout: Duration::from_secs(parse_var(
                &lookup,
                "MODEL_TIMEOUT_SECS",
                defaults.model_timeout.as_secs(),
            )?),
            retry_backoff: Duration::from_millis(parse_var(
                &lookup,
                "RETRY_BACKOFF_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
            session_ttl: Duration::from_secs(parse_var(
                &lookup,
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
        })
    }
}
