use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SHUTDOWN_DRAIN_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub shutdown: ShutdownConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub api_key: String,
    /// Chat model identifier, e.g. gpt-4o-mini
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the static assets; `index.html` lives here.
    pub static_dir: PathBuf,
    /// Directory holding the `*.prompt` templates.
    pub prompt_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    pub drain_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_dir: Option<PathBuf>,
    pub otlp_endpoint: Option<String>,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(GatewayConfig {
            common: common_config,
            backend: BackendConfig {
                api_key: get_env("OPENAI_API_KEY", None)?,
                model: get_env("OPENAI_API_MODEL", None)?,
                base_url: get_env("OPENAI_BASE_URL", Some(DEFAULT_OPENAI_BASE_URL))?,
                timeout_secs: parse_env("BACKEND_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS)?,
            },
            storage: StorageConfig {
                static_dir: get_env("STATIC_DIR", Some("static"))?.into(),
                prompt_dir: get_env("PROMPT_DIR", Some("static/document"))?.into(),
            },
            shutdown: ShutdownConfig {
                drain_secs: parse_env("SHUTDOWN_DRAIN_SECS", DEFAULT_SHUTDOWN_DRAIN_SECS)?,
            },
            observability: ObservabilityConfig {
                log_dir: env::var("LOG_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            },
        })
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn drain_deadline(&self) -> Duration {
        Duration::from_secs(self.shutdown.drain_secs)
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn parse_env(key: &str, default: u64) -> Result<u64, AppError> {
    get_env(key, Some(&default.to_string()))?
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is not a valid number: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_variable_is_config_error() {
        let err = get_env("PROMPT_GATEWAY_TEST_SURELY_UNSET", None).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = get_env("PROMPT_GATEWAY_TEST_ALSO_UNSET", Some("static")).unwrap();
        assert_eq!(value, "static");
        assert_eq!(parse_env("PROMPT_GATEWAY_TEST_ALSO_UNSET", 5).unwrap(), 5);
    }
}
