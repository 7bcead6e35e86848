use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Read an environment variable, falling back to `default` when unset.
///
/// Variables without a default are mandatory.
pub fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match std::env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

/// Read and parse an environment variable.
pub fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(default))?;
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_uses_default_when_unset() {
        let value = get_env("SERVICE_CORE_TEST_UNSET_VARIABLE", Some("fallback")).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_get_env_without_default_is_config_error() {
        let err = get_env("SERVICE_CORE_TEST_UNSET_VARIABLE", None).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_parse_env_parses_default() {
        let value: u16 = parse_env("SERVICE_CORE_TEST_UNSET_PORT", "9090").unwrap();
        assert_eq!(value, 9090);
    }

    #[test]
    fn test_parse_env_rejects_garbage_default() {
        let err = parse_env::<u16>("SERVICE_CORE_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
