use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Without a Redis section the remote mirror runs in-process.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub legacy_cache: LegacyCacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmsConfig {
    /// Stands in for the device's SEND_SMS permission.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_destination")]
    pub default_destination: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_destination: default_destination(),
        }
    }
}

fn default_destination() -> String {
    "+918667488608".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LegacyCacheConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for LegacyCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    stagepass_core::legacy::DEFAULT_CAPACITY
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment overlay, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `STAGEPASS_SMS__ENABLED=true`
            .add_source(config::Environment::with_prefix("STAGEPASS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            port = 8080

            [database]
            url = "sqlite://bookings.db"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert!(config.redis.is_none());
        assert!(!config.sms.enabled);
        assert_eq!(config.sms.default_destination, "+918667488608");
        assert_eq!(config.legacy_cache.capacity, 10);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [server]
            port = 3000

            [database]
            url = "sqlite::memory:"

            [redis]
            url = "redis://127.0.0.1/"

            [sms]
            enabled = true
            default_destination = "+15555550100"

            [legacy_cache]
            capacity = 3
            "#,
        );

        assert_eq!(config.redis.unwrap().url, "redis://127.0.0.1/");
        assert!(config.sms.enabled);
        assert_eq!(config.sms.default_destination, "+15555550100");
        assert_eq!(config.legacy_cache.capacity, 3);
    }
}
