//! Configuration management for the Medfast backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with MEDFAST_ prefix

use base64::{engine::general_purpose, Engine as _};
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Public URL of the web client, used in verification links
    pub base_url: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT and token lifetime configuration
    pub token: TokenConfig,

    /// E-mail verification configuration
    pub verification: VerificationConfig,

    /// Outgoing mail configuration
    pub mail: MailConfig,

    /// Daily test result job configuration
    pub scheduler: SchedulerConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// Base64 encoded HMAC key for signing JWT tokens
    pub signing_key: String,

    /// Access token lifetime in seconds
    pub access_timeout: i64,

    /// Refresh token lifetime in seconds
    pub refresh_timeout: i64,

    /// One-time password lifetime in seconds
    pub reset_password_timeout: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    /// Verification code lifetime in seconds
    pub code_timeout: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// When false, messages are logged instead of sent
    pub enabled: bool,

    /// SMTP relay host
    pub host: String,

    /// SMTP relay port
    pub port: u16,

    /// SMTP user; also the sender and support mailbox
    pub username: String,

    /// SMTP password
    pub password: String,

    /// Attempts per message before giving up
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Local hour of the daily run
    pub hour: u32,

    /// Local minute of the daily run
    pub minute: u32,

    /// Offset of the scheduler's clock from UTC
    pub utc_offset_hours: i32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("MEDFAST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder(), &environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MEDFAST_ prefix)
            .add_source(
                Environment::with_prefix("MEDFAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("base_url", "http://localhost:3000")?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", true)?
            .set_default("token.access_timeout", 3600)?
            .set_default("token.refresh_timeout", 86400)?
            .set_default("token.reset_password_timeout", 600)?
            .set_default("verification.code_timeout", 86400)?
            .set_default("mail.enabled", environment != "development")?
            .set_default("mail.host", "localhost")?
            .set_default("mail.port", 587)?
            .set_default("mail.password", "")?
            .set_default("mail.max_retries", 3)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.hour", 8)?
            .set_default("scheduler.minute", 15)?
            .set_default("scheduler.utc_offset_hours", 2)?
            .set_default("logging.format", "pretty")
    }

    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));

        if self.base_url.trim().is_empty() {
            return invalid("base_url must not be blank");
        }
        if url::Url::parse(&self.base_url).is_err() {
            return invalid("base_url must be an absolute URL");
        }
        if self.token.signing_key.len() < 50 {
            return invalid("token.signing_key's length must be greater than 50");
        }
        if self.token.signing_key_bytes().is_err() {
            return invalid("token.signing_key must be base64 encoded");
        }
        if self.token.access_timeout < 0
            || self.token.refresh_timeout < 0
            || self.token.reset_password_timeout < 0
        {
            return invalid("token timeouts must be greater or equal to 0");
        }
        if self.verification.code_timeout < 0 {
            return invalid("verification.code_timeout must be greater or equal to 0");
        }
        if !is_mailbox(&self.mail.username) {
            return invalid("mail.username must follow the format user@example.com");
        }
        if self.mail.max_retries == 0 {
            return invalid("mail.max_retries must be at least 1");
        }
        if self.scheduler.hour > 23 || self.scheduler.minute > 59 {
            return invalid("scheduler.hour/minute must form a valid time of day");
        }
        if !(-12..=14).contains(&self.scheduler.utc_offset_hours) {
            return invalid("scheduler.utc_offset_hours must be between -12 and 14");
        }
        Ok(())
    }
}

impl TokenConfig {
    /// Decoded HMAC key
    pub fn signing_key_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(self.signing_key.trim())
    }
}

fn is_mailbox(address: &str) -> bool {
    match address.split_once('@') {
        Some((user, domain)) => {
            !user.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Base64 of an ASCII test secret
    pub const TEST_SIGNING_KEY: &str =
        "dGVzdC1zaWduaW5nLWtleS1mb3ItbWVkZmFzdC11bml0LXRlc3RzLW9ubHktZG8tbm90LXVzZS0xMjM0NQ==";

    pub fn test_config() -> Config {
        Config {
            environment: "test".to_string(),
            base_url: "http://localhost:3000".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/medfast_test".to_string(),
                max_connections: 1,
                min_connections: 1,
                run_migrations: false,
            },
            token: TokenConfig {
                signing_key: TEST_SIGNING_KEY.to_string(),
                access_timeout: 3600,
                refresh_timeout: 7200,
                reset_password_timeout: 600,
            },
            verification: VerificationConfig { code_timeout: 86400 },
            mail: MailConfig {
                enabled: false,
                host: "localhost".to_string(),
                port: 587,
                username: "support@medfast.test".to_string(),
                password: String::new(),
                max_retries: 3,
            },
            scheduler: SchedulerConfig {
                enabled: false,
                hour: 8,
                minute: 15,
                utc_offset_hours: 2,
            },
            logging: LoggingConfig {
                format: LogFormat::Pretty,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_signing_key_rejected() {
        let mut config = test_config();
        config.token.signing_key = "c2hvcnQ=".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_base_url_rejected() {
        let mut config = test_config();
        config.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mailbox_rejected() {
        let mut config = test_config();
        config.mail.username = "support".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let mut config = test_config();
        config.token.refresh_timeout = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_disable_mail_in_development() {
        let built = Config::defaults(config::Config::builder(), "development")
            .unwrap()
            .set_override("database.url", "postgres://localhost/medfast")
            .unwrap()
            .set_override("token.signing_key", TEST_SIGNING_KEY)
            .unwrap()
            .set_override("mail.username", "support@medfast.test")
            .unwrap()
            .build()
            .unwrap();
        let config: Config = built.try_deserialize().unwrap();

        assert!(!config.mail.enabled);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.token.access_timeout, 3600);
        assert_eq!(config.scheduler.hour, 8);
        assert_eq!(config.scheduler.minute, 15);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }
}
