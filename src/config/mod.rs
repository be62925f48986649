//! Application configuration module
//!
//! The process environment is captured once into an [`EnvSnapshot`]. Server
//! settings are read from it with the `config` crate under the `PAYMENT_HUB`
//! prefix (nested values separated by `__`); payment providers are resolved
//! from the conventional provider variables (`STRIPE_API_KEY`,
//! `PAYU_API_KEY`, `FRONTEND_URL`, ...) by [`ConfigResolver`].
//!
//! # Example
//!
//! ```no_run
//! use payment_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Default provider: {}", config.payment.default_provider());
//! ```

mod env;
mod error;
mod payment;
mod server;

pub use env::EnvSnapshot;
pub use error::{ConfigError, ValidationError};
pub use payment::ConfigResolver;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

use crate::domain::provider::PaymentConfiguration;

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    pub server: ServerConfig,

    /// Active payment providers and their callback URLs
    pub payment: PaymentConfiguration,
}

/// Sections read through the `config` crate.
#[derive(Debug, Deserialize)]
struct RuntimeSections {
    #[serde(default)]
    server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Loads `.env` if present, then resolves every section from the same
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if server values cannot be parsed into the
    /// expected types. Provider resolution itself never fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(&EnvSnapshot::from_process())
    }

    /// Build configuration from an explicit snapshot.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let source: config::Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let sections: RuntimeSections = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_HUB")
                    .separator("__")
                    .source(Some(source)),
            )
            .build()?
            .try_deserialize()?;

        Ok(Self {
            server: sections.server,
            payment: ConfigResolver::new(env).resolve(),
        })
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an unusable bind address or timeout, or
    /// when a resolved base URL is not an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        validate_url("FRONTEND_URL", self.payment.frontend_url())?;
        validate_url("BACKEND_URL", self.payment.backend_url())?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ValidationError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::ProviderName;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_load_from_snapshot() {
        let config = AppConfig::from_env(&env(&[
            ("PAYMENT_HUB__SERVER__PORT", "3000"),
            ("PAYMENT_HUB__SERVER__ENVIRONMENT", "production"),
            ("PAYU_API_KEY", "merchant"),
            ("PAYU_API_SECRET", "salt"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.payment.default_provider(), ProviderName::Payu);
    }

    #[test]
    fn test_server_defaults() {
        let config = AppConfig::from_env(&env(&[])).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_format_from_env() {
        let config =
            AppConfig::from_env(&env(&[("PAYMENT_HUB__SERVER__LOG_FORMAT", "json")])).unwrap();
        assert_eq!(config.server.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_port_is_a_load_error() {
        let result = AppConfig::from_env(&env(&[("PAYMENT_HUB__SERVER__PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_validate_rejects_relative_frontend_url() {
        let config = AppConfig::from_env(&env(&[("FRONTEND_URL", "shop.test")])).unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidUrl {
                name: "FRONTEND_URL",
                value: "shop.test".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("X", "https://a.test").is_ok());
        assert!(validate_url("X", "http://localhost:3000").is_ok());
        assert!(validate_url("X", "https://").is_err());
        assert!(validate_url("X", "ftp://a.test").is_err());
    }
}
