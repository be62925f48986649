//! Root payment configuration and provider discovery.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{ProviderConfig, ProviderName};

/// Database settings handed to the payment collaborator untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub echo: bool,
}

/// Event publishing settings handed to the payment collaborator untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingSettings {
    pub broker_type: String,
    pub url: String,
    pub exchange_name: String,
    pub queue_prefix: String,
}

/// Process-wide payment configuration.
///
/// Built once by [`ConfigResolver`](crate::config::ConfigResolver) and
/// shared read-only afterwards. Always holds at least one provider, and
/// `default_provider` is always one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfiguration {
    pub(crate) providers: BTreeMap<ProviderName, ProviderConfig>,
    pub(crate) default_provider: ProviderName,
    pub(crate) frontend_url: String,
    pub(crate) backend_url: String,
    pub database: DatabaseSettings,
    pub messaging: MessagingSettings,
    pub logging_level: String,
    pub debug_mode: bool,
}

/// Why a requested provider cannot serve a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderSelectionError {
    #[error("unknown payment provider '{0}'")]
    Unknown(String),

    #[error("payment provider '{0}' is not configured")]
    Inactive(ProviderName),
}

impl PaymentConfiguration {
    pub fn default_provider(&self) -> ProviderName {
        self.default_provider
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn provider(&self, name: ProviderName) -> Option<&ProviderConfig> {
        self.providers.get(&name)
    }

    pub fn is_active(&self, name: ProviderName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Active providers in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.values()
    }

    pub fn active_names(&self) -> Vec<ProviderName> {
        self.providers.keys().copied().collect()
    }

    /// Pick the provider for a request.
    ///
    /// No explicit choice means the default provider.
    pub fn select(&self, requested: Option<&str>) -> Result<ProviderName, ProviderSelectionError> {
        let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self.default_provider);
        };

        let name: ProviderName = raw
            .parse()
            .map_err(|_| ProviderSelectionError::Unknown(raw.to_string()))?;

        if self.is_active(name) {
            Ok(name)
        } else {
            Err(ProviderSelectionError::Inactive(name))
        }
    }

    /// Discovery view of the active providers.
    pub fn catalog(&self) -> ProviderCatalog {
        ProviderCatalog {
            default_provider: self.default_provider,
            providers: self
                .providers
                .keys()
                .map(|&name| {
                    let caps = name.capabilities();
                    ProviderSummary {
                        name,
                        display_name: caps.display_name,
                        supports_payment_methods: caps.supports_payment_methods,
                        supports_hosted_payments: caps.supports_hosted_payments,
                        is_default: name == self.default_provider,
                    }
                })
                .collect(),
        }
    }
}

/// Response body of the provider discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCatalog {
    pub default_provider: ProviderName,
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub name: ProviderName,
    pub display_name: &'static str,
    pub supports_payment_methods: bool,
    pub supports_hosted_payments: bool,
    pub is_default: bool,
}
