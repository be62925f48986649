//! Per-provider configuration.

use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;

use super::ProviderName;

/// Provider credentials.
///
/// Secrets never appear in `Debug` output. Equality compares the exposed
/// values so two resolutions of the same environment compare equal.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_secret: None,
            webhook_secret: None,
        }
    }

    pub fn with_api_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(SecretString::new(secret.into()));
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::new(secret.into()));
        self
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        fn exposed(s: &Option<SecretString>) -> Option<&str> {
            s.as_ref().map(|s| s.expose_secret().as_str())
        }

        self.api_key.expose_secret() == other.api_key.expose_secret()
            && exposed(&self.api_secret) == exposed(&other.api_secret)
            && exposed(&self.webhook_secret) == exposed(&other.webhook_secret)
    }
}

impl Eq for Credentials {}

/// User-facing redirect targets after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub success: String,
    pub failure: String,
    pub cancel: String,
}

/// Settings that exist only for a particular provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    Stripe,
    /// PayU posts back to `surl`/`furl`, which mirror the success/failure
    /// callbacks.
    Payu,
    /// Cashfree hosted links return to `return_url` and notify the backend
    /// server-to-server at `notify_url`.
    Cashfree {
        return_url: String,
        notify_url: String,
        collection_mode: Option<String>,
    },
    Razorpay,
}

/// Fully resolved configuration of one active provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub credentials: Credentials,
    pub sandbox_mode: bool,
    pub callbacks: CallbackUrls,
    pub settings: ProviderSettings,
}

impl ProviderConfig {
    /// Flattened string settings in the shape the payment collaborator
    /// consumes (`additional_settings`).
    pub fn additional_settings(&self) -> BTreeMap<&'static str, String> {
        let mut out = BTreeMap::from([
            ("success_url", self.callbacks.success.clone()),
            ("failure_url", self.callbacks.failure.clone()),
            ("cancel_url", self.callbacks.cancel.clone()),
        ]);

        match &self.settings {
            ProviderSettings::Stripe | ProviderSettings::Razorpay => {}
            ProviderSettings::Payu => {
                out.insert("surl", self.callbacks.success.clone());
                out.insert("furl", self.callbacks.failure.clone());
            }
            ProviderSettings::Cashfree {
                return_url,
                notify_url,
                collection_mode,
            } => {
                out.insert("return_url", return_url.clone());
                out.insert("notify_url", notify_url.clone());
                if let Some(mode) = collection_mode {
                    out.insert("collection_mode", mode.clone());
                }
            }
        }

        out
    }
}
