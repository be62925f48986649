//! Payment provider configuration resolution
//!
//! Turns an [`EnvSnapshot`] into the immutable [`PaymentConfiguration`]:
//! which providers are active, which one is the default, and where each
//! provider sends users and notifications after checkout.

use std::collections::BTreeMap;

use crate::domain::provider::{
    CallbackUrls, Credentials, DatabaseSettings, MessagingSettings, PaymentConfiguration,
    ProviderConfig, ProviderName, ProviderSettings,
};

use super::env::EnvSnapshot;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Environment keys holding a provider's credentials, first match wins.
struct CredentialKeys {
    api_key: &'static [&'static str],
    api_secret: &'static [&'static str],
    webhook_secret: &'static [&'static str],
    secret_required: bool,
}

/// Placeholder credentials used when a provider has to be force-activated.
struct Placeholders {
    api_key: &'static str,
    api_secret: Option<&'static str>,
    webhook_secret: Option<&'static str>,
}

fn credential_keys(provider: ProviderName) -> CredentialKeys {
    match provider {
        ProviderName::Stripe => CredentialKeys {
            api_key: &["STRIPE_API_KEY", "STRIPE_SECRET_KEY"],
            api_secret: &[],
            webhook_secret: &["STRIPE_WEBHOOK_SECRET"],
            secret_required: false,
        },
        ProviderName::Payu => CredentialKeys {
            api_key: &["PAYU_API_KEY", "PAYU_MERCHANT_KEY"],
            api_secret: &["PAYU_API_SECRET", "PAYU_MERCHANT_SALT"],
            webhook_secret: &["PAYU_WEBHOOK_SECRET"],
            secret_required: true,
        },
        ProviderName::Cashfree => CredentialKeys {
            api_key: &["CASHFREE_CLIENT_ID", "CASHFREE_API_KEY"],
            api_secret: &["CASHFREE_CLIENT_SECRET", "CASHFREE_API_SECRET"],
            webhook_secret: &["CASHFREE_WEBHOOK_SECRET"],
            secret_required: true,
        },
        ProviderName::Razorpay => CredentialKeys {
            api_key: &["RAZORPAY_API_KEY", "RAZORPAY_KEY_ID"],
            api_secret: &["RAZORPAY_API_SECRET", "RAZORPAY_KEY_SECRET"],
            webhook_secret: &["RAZORPAY_WEBHOOK_SECRET"],
            secret_required: true,
        },
    }
}

fn placeholders(provider: ProviderName) -> Placeholders {
    match provider {
        ProviderName::Stripe => Placeholders {
            api_key: "sk_test_your_test_key",
            api_secret: None,
            webhook_secret: Some("whsec_your_webhook_secret"),
        },
        ProviderName::Payu => Placeholders {
            api_key: "your_payu_merchant_key",
            api_secret: Some("your_payu_merchant_salt"),
            webhook_secret: None,
        },
        ProviderName::Cashfree => Placeholders {
            api_key: "your_cashfree_client_id",
            api_secret: Some("your_cashfree_client_secret"),
            webhook_secret: None,
        },
        ProviderName::Razorpay => Placeholders {
            api_key: "rzp_test_your_key_id",
            api_secret: Some("your_razorpay_key_secret"),
            webhook_secret: None,
        },
    }
}

/// Resolves the payment configuration from environment input.
///
/// Resolution is a pure function of the snapshot: resolving the same
/// snapshot twice yields equal configurations.
pub struct ConfigResolver<'a> {
    env: &'a EnvSnapshot,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(env: &'a EnvSnapshot) -> Self {
        Self { env }
    }

    pub fn resolve(&self) -> PaymentConfiguration {
        let frontend_url = self.frontend_url();
        let backend_url = self.backend_url();

        let mut providers = BTreeMap::new();
        for name in ProviderName::ALL {
            match self.credentials(name) {
                Some(credentials) => {
                    tracing::info!(provider = %name, "payment provider activated");
                    providers.insert(
                        name,
                        self.provider_config(name, credentials, &frontend_url, &backend_url),
                    );
                }
                None => {
                    tracing::debug!(provider = %name, "payment provider skipped: credentials missing");
                }
            }
        }

        if providers.is_empty() {
            let name = ProviderName::ALL[0];
            tracing::warn!(
                provider = %name,
                "no payment provider has credentials, activating baseline provider with placeholders"
            );
            let credentials = self.baseline_credentials(name);
            providers.insert(
                name,
                self.provider_config(name, credentials, &frontend_url, &backend_url),
            );
        }

        let default_provider = self.default_provider(&providers);

        PaymentConfiguration {
            providers,
            default_provider,
            frontend_url,
            backend_url,
            database: DatabaseSettings {
                url: self
                    .env
                    .get("DATABASE_URL")
                    .unwrap_or("sqlite://./payments.db")
                    .to_string(),
                echo: self.env.flag("DB_ECHO").unwrap_or(false),
            },
            messaging: MessagingSettings {
                broker_type: self
                    .env
                    .get("MESSAGE_BROKER_TYPE")
                    .unwrap_or("memory")
                    .to_string(),
                url: self
                    .env
                    .get("MESSAGE_BROKER_URL")
                    .unwrap_or("memory://")
                    .to_string(),
                exchange_name: "payments".to_string(),
                queue_prefix: "payment_".to_string(),
            },
            logging_level: self.env.get("LOGGING_LEVEL").unwrap_or("INFO").to_string(),
            debug_mode: self.env.flag("DEBUG").unwrap_or(false),
        }
    }

    /// Public base URL of the frontend, without trailing slash.
    pub fn frontend_url(&self) -> String {
        let raw = self
            .env
            .first_of(&["FRONTEND_URL", "NEXT_PUBLIC_APP_URL"])
            .unwrap_or(DEFAULT_FRONTEND_URL);
        strip_trailing_slash(raw)
    }

    /// Public base URL of this backend, without trailing slash.
    pub fn backend_url(&self) -> String {
        strip_trailing_slash(self.env.get("BACKEND_URL").unwrap_or(DEFAULT_BACKEND_URL))
    }

    fn credentials(&self, name: ProviderName) -> Option<Credentials> {
        let keys = credential_keys(name);

        let api_key = self.env.first_of(keys.api_key)?;
        let api_secret = self.env.first_of(keys.api_secret);
        if keys.secret_required && api_secret.is_none() {
            return None;
        }

        let mut credentials = Credentials::new(api_key);
        if let Some(secret) = api_secret {
            credentials = credentials.with_api_secret(secret);
        }
        if let Some(secret) = self.env.first_of(keys.webhook_secret) {
            credentials = credentials.with_webhook_secret(secret);
        }
        Some(credentials)
    }

    /// Whatever the environment holds for `name`, topped up with placeholders.
    fn baseline_credentials(&self, name: ProviderName) -> Credentials {
        let keys = credential_keys(name);
        let defaults = placeholders(name);

        let mut credentials =
            Credentials::new(self.env.first_of(keys.api_key).unwrap_or(defaults.api_key));
        if let Some(secret) = self.env.first_of(keys.api_secret).or(defaults.api_secret) {
            credentials = credentials.with_api_secret(secret);
        }
        if let Some(secret) = self
            .env
            .first_of(keys.webhook_secret)
            .or(defaults.webhook_secret)
        {
            credentials = credentials.with_webhook_secret(secret);
        }
        credentials
    }

    fn default_provider(&self, active: &BTreeMap<ProviderName, ProviderConfig>) -> ProviderName {
        // `active` is never empty here; the baseline provider was inserted above.
        let first = active.keys().next().copied().unwrap_or(ProviderName::ALL[0]);

        let Some(requested) = self.env.get("DEFAULT_PAYMENT_PROVIDER") else {
            return first;
        };

        match requested.parse::<ProviderName>() {
            Ok(name) if active.contains_key(&name) => name,
            Ok(name) => {
                tracing::warn!(
                    requested = %name,
                    fallback = %first,
                    "default payment provider is not active, falling back"
                );
                first
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %first, "invalid default payment provider");
                first
            }
        }
    }

    fn provider_config(
        &self,
        name: ProviderName,
        credentials: Credentials,
        frontend_url: &str,
        backend_url: &str,
    ) -> ProviderConfig {
        let callbacks = self.callbacks(name, frontend_url);
        let settings = self.settings(name, &callbacks, backend_url);
        let sandbox_mode = self
            .env
            .flag(&format!("{}_SANDBOX_MODE", name.env_prefix()))
            .or_else(|| self.env.flag("PAYMENT_SANDBOX_MODE"))
            .unwrap_or(true);

        ProviderConfig {
            name,
            credentials,
            sandbox_mode,
            callbacks,
            settings,
        }
    }

    fn callbacks(&self, name: ProviderName, frontend_url: &str) -> CallbackUrls {
        let prefix = name.env_prefix();
        let (success_alias, failure_alias) = match name {
            ProviderName::Payu => (Some("PAYU_SURL"), Some("PAYU_FURL")),
            _ => (None, None),
        };

        let resolve = |action: &str, alias: Option<&str>| {
            let primary = format!("{prefix}_{}_URL", action.to_ascii_uppercase());
            self.env
                .get(&primary)
                .or_else(|| alias.and_then(|a| self.env.get(a)))
                .map(str::to_string)
                .unwrap_or_else(|| format!("{frontend_url}/{name}/{action}"))
        };

        CallbackUrls {
            success: resolve("success", success_alias),
            failure: resolve("failure", failure_alias),
            cancel: resolve("cancel", None),
        }
    }

    fn settings(
        &self,
        name: ProviderName,
        callbacks: &CallbackUrls,
        backend_url: &str,
    ) -> ProviderSettings {
        match name {
            ProviderName::Stripe => ProviderSettings::Stripe,
            ProviderName::Payu => ProviderSettings::Payu,
            ProviderName::Razorpay => ProviderSettings::Razorpay,
            ProviderName::Cashfree => ProviderSettings::Cashfree {
                return_url: self
                    .env
                    .get("CASHFREE_RETURN_URL")
                    .map(str::to_string)
                    .unwrap_or_else(|| callbacks.success.clone()),
                notify_url: self
                    .env
                    .get("CASHFREE_NOTIFY_URL")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{backend_url}/api/webhooks/{name}")),
                collection_mode: self.env.get("CASHFREE_COLLECTION_MODE").map(str::to_string),
            },
        }
    }
}

fn strip_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use secrecy::ExposeSecret;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    fn resolve(pairs: &[(&str, &str)]) -> PaymentConfiguration {
        ConfigResolver::new(&env(pairs)).resolve()
    }

    const PAYU: [(&str, &str); 2] = [("PAYU_API_KEY", "merchant"), ("PAYU_API_SECRET", "salt")];

    #[test]
    fn resolving_twice_yields_identical_configuration() {
        let pairs = [
            ("STRIPE_API_KEY", "sk_test_1"),
            ("CASHFREE_CLIENT_ID", "cf_id"),
            ("CASHFREE_CLIENT_SECRET", "cf_secret"),
            ("FRONTEND_URL", "https://shop.test/"),
        ];
        assert_eq!(resolve(&pairs), resolve(&pairs));
    }

    #[test]
    fn providers_without_credentials_are_inactive() {
        let config = resolve(&[
            ("STRIPE_API_KEY", "sk_test_1"),
            ("RAZORPAY_KEY_ID", "rzp_test_1"),
            ("CASHFREE_CLIENT_SECRET", "orphan_secret"),
        ]);

        assert_eq!(config.active_names(), vec![ProviderName::Stripe]);
        assert!(!config.is_active(ProviderName::Razorpay));
        assert!(!config.is_active(ProviderName::Cashfree));
        assert!(!config.is_active(ProviderName::Payu));
    }

    #[test]
    fn blank_credentials_do_not_activate() {
        let config = resolve(&[("PAYU_API_KEY", "merchant"), ("PAYU_API_SECRET", "   ")]);
        assert!(!config.is_active(ProviderName::Payu));
    }

    #[test]
    fn credential_aliases_activate_providers() {
        let config = resolve(&[
            ("PAYU_MERCHANT_KEY", "merchant"),
            ("PAYU_MERCHANT_SALT", "salt"),
            ("RAZORPAY_KEY_ID", "rzp_test_1"),
            ("RAZORPAY_KEY_SECRET", "rzp_secret"),
        ]);

        assert_eq!(
            config.active_names(),
            vec![ProviderName::Payu, ProviderName::Razorpay]
        );
        let payu = config.provider(ProviderName::Payu).unwrap();
        assert_eq!(payu.credentials.api_key.expose_secret(), "merchant");
        assert_eq!(
            payu.credentials.api_secret.as_ref().unwrap().expose_secret(),
            "salt"
        );
    }

    #[test]
    fn empty_environment_activates_exactly_the_baseline() {
        let config = resolve(&[]);

        assert_eq!(config.active_names(), vec![ProviderName::Stripe]);
        assert_eq!(config.default_provider(), ProviderName::Stripe);
        let stripe = config.provider(ProviderName::Stripe).unwrap();
        assert_eq!(stripe.credentials.api_key.expose_secret(), "sk_test_your_test_key");
        assert_eq!(
            stripe
                .credentials
                .webhook_secret
                .as_ref()
                .unwrap()
                .expose_secret(),
            "whsec_your_webhook_secret"
        );
    }

    #[test]
    fn baseline_keeps_partial_values() {
        let config = resolve(&[("STRIPE_WEBHOOK_SECRET", "whsec_real")]);
        let stripe = config.provider(ProviderName::Stripe).unwrap();
        assert_eq!(stripe.credentials.api_key.expose_secret(), "sk_test_your_test_key");
        assert_eq!(
            stripe
                .credentials
                .webhook_secret
                .as_ref()
                .unwrap()
                .expose_secret(),
            "whsec_real"
        );
    }

    #[test]
    fn explicit_default_provider_is_honoured() {
        let mut pairs = PAYU.to_vec();
        pairs.push(("STRIPE_API_KEY", "sk_test_1"));
        pairs.push(("DEFAULT_PAYMENT_PROVIDER", "PayU"));
        assert_eq!(resolve(&pairs).default_provider(), ProviderName::Payu);
    }

    #[test]
    fn inactive_default_provider_falls_back_to_an_active_one() {
        let mut pairs = PAYU.to_vec();
        pairs.push(("DEFAULT_PAYMENT_PROVIDER", "razorpay"));
        let config = resolve(&pairs);

        assert_ne!(config.default_provider(), ProviderName::Razorpay);
        assert!(config.is_active(config.default_provider()));
        assert_eq!(config.default_provider(), ProviderName::Payu);
    }

    #[test]
    fn unknown_default_provider_falls_back() {
        let config = resolve(&[
            ("STRIPE_API_KEY", "sk_test_1"),
            ("DEFAULT_PAYMENT_PROVIDER", "paypal"),
        ]);
        assert_eq!(config.default_provider(), ProviderName::Stripe);
    }

    #[test]
    fn callback_urls_derive_from_frontend_url() {
        let mut pairs = PAYU.to_vec();
        pairs.push(("FRONTEND_URL", "https://x.test/app"));
        let config = resolve(&pairs);

        let payu = config.provider(ProviderName::Payu).unwrap();
        assert_eq!(payu.callbacks.success, "https://x.test/app/payu/success");
        assert_eq!(payu.callbacks.failure, "https://x.test/app/payu/failure");
        assert_eq!(payu.callbacks.cancel, "https://x.test/app/payu/cancel");
    }

    #[test]
    fn frontend_url_precedence_and_trailing_slash() {
        let config = resolve(&[
            ("NEXT_PUBLIC_APP_URL", "https://public.test/"),
            ("FRONTEND_URL", "https://front.test//"),
        ]);
        assert_eq!(config.frontend_url(), "https://front.test");

        let config = resolve(&[("NEXT_PUBLIC_APP_URL", "https://public.test/")]);
        assert_eq!(config.frontend_url(), "https://public.test");

        let config = resolve(&[]);
        assert_eq!(config.frontend_url(), "http://localhost:3000");
        assert_eq!(config.backend_url(), "http://localhost:8000");
    }

    #[test]
    fn explicit_callback_urls_take_precedence() {
        let mut pairs = PAYU.to_vec();
        pairs.push(("FRONTEND_URL", "https://x.test"));
        pairs.push(("PAYU_SUCCESS_URL", "https://pay.test/ok"));
        pairs.push(("PAYU_FURL", "https://pay.test/failed"));
        let config = resolve(&pairs);

        let payu = config.provider(ProviderName::Payu).unwrap();
        assert_eq!(payu.callbacks.success, "https://pay.test/ok");
        assert_eq!(payu.callbacks.failure, "https://pay.test/failed");
        assert_eq!(payu.callbacks.cancel, "https://x.test/payu/cancel");
    }

    #[test]
    fn cashfree_aliases_default_from_resolved_urls() {
        let config = resolve(&[
            ("CASHFREE_CLIENT_ID", "cf_id"),
            ("CASHFREE_CLIENT_SECRET", "cf_secret"),
            ("FRONTEND_URL", "https://x.test"),
            ("CASHFREE_SUCCESS_URL", "https://x.test/done"),
            ("BACKEND_URL", "https://api.x.test/"),
        ]);

        let cashfree = config.provider(ProviderName::Cashfree).unwrap();
        assert_eq!(
            cashfree.settings,
            ProviderSettings::Cashfree {
                return_url: "https://x.test/done".to_string(),
                notify_url: "https://api.x.test/api/webhooks/cashfree".to_string(),
                collection_mode: None,
            }
        );
    }

    #[test]
    fn cashfree_explicit_aliases_win() {
        let config = resolve(&[
            ("CASHFREE_CLIENT_ID", "cf_id"),
            ("CASHFREE_CLIENT_SECRET", "cf_secret"),
            ("CASHFREE_RETURN_URL", "https://x.test/return"),
            ("CASHFREE_NOTIFY_URL", "https://hooks.test/cf"),
            ("CASHFREE_COLLECTION_MODE", "upi"),
        ]);

        let settings = config
            .provider(ProviderName::Cashfree)
            .unwrap()
            .additional_settings();
        assert_eq!(settings["return_url"], "https://x.test/return");
        assert_eq!(settings["notify_url"], "https://hooks.test/cf");
        assert_eq!(settings["collection_mode"], "upi");
    }

    #[test]
    fn sandbox_mode_precedence() {
        let mut pairs = PAYU.to_vec();
        pairs.push(("STRIPE_API_KEY", "sk_live_1"));
        pairs.push(("PAYMENT_SANDBOX_MODE", "false"));
        pairs.push(("PAYU_SANDBOX_MODE", "yes"));
        let config = resolve(&pairs);

        assert!(config.provider(ProviderName::Payu).unwrap().sandbox_mode);
        assert!(!config.provider(ProviderName::Stripe).unwrap().sandbox_mode);

        let config = resolve(&PAYU);
        assert!(config.provider(ProviderName::Payu).unwrap().sandbox_mode);
    }

    #[test]
    fn pass_through_sections_have_defaults() {
        let config = resolve(&[]);
        assert_eq!(config.database.url, "sqlite://./payments.db");
        assert!(!config.database.echo);
        assert_eq!(config.messaging.broker_type, "memory");
        assert_eq!(config.messaging.url, "memory://");
        assert_eq!(config.messaging.exchange_name, "payments");
        assert_eq!(config.messaging.queue_prefix, "payment_");
        assert_eq!(config.logging_level, "INFO");
        assert!(!config.debug_mode);

        let config = resolve(&[
            ("DATABASE_URL", "postgres://db/payments"),
            ("MESSAGE_BROKER_TYPE", "redis"),
            ("DEBUG", "true"),
        ]);
        assert_eq!(config.database.url, "postgres://db/payments");
        assert_eq!(config.messaging.broker_type, "redis");
        assert!(config.debug_mode);
    }

    proptest! {
        #[test]
        fn resolution_is_idempotent(
            frontend in "https://[a-z]{1,8}\\.test(/[a-z]{1,6})?/{0,2}",
            default in prop::sample::select(vec!["stripe", "payu", "cashfree", "razorpay", "other"]),
            with_payu in any::<bool>(),
            with_cashfree in any::<bool>(),
        ) {
            let mut pairs = vec![
                ("FRONTEND_URL", frontend.as_str()),
                ("DEFAULT_PAYMENT_PROVIDER", default),
            ];
            if with_payu {
                pairs.extend(PAYU);
            }
            if with_cashfree {
                pairs.push(("CASHFREE_CLIENT_ID", "cf_id"));
                pairs.push(("CASHFREE_CLIENT_SECRET", "cf_secret"));
            }

            let first = resolve(&pairs);
            let second = resolve(&pairs);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.is_active(first.default_provider()));
            prop_assert!(!first.frontend_url().ends_with('/'));
        }
    }
}
