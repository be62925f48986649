//! Provider-shaped record fragments.
//!
//! Each provider hands back checkout details in its own layout. The sandbox
//! reproduces those layouts so that normalization sees the same shapes it
//! would see from the real collaborator.

use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::provider::{ProviderConfig, ProviderName, ProviderSettings};

/// Provider-side reference such as `cus_4f1c9a0b2e7d3c`.
pub(super) fn provider_ref(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &hex[..14])
}

pub(super) fn customer_ref(provider: ProviderName) -> String {
    provider_ref(match provider {
        ProviderName::Stripe => "cus_",
        ProviderName::Payu => "payu_cust_",
        ProviderName::Cashfree => "cf_cust_",
        ProviderName::Razorpay => "cust_",
    })
}

pub(super) fn product_ref(provider: ProviderName) -> String {
    provider_ref(match provider {
        ProviderName::Stripe => "prod_",
        _ => "item_",
    })
}

pub(super) fn price_ref(provider: ProviderName) -> String {
    provider_ref(match provider {
        ProviderName::Stripe => "price_",
        _ => "plan_",
    })
}

pub(super) fn payment_ref(provider: ProviderName) -> String {
    provider_ref(match provider {
        ProviderName::Stripe => "pi_",
        ProviderName::Payu => "txn_",
        ProviderName::Cashfree => "cf_order_",
        ProviderName::Razorpay => "order_",
    })
}

/// Setup intent id and its client secret, Stripe style.
pub(super) fn setup_intent_refs() -> (String, String) {
    let id = provider_ref("seti_");
    let secret = provider_ref(&format!("{id}_secret_"));
    (id, secret)
}

/// Subscription references. Stripe and Razorpay use `sub_` ids, PayU
/// standing instructions use `SI` tokens.
pub(super) fn subscription_ref(provider: ProviderName) -> String {
    provider_ref(match provider {
        ProviderName::Stripe | ProviderName::Razorpay => "sub_",
        ProviderName::Payu => "SI",
        ProviderName::Cashfree => "cf_sub_",
    })
}

fn payu_action_url(config: &ProviderConfig) -> &'static str {
    if config.sandbox_mode {
        "https://test.payu.in/_payment"
    } else {
        "https://secure.payu.in/_payment"
    }
}

fn cashfree_host(config: &ProviderConfig) -> &'static str {
    if config.sandbox_mode {
        "https://payments-test.cashfree.com"
    } else {
        "https://payments.cashfree.com"
    }
}

/// Checkout fragment of a freshly created record.
pub(super) struct Checkout<'a> {
    pub config: &'a ProviderConfig,
    pub reference: &'a str,
    pub amount: Option<f64>,
    pub currency: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl Checkout<'_> {
    /// Merge the provider's checkout details into `record`.
    ///
    /// `metadata` is the caller's metadata; providers that keep checkout
    /// details alongside it get them merged in.
    pub(super) fn apply(&self, record: &mut Map<String, Value>, mut metadata: Map<String, Value>) {
        match &self.config.settings {
            ProviderSettings::Stripe => {
                record.insert("meta_info".into(), Value::Object(metadata));
            }
            ProviderSettings::Razorpay => {
                let mut widget = json!({
                    "key": self.config.credentials.api_key.expose_secret(),
                    "name": self.description.unwrap_or("Payment"),
                    "callback_url": self.config.callbacks.success,
                });
                if self.reference.starts_with("sub_") {
                    widget["subscription_id"] = json!(self.reference);
                } else {
                    widget["order_id"] = json!(self.reference);
                }
                if let Some(amount) = self.amount {
                    widget["amount"] = json!(minor_units(amount));
                }
                if let Some(currency) = self.currency {
                    widget["currency"] = json!(currency);
                }
                metadata.insert("checkout_config".into(), widget);
                let tail = self
                    .reference
                    .get(self.reference.len().saturating_sub(8)..)
                    .unwrap_or(self.reference);
                metadata.insert("short_url".into(), json!(format!("https://rzp.io/i/{tail}")));
                record.insert("provider_data".into(), Value::Object(metadata));
            }
            ProviderSettings::Payu => {
                let mut fields = json!({
                    "key": self.config.credentials.api_key.expose_secret(),
                    "txnid": self.reference,
                    "surl": self.config.callbacks.success,
                    "furl": self.config.callbacks.failure,
                    "productinfo": self.description.unwrap_or("Payment"),
                });
                if let Some(amount) = self.amount {
                    fields["amount"] = json!(format!("{amount:.2}"));
                }
                if self.reference.starts_with("SI") {
                    fields["si"] = json!("1");
                }
                metadata.insert(
                    "redirect".into(),
                    json!({
                        "action_url": payu_action_url(self.config),
                        "method": "POST",
                        "fields": fields,
                    }),
                );
                record.insert("meta_info".into(), Value::Object(metadata));
            }
            ProviderSettings::Cashfree {
                return_url,
                notify_url,
                collection_mode,
            } => {
                record.insert(
                    "auth_link".into(),
                    json!(format!("{}/links/{}", cashfree_host(self.config), self.reference)),
                );
                metadata.insert("return_url".into(), json!(return_url));
                metadata.insert("notify_url".into(), json!(notify_url));
                if let Some(mode) = collection_mode {
                    metadata.insert("collection_mode".into(), json!(mode));
                }
                record.insert("meta_info".into(), Value::Object(metadata));
            }
        }
    }
}

/// Amount in the currency's minor unit (paise, cents).
fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
