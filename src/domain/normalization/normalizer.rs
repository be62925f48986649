//! Raw record -> canonical record mapping.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ports::{Clock, SystemClock};

use super::checkout::{checkout_flow, mandate_token, Layered};
use super::entities::{
    CanonicalCustomer, CanonicalPayment, CanonicalPaymentMethod, CanonicalPlan, CanonicalProduct,
    CanonicalSubscription, Metadata, ProviderLink,
};
use super::fields::{first_non_empty, Fields};

/// Maps provider/storage records onto canonical records.
///
/// Stateless apart from the clock: every call builds a fresh record, so a
/// single instance can be shared across concurrent requests.
#[derive(Clone)]
pub struct ResponseNormalizer {
    clock: Arc<dyn Clock>,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn customer(&self, raw: &Value) -> CanonicalCustomer {
        let fields = Fields::new(raw);
        let metadata = metadata(fields);
        let address = first_non_empty([
            fields.object("address"),
            Fields::of(&metadata).object("address"),
        ])
        .cloned();
        let links = provider_links(fields);

        CanonicalCustomer {
            id: fields.id("id"),
            email: fields.text("email"),
            name: fields.text("name"),
            created_at: self.created_at(fields),
            updated_at: fields.timestamp("updated_at"),
            provider_customer_id: first_non_empty([
                fields.id("provider_customer_id"),
                links.first().map(|l| l.provider_customer_id.clone()),
            ]),
            provider_customers: links,
            address,
            metadata,
        }
    }

    pub fn payment_method(&self, raw: &Value) -> CanonicalPaymentMethod {
        let fields = Fields::new(raw);

        CanonicalPaymentMethod {
            id: fields.id("id"),
            method_type: fields.text("type").unwrap_or_else(|| "card".to_string()),
            card: fields.object("card").cloned(),
            created_at: self.created_at(fields),
            is_default: fields.boolean("is_default").unwrap_or(false),
            provider: fields.text("provider"),
            mandate_id: fields.id("mandate_id"),
        }
    }

    pub fn product(&self, raw: &Value) -> CanonicalProduct {
        let fields = Fields::new(raw);

        CanonicalProduct {
            id: fields.id("id"),
            name: fields.text("name"),
            description: fields.text("description"),
            active: fields.boolean("active").unwrap_or(true),
            created_at: self.created_at(fields),
            metadata: metadata(fields),
            provider_product_id: fields.id("provider_product_id"),
            provider: fields.text("provider"),
        }
    }

    pub fn plan(&self, raw: &Value) -> CanonicalPlan {
        let fields = Fields::new(raw);

        CanonicalPlan {
            id: fields.id("id"),
            product_id: fields.id("product_id"),
            name: fields.text("name"),
            description: fields.text("description"),
            pricing_model: fields.text("pricing_model"),
            amount: fields.number("amount"),
            currency: fields.text("currency"),
            billing_interval: fields.text("billing_interval").unwrap_or_default(),
            billing_interval_count: fields
                .count("billing_interval_count")
                .filter(|&n| n > 0)
                .unwrap_or(1),
            created_at: self.created_at(fields),
            metadata: metadata(fields),
            provider: fields.text("provider"),
            provider_price_id: fields.id("provider_price_id"),
        }
    }

    pub fn subscription(&self, raw: &Value) -> CanonicalSubscription {
        let fields = Fields::new(raw);
        let metadata = metadata(fields);
        let layered = Layered {
            record: fields,
            metadata: Fields::of(&metadata),
        };
        let flow = checkout_flow(layered);
        let mandate_token = mandate_token(layered);

        CanonicalSubscription {
            id: fields.id("id"),
            customer_id: fields.id("customer_id"),
            plan_id: fields.id("plan_id"),
            status: fields.text("status"),
            quantity: fields.count("quantity").unwrap_or(1),
            current_period_start: fields.timestamp("current_period_start"),
            current_period_end: fields.timestamp("current_period_end"),
            cancel_at_period_end: fields.boolean("cancel_at_period_end").unwrap_or(false),
            created_at: self.created_at(fields),
            provider_subscription_id: fields.id("provider_subscription_id"),
            provider: fields.text("provider"),
            checkout_config: flow.checkout_config,
            redirect_url: flow.redirect_url,
            mandate_token,
            metadata,
        }
    }

    pub fn payment(&self, raw: &Value) -> CanonicalPayment {
        let fields = Fields::new(raw);
        let metadata = metadata(fields);
        let flow = checkout_flow(Layered {
            record: fields,
            metadata: Fields::of(&metadata),
        });

        CanonicalPayment {
            id: fields.id("id"),
            amount: fields.number("amount"),
            currency: fields.text("currency"),
            status: fields.text("status"),
            description: first_non_empty([
                Fields::of(&metadata).text("description"),
                fields.text("description"),
            ]),
            customer_id: fields.id("customer_id"),
            payment_method_id: first_non_empty([
                fields.id("payment_method_id"),
                fields.id("payment_method"),
            ]),
            created_at: self.created_at(fields),
            provider: fields.text("provider"),
            provider_payment_id: fields.id("provider_payment_id"),
            refunded_amount: fields.number("refunded_amount"),
            checkout_config: flow.checkout_config,
            redirect_url: flow.redirect_url,
            metadata,
        }
    }

    fn created_at(&self, fields: Fields<'_>) -> String {
        fields
            .timestamp("created_at")
            .unwrap_or_else(|| self.clock.now().to_rfc3339())
    }
}

/// `meta_info`, else `provider_data`, else `metadata`, else empty.
fn metadata(fields: Fields<'_>) -> Metadata {
    first_non_empty([
        fields.object("meta_info"),
        fields.object("provider_data"),
        fields.object("metadata"),
    ])
    .cloned()
    .unwrap_or_default()
}

fn provider_links(fields: Fields<'_>) -> Vec<ProviderLink> {
    fields
        .array("provider_customers")
        .map(|links| {
            links
                .iter()
                .filter_map(Value::as_object)
                .filter_map(provider_link)
                .collect()
        })
        .unwrap_or_default()
}

fn provider_link(entry: &Map<String, Value>) -> Option<ProviderLink> {
    let entry = Fields::of(entry);
    Some(ProviderLink {
        provider: entry.text("provider")?,
        provider_customer_id: entry.id("provider_customer_id")?,
    })
}
