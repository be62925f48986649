//! Canonical records returned at the API boundary.
//!
//! Field names are provider-agnostic. Missing or malformed source fields
//! surface as `null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

/// A provider that knows a customer, and the customer's id there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLink {
    pub provider: String,
    pub provider_customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCustomer {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub metadata: Metadata,
    pub address: Option<Map<String, Value>>,
    pub provider_customer_id: Option<String>,
    pub provider_customers: Vec<ProviderLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPaymentMethod {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub method_type: String,
    pub card: Option<Map<String, Value>>,
    pub created_at: String,
    pub is_default: bool,
    pub provider: Option<String>,
    pub mandate_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub metadata: Metadata,
    pub provider_product_id: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPlan {
    pub id: Option<String>,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub pricing_model: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_interval: String,
    pub billing_interval_count: u32,
    pub created_at: String,
    pub metadata: Metadata,
    pub provider: Option<String>,
    pub provider_price_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSubscription {
    pub id: Option<String>,
    pub customer_id: Option<String>,
    pub plan_id: Option<String>,
    pub status: Option<String>,
    pub quantity: u32,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
    pub created_at: String,
    pub metadata: Metadata,
    pub provider_subscription_id: Option<String>,
    pub provider: Option<String>,
    /// Embedded checkout widget options; excludes `redirect_url`.
    pub checkout_config: Option<Map<String, Value>>,
    /// Hosted page to send the customer to.
    pub redirect_url: Option<String>,
    /// Standing-instruction token, only when recognisably safe to show.
    pub mandate_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPayment {
    pub id: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub customer_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub created_at: String,
    pub metadata: Metadata,
    pub provider: Option<String>,
    pub provider_payment_id: Option<String>,
    pub refunded_amount: Option<f64>,
    pub checkout_config: Option<Map<String, Value>>,
    pub redirect_url: Option<String>,
}
