//! HTTP DTOs (Data Transfer Objects) for the payments API.
//!
//! Request bodies name the provider as a plain string; handlers resolve it
//! against the active configuration. Responses are the canonical records
//! from the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::normalization::Fields;
use crate::ports::Page;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

fn default_currency() -> String {
    "USD".to_string()
}

fn default_method_type() -> String {
    "card".to_string()
}

fn default_pricing_model() -> String {
    "subscription".to_string()
}

fn default_one() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Parameters
// ════════════════════════════════════════════════════════════════════════════════

/// Limit clamped to `1..=100`, negative offsets treated as zero.
fn page(limit: Option<i64>, offset: Option<i64>) -> Page {
    Page {
        limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize,
        offset: offset.unwrap_or(0).max(0) as usize,
    }
}

// No `#[serde(flatten)]` here: query-string numbers fail to parse through it.

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        page(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl CustomerListParams {
    pub fn page(&self) -> Page {
        page(self.limit, self.offset)
    }
}

/// Filters shared by the payment and subscription listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilteredListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
}

impl FilteredListParams {
    pub fn page(&self) -> Page {
        page(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFilterParams {
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupIntentParams {
    /// `off_session` or `on_session`.
    pub usage: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelParams {
    #[serde(default = "default_true")]
    pub cancel_at_period_end: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerBody {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Map<String, Value>>,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomerBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Map<String, Value>>,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
}

/// Attach a tokenized payment method. Raw card numbers are not accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentMethodBody {
    #[serde(rename = "type", default = "default_method_type")]
    pub method_type: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub setup_intent_id: Option<String>,
    #[serde(default)]
    pub mandate_id: Option<String>,
    #[serde(default)]
    pub set_default: bool,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentBody {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub mandate_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `subscription`, `per_user`, `tiered`, ...
    #[serde(default = "default_pricing_model")]
    pub pricing_model: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// `day`, `week`, `month` or `year`.
    pub billing_interval: String,
    #[serde(default = "default_one")]
    pub billing_interval_count: u32,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionBody {
    pub plan_id: String,
    #[serde(default = "default_one")]
    pub quantity: u32,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
    #[serde(default, alias = "metadata")]
    pub meta_info: Option<Map<String, Value>>,
    #[serde(default)]
    pub provider: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Setup intent handed to the client for confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupIntentResponse {
    pub id: Option<String>,
    pub client_secret: Option<String>,
}

impl From<&Value> for SetupIntentResponse {
    fn from(record: &Value) -> Self {
        let fields = Fields::new(record);
        Self {
            id: fields.id("id"),
            client_secret: fields.text("client_secret"),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
