//! Payment service port.
//!
//! The payment service is the external collaborator that owns persistence
//! and talks to the payment networks. This crate treats it as opaque: it
//! sends plain requests and gets back loosely-typed records
//! (`serde_json::Value`) whose shape depends on which provider produced them.
//! Records are passed through the
//! [`ResponseNormalizer`](crate::domain::normalization::ResponseNormalizer)
//! before they reach a client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::provider::ProviderName;

/// Port for the payment-processing collaborator.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Value>, PaymentServiceError>;

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Value>, PaymentServiceError>;

    /// Partial update; `None` fields are left untouched.
    async fn update_customer(
        &self,
        customer_id: &str,
        request: UpdateCustomerRequest,
    ) -> Result<Value, PaymentServiceError>;

    /// Register the customer with `provider`, returning the updated customer
    /// with its provider links.
    async fn link_customer_provider(
        &self,
        customer_id: &str,
        provider: ProviderName,
    ) -> Result<Value, PaymentServiceError>;

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        provider: Option<ProviderName>,
    ) -> Result<Vec<Value>, PaymentServiceError>;

    async fn create_payment_method(
        &self,
        customer_id: &str,
        request: CreatePaymentMethodRequest,
    ) -> Result<Value, PaymentServiceError>;

    /// Start a provider-side flow for saving a payment method, such as a
    /// card that needs 3DS confirmation. The record carries the intent `id`
    /// and the `client_secret` the client confirms with.
    async fn create_setup_intent(
        &self,
        customer_id: &str,
        request: SetupIntentRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Value>, PaymentServiceError>;

    /// One-time charge.
    async fn process_payment(
        &self,
        request: ProcessPaymentRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn list_products(&self, page: Page) -> Result<Vec<Value>, PaymentServiceError>;

    async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn list_plans(&self, product_id: &str, page: Page)
        -> Result<Vec<Value>, PaymentServiceError>;

    async fn create_plan(
        &self,
        product_id: &str,
        request: CreatePlanRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn list_subscriptions(
        &self,
        query: SubscriptionQuery,
    ) -> Result<Vec<Value>, PaymentServiceError>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        request: CreateSubscriptionRequest,
    ) -> Result<Value, PaymentServiceError>;

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Value>, PaymentServiceError>;

    /// If `at_period_end` is true the subscription stays active until the
    /// current period ends.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Value, PaymentServiceError>;
}

/// Failure reported by the payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentServiceError {
    /// The request was rejected as invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The provider or the collaborator itself failed.
    #[error("payment provider error: {0}")]
    Upstream(String),
}

impl PaymentServiceError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::NotFound(format!("{resource} '{id}'"))
    }
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerQuery {
    pub page: Page,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuery {
    pub page: Page,
    pub customer_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Page,
    pub customer_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: Option<String>,
    pub address: Option<Map<String, Value>>,
    pub meta_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCustomerRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<Map<String, Value>>,
    pub meta_info: Option<Map<String, Value>>,
}

/// Attach a payment method by provider-side reference.
///
/// Raw card data never passes through this crate; clients tokenize with the
/// provider first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub provider: ProviderName,
    pub method_type: String,
    pub token: Option<String>,
    pub payment_method_id: Option<String>,
    pub setup_intent_id: Option<String>,
    pub mandate_id: Option<String>,
    pub set_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupIntentRequest {
    pub provider: ProviderName,
    /// `off_session` or `on_session`; the collaborator picks when absent.
    pub usage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPaymentRequest {
    pub provider: ProviderName,
    pub customer_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_method_id: Option<String>,
    pub mandate_id: Option<String>,
    pub description: Option<String>,
    pub meta_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub provider: ProviderName,
    pub name: String,
    pub description: Option<String>,
    pub meta_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    pub provider: ProviderName,
    pub name: String,
    pub description: Option<String>,
    pub pricing_model: String,
    pub amount: f64,
    pub currency: String,
    pub billing_interval: String,
    pub billing_interval_count: u32,
    pub meta_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub provider: ProviderName,
    pub plan_id: String,
    pub quantity: u32,
    pub trial_period_days: Option<u32>,
    pub meta_info: Option<Map<String, Value>>,
}
