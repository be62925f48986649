//! In-memory payment service.
//!
//! Stands in for the payment collaborator in development and tests. Records
//! are stored in the loosely-typed shapes the real providers return, so the
//! full normalization path is exercised. Supports:
//! - Provider-shaped checkout details per active provider
//! - Error injection
//! - Call counting

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Months};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::provider_records::{
    customer_ref, payment_ref, price_ref, product_ref, setup_intent_refs, subscription_ref,
    Checkout,
};
use crate::domain::normalization::Fields;
use crate::domain::provider::{PaymentConfiguration, ProviderConfig, ProviderName};
use crate::ports::{
    Clock, CreateCustomerRequest, CreatePaymentMethodRequest, CreatePlanRequest,
    CreateProductRequest, CreateSubscriptionRequest, CustomerQuery, Page, PaymentQuery,
    PaymentService, PaymentServiceError, ProcessPaymentRequest, SetupIntentRequest,
    SubscriptionQuery, SystemClock, UpdateCustomerRequest,
};

const BILLING_INTERVALS: [&str; 4] = ["day", "week", "month", "year"];
const SETUP_USAGES: [&str; 2] = ["off_session", "on_session"];

/// In-memory payment service backed by the resolved provider configuration.
///
/// # Example
///
/// ```ignore
/// let service = SandboxPaymentService::new(Arc::new(config));
///
/// // Inject errors
/// service.set_method_error("process_payment", PaymentServiceError::Upstream("down".into()));
/// ```
#[derive(Clone)]
pub struct SandboxPaymentService {
    config: Arc<PaymentConfiguration>,
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<SandboxState>>,
}

#[derive(Default)]
struct SandboxState {
    customers: Vec<Map<String, Value>>,
    payment_methods: Vec<Map<String, Value>>,
    payments: Vec<Map<String, Value>>,
    products: Vec<Map<String, Value>>,
    plans: Vec<Map<String, Value>>,
    subscriptions: Vec<Map<String, Value>>,

    /// Error to return on the next call to any method.
    next_error: Option<PaymentServiceError>,

    /// Errors returned by a specific method until cleared.
    method_errors: HashMap<String, PaymentServiceError>,

    calls: HashMap<String, usize>,
}

impl SandboxPaymentService {
    pub fn new(config: Arc<PaymentConfiguration>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Arc<PaymentConfiguration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Arc::default(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Injection
    // ════════════════════════════════════════════════════════════════════════════

    /// Fail the next call, whichever method it is.
    pub fn set_error(&self, error: PaymentServiceError) {
        self.state().next_error = Some(error);
    }

    /// Fail every call to `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: PaymentServiceError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Number of calls made to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.get(method).copied().unwrap_or(0)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then surface any injected error.
    fn begin(&self, method: &str) -> Result<MutexGuard<'_, SandboxState>, PaymentServiceError> {
        let mut state = self.state();
        *state.calls.entry(method.to_string()).or_default() += 1;

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(state)
    }

    fn provider(&self, name: ProviderName) -> Result<&ProviderConfig, PaymentServiceError> {
        self.config.provider(name).ok_or_else(|| {
            PaymentServiceError::InvalidRequest(format!("payment provider '{name}' is not configured"))
        })
    }

    fn now(&self) -> String {
        self.clock.now().to_rfc3339()
    }

    fn new_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("id".into(), json!(Uuid::new_v4().to_string()));
        record.insert("created_at".into(), json!(self.now()));
        record
    }
}

fn find<'a>(records: &'a [Map<String, Value>], id: &str) -> Option<&'a Map<String, Value>> {
    records.iter().find(|r| Fields::of(r).id("id").as_deref() == Some(id))
}

fn find_mut<'a>(
    records: &'a mut [Map<String, Value>],
    id: &str,
) -> Option<&'a mut Map<String, Value>> {
    records
        .iter_mut()
        .find(|r| Fields::of(r).id("id").as_deref() == Some(id))
}

fn field_is(record: &Map<String, Value>, key: &str, wanted: Option<&str>) -> bool {
    wanted.map_or(true, |w| Fields::of(record).text(key).as_deref() == Some(w))
}

fn paginate<'a>(records: impl Iterator<Item = &'a Map<String, Value>>, page: Page) -> Vec<Value> {
    records
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .map(Value::Object)
        .collect()
}

fn require_positive(name: &str, amount: f64) -> Result<(), PaymentServiceError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(PaymentServiceError::InvalidRequest(format!(
            "{name} must be greater than zero"
        )))
    }
}

fn require_text(name: &str, value: &str) -> Result<(), PaymentServiceError> {
    if value.trim().is_empty() {
        Err(PaymentServiceError::InvalidRequest(format!("{name} is required")))
    } else {
        Ok(())
    }
}

#[async_trait]
impl PaymentService for SandboxPaymentService {
    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_customers")?;
        let needle = query.search.map(|s| s.to_lowercase());

        let hits = state.customers.iter().filter(|c| match &needle {
            None => true,
            Some(needle) => ["name", "email"].iter().any(|key| {
                Fields::of(c)
                    .text(key)
                    .is_some_and(|v| v.to_lowercase().contains(needle))
            }),
        });
        Ok(paginate(hits, query.page))
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Value, PaymentServiceError> {
        require_text("email", &request.email)?;
        let mut state = self.begin("create_customer")?;

        let mut customer = self.new_record();
        customer.insert("email".into(), json!(request.email));
        customer.insert("name".into(), json!(request.name));
        customer.insert("address".into(), json!(request.address));
        customer.insert("meta_info".into(), json!(request.meta_info.unwrap_or_default()));
        customer.insert("updated_at".into(), Value::Null);
        customer.insert("provider_customers".into(), json!([]));

        state.customers.push(customer.clone());
        Ok(Value::Object(customer))
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Value>, PaymentServiceError> {
        let state = self.begin("get_customer")?;
        Ok(find(&state.customers, customer_id).cloned().map(Value::Object))
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        request: UpdateCustomerRequest,
    ) -> Result<Value, PaymentServiceError> {
        let now = self.now();
        let mut state = self.begin("update_customer")?;
        let customer = find_mut(&mut state.customers, customer_id)
            .ok_or_else(|| PaymentServiceError::not_found("customer", customer_id))?;

        if let Some(email) = request.email {
            require_text("email", &email)?;
            customer.insert("email".into(), json!(email));
        }
        if let Some(name) = request.name {
            customer.insert("name".into(), json!(name));
        }
        if let Some(address) = request.address {
            customer.insert("address".into(), Value::Object(address));
        }
        if let Some(meta_info) = request.meta_info {
            customer.insert("meta_info".into(), Value::Object(meta_info));
        }
        customer.insert("updated_at".into(), json!(now));

        Ok(Value::Object(customer.clone()))
    }

    async fn link_customer_provider(
        &self,
        customer_id: &str,
        provider: ProviderName,
    ) -> Result<Value, PaymentServiceError> {
        self.provider(provider)?;
        let mut state = self.begin("link_customer_provider")?;
        let customer = find_mut(&mut state.customers, customer_id)
            .ok_or_else(|| PaymentServiceError::not_found("customer", customer_id))?;

        let links = customer
            .entry("provider_customers")
            .or_insert_with(|| json!([]));
        if !links.is_array() {
            *links = json!([]);
        }
        if let Value::Array(links) = links {
            let already_linked = links
                .iter()
                .any(|l| l.get("provider").and_then(Value::as_str) == Some(provider.as_str()));
            if !already_linked {
                links.push(json!({
                    "provider": provider,
                    "provider_customer_id": customer_ref(provider),
                }));
            }
        }

        Ok(Value::Object(customer.clone()))
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        provider: Option<ProviderName>,
    ) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_payment_methods")?;
        if find(&state.customers, customer_id).is_none() {
            return Err(PaymentServiceError::not_found("customer", customer_id));
        }

        Ok(state
            .payment_methods
            .iter()
            .filter(|m| field_is(m, "customer_id", Some(customer_id)))
            .filter(|m| field_is(m, "provider", provider.map(|p| p.as_str())))
            .cloned()
            .map(Value::Object)
            .collect())
    }

    async fn create_payment_method(
        &self,
        customer_id: &str,
        request: CreatePaymentMethodRequest,
    ) -> Result<Value, PaymentServiceError> {
        self.provider(request.provider)?;
        let reference = [
            &request.payment_method_id,
            &request.token,
            &request.setup_intent_id,
            &request.mandate_id,
        ]
        .into_iter()
        .flatten()
        .find(|r| !r.trim().is_empty())
        .cloned()
        .ok_or_else(|| {
            PaymentServiceError::InvalidRequest(
                "a provider token, payment method id, setup intent or mandate is required"
                    .to_string(),
            )
        })?;

        let mut state = self.begin("create_payment_method")?;
        if find(&state.customers, customer_id).is_none() {
            return Err(PaymentServiceError::not_found("customer", customer_id));
        }

        let is_first = !state
            .payment_methods
            .iter()
            .any(|m| field_is(m, "customer_id", Some(customer_id)));
        let is_default = request.set_default || is_first;
        if is_default {
            for method in state
                .payment_methods
                .iter_mut()
                .filter(|m| field_is(m, "customer_id", Some(customer_id)))
            {
                method.insert("is_default".into(), json!(false));
            }
        }

        let mut method = self.new_record();
        method.insert("customer_id".into(), json!(customer_id));
        method.insert("type".into(), json!(request.method_type));
        method.insert("provider".into(), json!(request.provider));
        method.insert("provider_payment_method_id".into(), json!(reference));
        method.insert("mandate_id".into(), json!(request.mandate_id));
        method.insert("is_default".into(), json!(is_default));
        if request.method_type == "card" {
            let last4: String = reference
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            method.insert("card".into(), json!({ "brand": "unknown", "last4": last4 }));
        }

        state.payment_methods.push(method.clone());
        Ok(Value::Object(method))
    }

    async fn create_setup_intent(
        &self,
        customer_id: &str,
        request: SetupIntentRequest,
    ) -> Result<Value, PaymentServiceError> {
        let provider = request.provider;
        self.provider(provider)?;
        if !provider.capabilities().supports_payment_methods {
            return Err(PaymentServiceError::InvalidRequest(format!(
                "payment provider '{provider}' does not support saved payment methods"
            )));
        }

        let usage = match request.usage.as_deref().map(str::trim) {
            None | Some("") => "off_session",
            Some(usage) => SETUP_USAGES
                .into_iter()
                .find(|u| *u == usage)
                .ok_or_else(|| {
                    PaymentServiceError::InvalidRequest(format!(
                        "usage must be one of {SETUP_USAGES:?}, got '{usage}'"
                    ))
                })?,
        };

        let state = self.begin("create_setup_intent")?;
        if find(&state.customers, customer_id).is_none() {
            return Err(PaymentServiceError::not_found("customer", customer_id));
        }

        let (id, client_secret) = setup_intent_refs();
        Ok(json!({
            "id": id,
            "client_secret": client_secret,
            "customer_id": customer_id,
            "provider": provider,
            "usage": usage,
            "status": "requires_payment_method",
            "created_at": self.now(),
        }))
    }

    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_payments")?;
        let hits = state.payments.iter().filter(|p| {
            field_is(p, "customer_id", query.customer_id.as_deref())
                && field_is(p, "status", query.status.as_deref())
        });
        Ok(paginate(hits, query.page))
    }

    async fn process_payment(
        &self,
        request: ProcessPaymentRequest,
    ) -> Result<Value, PaymentServiceError> {
        let provider = self.provider(request.provider)?;
        require_positive("amount", request.amount)?;
        require_text("currency", &request.currency)?;

        let mut state = self.begin("process_payment")?;
        if find(&state.customers, &request.customer_id).is_none() {
            return Err(PaymentServiceError::not_found("customer", &request.customer_id));
        }

        let reference = payment_ref(request.provider);
        let currency = request.currency.to_uppercase();
        let status = match request.provider {
            ProviderName::Stripe => "succeeded",
            ProviderName::Razorpay => "created",
            ProviderName::Payu | ProviderName::Cashfree => "pending",
        };

        let mut payment = self.new_record();
        payment.insert("customer_id".into(), json!(request.customer_id));
        payment.insert("amount".into(), json!(request.amount));
        payment.insert("currency".into(), json!(currency));
        payment.insert("status".into(), json!(status));
        payment.insert("description".into(), json!(request.description));
        payment.insert("payment_method".into(), json!(request.payment_method_id));
        payment.insert("mandate_id".into(), json!(request.mandate_id));
        payment.insert("provider".into(), json!(request.provider));
        payment.insert("provider_payment_id".into(), json!(reference));
        payment.insert("refunded_amount".into(), json!(0.0));

        Checkout {
            config: provider,
            reference: &reference,
            amount: Some(request.amount),
            currency: Some(&currency),
            description: request.description.as_deref(),
        }
        .apply(&mut payment, request.meta_info.unwrap_or_default());

        state.payments.push(payment.clone());
        Ok(Value::Object(payment))
    }

    async fn list_products(&self, page: Page) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_products")?;
        Ok(paginate(state.products.iter(), page))
    }

    async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<Value, PaymentServiceError> {
        self.provider(request.provider)?;
        require_text("name", &request.name)?;
        let mut state = self.begin("create_product")?;

        let mut product = self.new_record();
        product.insert("name".into(), json!(request.name));
        product.insert("description".into(), json!(request.description));
        product.insert("active".into(), json!(true));
        product.insert("metadata".into(), json!(request.meta_info.unwrap_or_default()));
        product.insert("provider".into(), json!(request.provider));
        product.insert("provider_product_id".into(), json!(product_ref(request.provider)));

        state.products.push(product.clone());
        Ok(Value::Object(product))
    }

    async fn list_plans(&self, product_id: &str, page: Page) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_plans")?;
        if find(&state.products, product_id).is_none() {
            return Err(PaymentServiceError::not_found("product", product_id));
        }

        let hits = state
            .plans
            .iter()
            .filter(|p| field_is(p, "product_id", Some(product_id)));
        Ok(paginate(hits, page))
    }

    async fn create_plan(
        &self,
        product_id: &str,
        request: CreatePlanRequest,
    ) -> Result<Value, PaymentServiceError> {
        self.provider(request.provider)?;
        require_text("name", &request.name)?;
        require_positive("amount", request.amount)?;
        if !BILLING_INTERVALS.contains(&request.billing_interval.as_str()) {
            return Err(PaymentServiceError::InvalidRequest(format!(
                "billing_interval must be one of {}",
                BILLING_INTERVALS.join(", ")
            )));
        }
        if request.billing_interval_count == 0 {
            return Err(PaymentServiceError::InvalidRequest(
                "billing_interval_count must be at least 1".to_string(),
            ));
        }

        let mut state = self.begin("create_plan")?;
        if find(&state.products, product_id).is_none() {
            return Err(PaymentServiceError::not_found("product", product_id));
        }

        let mut plan = self.new_record();
        plan.insert("product_id".into(), json!(product_id));
        plan.insert("name".into(), json!(request.name));
        plan.insert("description".into(), json!(request.description));
        plan.insert("pricing_model".into(), json!(request.pricing_model));
        plan.insert("amount".into(), json!(request.amount));
        plan.insert("currency".into(), json!(request.currency.to_uppercase()));
        plan.insert("billing_interval".into(), json!(request.billing_interval));
        plan.insert(
            "billing_interval_count".into(),
            json!(request.billing_interval_count),
        );
        plan.insert("meta_info".into(), json!(request.meta_info.unwrap_or_default()));
        plan.insert("provider".into(), json!(request.provider));
        plan.insert("provider_price_id".into(), json!(price_ref(request.provider)));

        state.plans.push(plan.clone());
        Ok(Value::Object(plan))
    }

    async fn list_subscriptions(
        &self,
        query: SubscriptionQuery,
    ) -> Result<Vec<Value>, PaymentServiceError> {
        let state = self.begin("list_subscriptions")?;
        let hits = state.subscriptions.iter().filter(|s| {
            field_is(s, "customer_id", query.customer_id.as_deref())
                && field_is(s, "status", query.status.as_deref())
        });
        Ok(paginate(hits, query.page))
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        request: CreateSubscriptionRequest,
    ) -> Result<Value, PaymentServiceError> {
        let provider = self.provider(request.provider)?;
        if request.quantity == 0 {
            return Err(PaymentServiceError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        let mut state = self.begin("create_subscription")?;
        if find(&state.customers, customer_id).is_none() {
            return Err(PaymentServiceError::not_found("customer", customer_id));
        }
        let plan = find(&state.plans, &request.plan_id)
            .map(|p| Fields::of(p))
            .ok_or_else(|| PaymentServiceError::not_found("plan", &request.plan_id))?;

        let interval = plan.text("billing_interval").unwrap_or_default();
        let count = plan.count("billing_interval_count").unwrap_or(1).max(1);
        let amount = plan.number("amount").map(|a| a * f64::from(request.quantity));
        let currency = plan.text("currency");
        let description = plan.text("name");

        let start = self.clock.now();
        let end = match interval.as_str() {
            "day" => start + Duration::days(i64::from(count)),
            "week" => start + Duration::weeks(i64::from(count)),
            "year" => start
                .checked_add_months(Months::new(12 * count))
                .unwrap_or(start),
            _ => start.checked_add_months(Months::new(count)).unwrap_or(start),
        };

        let trialing = request.trial_period_days.is_some_and(|d| d > 0);
        let status = match request.provider {
            ProviderName::Stripe if trialing => "trialing",
            ProviderName::Stripe => "active",
            ProviderName::Razorpay => "created",
            ProviderName::Payu => "pending",
            ProviderName::Cashfree => "initialized",
        };
        let reference = subscription_ref(request.provider);

        let mut subscription = self.new_record();
        subscription.insert("customer_id".into(), json!(customer_id));
        subscription.insert("plan_id".into(), json!(request.plan_id));
        subscription.insert("status".into(), json!(status));
        subscription.insert("quantity".into(), json!(request.quantity));
        subscription.insert("current_period_start".into(), json!(start.timestamp()));
        subscription.insert("current_period_end".into(), json!(end.timestamp()));
        subscription.insert("cancel_at_period_end".into(), json!(false));
        subscription.insert("provider".into(), json!(request.provider));
        subscription.insert("provider_subscription_id".into(), json!(reference));

        Checkout {
            config: provider,
            reference: &reference,
            amount,
            currency: currency.as_deref(),
            description: description.as_deref(),
        }
        .apply(&mut subscription, request.meta_info.unwrap_or_default());

        state.subscriptions.push(subscription.clone());
        Ok(Value::Object(subscription))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Value>, PaymentServiceError> {
        let state = self.begin("get_subscription")?;
        Ok(find(&state.subscriptions, subscription_id)
            .cloned()
            .map(Value::Object))
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Value, PaymentServiceError> {
        let mut state = self.begin("cancel_subscription")?;
        let subscription = find_mut(&mut state.subscriptions, subscription_id)
            .ok_or_else(|| PaymentServiceError::not_found("subscription", subscription_id))?;

        if Fields::of(subscription).text("status").as_deref() == Some("canceled") {
            return Err(PaymentServiceError::InvalidRequest(format!(
                "subscription '{subscription_id}' is already canceled"
            )));
        }

        subscription.insert("cancel_at_period_end".into(), json!(at_period_end));
        if !at_period_end {
            subscription.insert("status".into(), json!("canceled"));
        }

        Ok(Value::Object(subscription.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigResolver, EnvSnapshot};
    use crate::domain::normalization::ResponseNormalizer;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn service(pairs: &[(&str, &str)]) -> SandboxPaymentService {
        let env: EnvSnapshot = pairs.iter().copied().collect();
        let config = ConfigResolver::new(&env).resolve();
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        SandboxPaymentService::with_clock(Arc::new(config), Arc::new(FixedClock(now)))
    }

    fn all_providers() -> SandboxPaymentService {
        service(&[
            ("STRIPE_API_KEY", "sk_test_1"),
            ("PAYU_MERCHANT_KEY", "merchant"),
            ("PAYU_MERCHANT_SALT", "salt"),
            ("CASHFREE_CLIENT_ID", "cf_id"),
            ("CASHFREE_CLIENT_SECRET", "cf_secret"),
            ("RAZORPAY_KEY_ID", "rzp_test_1"),
            ("RAZORPAY_KEY_SECRET", "rzp_secret"),
        ])
    }

    fn customer_request(email: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            email: email.to_string(),
            name: Some("Asha".to_string()),
            address: None,
            meta_info: None,
        }
    }

    fn id_of(record: &Value) -> String {
        record["id"].as_str().unwrap().to_string()
    }

    async fn monthly_plan(service: &SandboxPaymentService, provider: ProviderName) -> String {
        let product = service
            .create_product(CreateProductRequest {
                provider,
                name: "Gold".to_string(),
                description: None,
                meta_info: None,
            })
            .await
            .unwrap();
        let plan = service
            .create_plan(
                &id_of(&product),
                CreatePlanRequest {
                    provider,
                    name: "Gold monthly".to_string(),
                    description: None,
                    pricing_model: "fixed".to_string(),
                    amount: 499.0,
                    currency: "inr".to_string(),
                    billing_interval: "month".to_string(),
                    billing_interval_count: 1,
                    meta_info: None,
                },
            )
            .await
            .unwrap();
        id_of(&plan)
    }

    fn subscribe(provider: ProviderName, plan_id: &str) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            provider,
            plan_id: plan_id.to_string(),
            quantity: 1,
            trial_period_days: None,
            meta_info: None,
        }
    }

    #[tokio::test]
    async fn customers_are_searchable_and_paginated() {
        let service = all_providers();
        service.create_customer(customer_request("a@example.com")).await.unwrap();
        service.create_customer(customer_request("b@example.com")).await.unwrap();
        service.create_customer(customer_request("c@other.org")).await.unwrap();

        let hits = service
            .list_customers(CustomerQuery {
                page: Page::default(),
                search: Some("EXAMPLE".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let page = service
            .list_customers(CustomerQuery {
                page: Page { limit: 1, offset: 2 },
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["email"], "c@other.org");
    }

    #[tokio::test]
    async fn update_customer_is_partial() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();

        let updated = service
            .update_customer(
                &id_of(&customer),
                UpdateCustomerRequest {
                    name: Some("Asha R".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated["name"], "Asha R");
        assert_eq!(updated["email"], "a@example.com");
        assert_eq!(updated["updated_at"], "2025-01-31T00:00:00+00:00");
    }

    #[tokio::test]
    async fn linking_a_provider_is_idempotent() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let id = id_of(&customer);

        service.link_customer_provider(&id, ProviderName::Razorpay).await.unwrap();
        let linked = service.link_customer_provider(&id, ProviderName::Razorpay).await.unwrap();

        let links = linked["provider_customers"].as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0]["provider"], "razorpay");
        assert!(links[0]["provider_customer_id"].as_str().unwrap().starts_with("cust_"));
    }

    #[tokio::test]
    async fn inactive_provider_is_rejected() {
        let service = service(&[("STRIPE_API_KEY", "sk_test_1")]);
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();

        let result = service
            .link_customer_provider(&id_of(&customer), ProviderName::Payu)
            .await;
        assert!(matches!(result, Err(PaymentServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn first_payment_method_becomes_default() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let id = id_of(&customer);
        let method = |token: &str, set_default| CreatePaymentMethodRequest {
            provider: ProviderName::Stripe,
            method_type: "card".to_string(),
            token: Some(token.to_string()),
            payment_method_id: None,
            setup_intent_id: None,
            mandate_id: None,
            set_default,
        };

        let first = service.create_payment_method(&id, method("tok_4242", false)).await.unwrap();
        assert_eq!(first["is_default"], true);
        assert_eq!(first["card"]["last4"], "4242");

        service.create_payment_method(&id, method("tok_1881", true)).await.unwrap();
        let methods = service.list_payment_methods(&id, None).await.unwrap();
        let defaults: Vec<_> = methods.iter().filter(|m| m["is_default"] == true).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0]["card"]["last4"], "1881");

        let razorpay = service
            .list_payment_methods(&id, Some(ProviderName::Razorpay))
            .await
            .unwrap();
        assert!(razorpay.is_empty());
    }

    #[tokio::test]
    async fn payment_method_requires_a_reference() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let result = service
            .create_payment_method(
                &id_of(&customer),
                CreatePaymentMethodRequest {
                    provider: ProviderName::Stripe,
                    method_type: "card".to_string(),
                    token: None,
                    payment_method_id: Some("  ".to_string()),
                    setup_intent_id: None,
                    mandate_id: None,
                    set_default: false,
                },
            )
            .await;
        assert!(matches!(result, Err(PaymentServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn setup_intents_need_a_saved_method_provider() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let id = id_of(&customer);
        let request = |provider, usage: Option<&str>| SetupIntentRequest {
            provider,
            usage: usage.map(str::to_string),
        };

        let intent = service
            .create_setup_intent(&id, request(ProviderName::Stripe, None))
            .await
            .unwrap();
        let intent_id = intent["id"].as_str().unwrap();
        assert!(intent_id.starts_with("seti_"));
        assert!(intent["client_secret"]
            .as_str()
            .unwrap()
            .starts_with(&format!("{intent_id}_secret_")));
        assert_eq!(intent["usage"], "off_session");

        let on_session = service
            .create_setup_intent(&id, request(ProviderName::Stripe, Some("on_session")))
            .await
            .unwrap();
        assert_eq!(on_session["usage"], "on_session");

        let err = service
            .create_setup_intent(&id, request(ProviderName::Stripe, Some("sometimes")))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentServiceError::InvalidRequest(_)));

        let err = service
            .create_setup_intent(&id, request(ProviderName::Razorpay, None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentServiceError::InvalidRequest(_)));

        let err = service
            .create_setup_intent("missing", request(ProviderName::Stripe, None))
            .await
            .unwrap_err();
        assert_eq!(err, PaymentServiceError::not_found("customer", "missing"));
    }

    #[tokio::test]
    async fn payments_validate_and_filter() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let request = |amount| ProcessPaymentRequest {
            provider: ProviderName::Stripe,
            customer_id: id_of(&customer),
            amount,
            currency: "usd".to_string(),
            payment_method_id: Some("pm_1".to_string()),
            mandate_id: None,
            description: Some("Order 7".to_string()),
            meta_info: None,
        };

        assert!(matches!(
            service.process_payment(request(0.0)).await,
            Err(PaymentServiceError::InvalidRequest(_))
        ));

        let payment = service.process_payment(request(25.0)).await.unwrap();
        assert_eq!(payment["status"], "succeeded");
        assert_eq!(payment["currency"], "USD");
        assert_eq!(payment["payment_method"], "pm_1");

        let pending = service
            .list_payments(PaymentQuery {
                status: Some("pending".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn unknown_customer_payment_is_not_found() {
        let service = all_providers();
        let result = service
            .process_payment(ProcessPaymentRequest {
                provider: ProviderName::Stripe,
                customer_id: "missing".to_string(),
                amount: 5.0,
                currency: "usd".to_string(),
                payment_method_id: None,
                mandate_id: None,
                description: None,
                meta_info: None,
            })
            .await;
        assert_eq!(result, Err(PaymentServiceError::not_found("customer", "missing")));
    }

    #[tokio::test]
    async fn plan_rejects_unknown_interval() {
        let service = all_providers();
        let product = service
            .create_product(CreateProductRequest {
                provider: ProviderName::Stripe,
                name: "Gold".to_string(),
                description: None,
                meta_info: None,
            })
            .await
            .unwrap();

        let result = service
            .create_plan(
                &id_of(&product),
                CreatePlanRequest {
                    provider: ProviderName::Stripe,
                    name: "Gold".to_string(),
                    description: None,
                    pricing_model: "fixed".to_string(),
                    amount: 10.0,
                    currency: "usd".to_string(),
                    billing_interval: "fortnight".to_string(),
                    billing_interval_count: 1,
                    meta_info: None,
                },
            )
            .await;
        assert!(matches!(result, Err(PaymentServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn subscriptions_carry_provider_checkout_shapes() {
        let service = all_providers();
        let normalizer = ResponseNormalizer::new();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let customer_id = id_of(&customer);

        let plan = monthly_plan(&service, ProviderName::Razorpay).await;
        let raw = service
            .create_subscription(&customer_id, subscribe(ProviderName::Razorpay, &plan))
            .await
            .unwrap();
        let razorpay = normalizer.subscription(&raw);
        assert!(razorpay.checkout_config.is_some());
        assert_eq!(razorpay.redirect_url, None);
        assert!(razorpay.mandate_token.unwrap().starts_with("sub_"));

        let plan = monthly_plan(&service, ProviderName::Payu).await;
        let raw = service
            .create_subscription(&customer_id, subscribe(ProviderName::Payu, &plan))
            .await
            .unwrap();
        let payu = normalizer.subscription(&raw);
        assert_eq!(payu.redirect_url.as_deref(), Some("https://test.payu.in/_payment"));
        assert!(payu.mandate_token.unwrap().starts_with("SI"));

        let plan = monthly_plan(&service, ProviderName::Cashfree).await;
        let raw = service
            .create_subscription(&customer_id, subscribe(ProviderName::Cashfree, &plan))
            .await
            .unwrap();
        let cashfree = normalizer.subscription(&raw);
        assert!(cashfree
            .redirect_url
            .unwrap()
            .starts_with("https://payments-test.cashfree.com/links/cf_sub_"));
        assert_eq!(cashfree.mandate_token, None);
    }

    #[tokio::test]
    async fn subscription_period_follows_plan_interval() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let plan = monthly_plan(&service, ProviderName::Stripe).await;

        let raw = service
            .create_subscription(&id_of(&customer), subscribe(ProviderName::Stripe, &plan))
            .await
            .unwrap();
        let subscription = ResponseNormalizer::new().subscription(&raw);

        assert_eq!(subscription.status.as_deref(), Some("active"));
        assert_eq!(
            subscription.current_period_start.as_deref(),
            Some("2025-01-31T00:00:00+00:00")
        );
        assert_eq!(
            subscription.current_period_end.as_deref(),
            Some("2025-02-28T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn cancel_immediately_or_at_period_end() {
        let service = all_providers();
        let customer = service.create_customer(customer_request("a@example.com")).await.unwrap();
        let plan = monthly_plan(&service, ProviderName::Stripe).await;
        let first = service
            .create_subscription(&id_of(&customer), subscribe(ProviderName::Stripe, &plan))
            .await
            .unwrap();
        let second = service
            .create_subscription(&id_of(&customer), subscribe(ProviderName::Stripe, &plan))
            .await
            .unwrap();

        let later = service.cancel_subscription(&id_of(&first), true).await.unwrap();
        assert_eq!(later["status"], "active");
        assert_eq!(later["cancel_at_period_end"], true);

        let now = service.cancel_subscription(&id_of(&second), false).await.unwrap();
        assert_eq!(now["status"], "canceled");

        let again = service.cancel_subscription(&id_of(&second), false).await;
        assert!(matches!(again, Err(PaymentServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn injected_errors() {
        let service = all_providers();
        service.set_error(PaymentServiceError::Upstream("timeout".to_string()));

        assert_eq!(
            service.list_products(Page::default()).await,
            Err(PaymentServiceError::Upstream("timeout".to_string()))
        );
        assert!(service.list_products(Page::default()).await.is_ok());

        service.set_method_error("get_customer", PaymentServiceError::Upstream("down".to_string()));
        assert!(service.get_customer("x").await.is_err());
        assert!(service.get_customer("x").await.is_err());
        assert_eq!(service.call_count("get_customer"), 2);

        service.clear_errors();
        assert_eq!(service.get_customer("x").await, Ok(None));
    }
}
