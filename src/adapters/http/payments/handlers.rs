//! HTTP handlers for the payments API.
//!
//! Handlers resolve the provider for the request, call the payment service,
//! and pass every returned record through the normalizer.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query, Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::normalization::ResponseNormalizer;
use crate::domain::provider::{PaymentConfiguration, ProviderName, ProviderSelectionError};
use crate::ports::{
    CreateCustomerRequest, CreatePaymentMethodRequest, CreatePlanRequest, CreateProductRequest,
    CreateSubscriptionRequest, CustomerQuery, PaymentQuery, PaymentService, PaymentServiceError,
    ProcessPaymentRequest, SetupIntentRequest, SubscriptionQuery, UpdateCustomerRequest,
};

use super::dto::{
    CancelParams, CreateCustomerBody, CreatePaymentBody, CreatePaymentMethodBody, CreatePlanBody,
    CreateProductBody, CreateSubscriptionBody, CustomerListParams, ErrorResponse,
    FilteredListParams, HealthResponse, MessageResponse, PageParams, ProviderFilterParams,
    SetupIntentParams, SetupIntentResponse, UpdateCustomerBody,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub payment_service: Arc<dyn PaymentService>,
    pub payment_config: Arc<PaymentConfiguration>,
    pub normalizer: Arc<ResponseNormalizer>,
}

impl PaymentsAppState {
    pub fn new(
        payment_service: Arc<dyn PaymentService>,
        payment_config: Arc<PaymentConfiguration>,
    ) -> Self {
        Self {
            payment_service,
            payment_config,
            normalizer: Arc::new(ResponseNormalizer::new()),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    fn select(&self, requested: Option<&str>) -> Result<ProviderName, ApiError> {
        let name = self.payment_config.select(requested)?;
        tracing::debug!(provider = %name, "provider selected");
        Ok(name)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Service Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Service banner
pub async fn root() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Welcome to Payment Hub",
    })
}

/// GET /health - Liveness probe
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

/// GET /providers - Active providers and the default
pub async fn list_providers(State(state): State<PaymentsAppState>) -> impl IntoResponse {
    Json(state.payment_config.catalog())
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /customers
pub async fn list_customers(
    State(state): State<PaymentsAppState>,
    ApiQuery(params): ApiQuery<CustomerListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = CustomerQuery {
        page: params.page(),
        search: params.search,
    };
    let records = state.payment_service.list_customers(query).await?;
    Ok(Json(normalize_all(&records, |r| state.normalizer.customer(r))))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<PaymentsAppState>,
    ApiJson(body): ApiJson<CreateCustomerBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = CreateCustomerRequest {
        email: body.email,
        name: body.name,
        address: body.address,
        meta_info: body.meta_info,
    };
    let record = state.payment_service.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(state.normalizer.customer(&record))))
}

/// GET /customers/:customer_id
pub async fn get_customer(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .payment_service
        .get_customer(&customer_id)
        .await?
        .ok_or_else(|| PaymentServiceError::not_found("customer", &customer_id))?;
    Ok(Json(state.normalizer.customer(&record)))
}

/// PATCH /customers/:customer_id
pub async fn update_customer(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiJson(body): ApiJson<UpdateCustomerBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = UpdateCustomerRequest {
        email: body.email,
        name: body.name,
        address: body.address,
        meta_info: body.meta_info,
    };
    let record = state
        .payment_service
        .update_customer(&customer_id, request)
        .await?;
    Ok(Json(state.normalizer.customer(&record)))
}

/// POST /customers/:customer_id/providers/:provider - Register the customer
/// with a provider
pub async fn link_customer_provider(
    State(state): State<PaymentsAppState>,
    Path((customer_id, provider)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.select(Some(&provider))?;
    let record = state
        .payment_service
        .link_customer_provider(&customer_id, provider)
        .await?;
    tracing::info!(customer_id = %customer_id, provider = %provider, "customer linked to provider");
    Ok(Json(state.normalizer.customer(&record)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Methods
// ════════════════════════════════════════════════════════════════════════════════

/// GET /customers/:customer_id/payment-methods
pub async fn list_payment_methods(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiQuery(params): ApiQuery<ProviderFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = params
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<ProviderName>()
                .map_err(|_| ProviderSelectionError::Unknown(p.to_string()))
        })
        .transpose()?;

    let records = state
        .payment_service
        .list_payment_methods(&customer_id, provider)
        .await?;
    Ok(Json(normalize_all(&records, |r| {
        state.normalizer.payment_method(r)
    })))
}

/// POST /customers/:customer_id/payment-methods
pub async fn create_payment_method(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiJson(body): ApiJson<CreatePaymentMethodBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = CreatePaymentMethodRequest {
        provider: state.select(body.provider.as_deref())?,
        method_type: body.method_type,
        token: body.token,
        payment_method_id: body.payment_method_id,
        setup_intent_id: body.setup_intent_id,
        mandate_id: body.mandate_id,
        set_default: body.set_default,
    };
    let record = state
        .payment_service
        .create_payment_method(&customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(state.normalizer.payment_method(&record))))
}

/// POST /customers/:customer_id/payment-methods/setup-intent - Start a
/// client-confirmed flow (3DS) for saving a card
pub async fn create_setup_intent(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiQuery(params): ApiQuery<SetupIntentParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = SetupIntentRequest {
        provider: state.select(params.provider.as_deref())?,
        usage: params.usage,
    };
    let record = state
        .payment_service
        .create_setup_intent(&customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(SetupIntentResponse::from(&record))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════════

/// GET /payments
pub async fn list_payments(
    State(state): State<PaymentsAppState>,
    ApiQuery(params): ApiQuery<FilteredListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = PaymentQuery {
        page: params.page(),
        customer_id: params.customer_id,
        status: params.status,
    };
    let records = state.payment_service.list_payments(query).await?;
    Ok(Json(normalize_all(&records, |r| state.normalizer.payment(r))))
}

/// POST /payments - One-time charge
pub async fn create_payment(
    State(state): State<PaymentsAppState>,
    ApiJson(body): ApiJson<CreatePaymentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let customer_id = body
        .customer_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| PaymentServiceError::InvalidRequest("customer_id is required".to_string()))?;

    let provider = state.select(body.provider.as_deref())?;
    let request = ProcessPaymentRequest {
        provider,
        customer_id,
        amount: body.amount,
        currency: body.currency,
        payment_method_id: body.payment_method_id,
        mandate_id: body.mandate_id,
        description: body.description,
        meta_info: body.meta_info,
    };
    let record = state.payment_service.process_payment(request).await?;
    let payment = state.normalizer.payment(&record);
    tracing::info!(
        provider = %provider,
        payment_id = payment.id.as_deref().unwrap_or_default(),
        status = payment.status.as_deref().unwrap_or_default(),
        "payment processed"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Products & Plans
// ════════════════════════════════════════════════════════════════════════════════

/// GET /products
pub async fn list_products(
    State(state): State<PaymentsAppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.payment_service.list_products(params.page()).await?;
    Ok(Json(normalize_all(&records, |r| state.normalizer.product(r))))
}

/// POST /products
pub async fn create_product(
    State(state): State<PaymentsAppState>,
    ApiJson(body): ApiJson<CreateProductBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = CreateProductRequest {
        provider: state.select(body.provider.as_deref())?,
        name: body.name,
        description: body.description,
        meta_info: body.meta_info,
    };
    let record = state.payment_service.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(state.normalizer.product(&record))))
}

/// GET /products/:product_id/plans
pub async fn list_plans(
    State(state): State<PaymentsAppState>,
    Path(product_id): Path<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .payment_service
        .list_plans(&product_id, params.page())
        .await?;
    Ok(Json(normalize_all(&records, |r| state.normalizer.plan(r))))
}

/// POST /products/:product_id/plans
pub async fn create_plan(
    State(state): State<PaymentsAppState>,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<CreatePlanBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = CreatePlanRequest {
        provider: state.select(body.provider.as_deref())?,
        name: body.name,
        description: body.description,
        pricing_model: body.pricing_model,
        amount: body.amount,
        currency: body.currency,
        billing_interval: body.billing_interval,
        billing_interval_count: body.billing_interval_count,
        meta_info: body.meta_info,
    };
    let record = state
        .payment_service
        .create_plan(&product_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(state.normalizer.plan(&record))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// GET /subscriptions
pub async fn list_subscriptions(
    State(state): State<PaymentsAppState>,
    ApiQuery(params): ApiQuery<FilteredListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SubscriptionQuery {
        page: params.page(),
        customer_id: params.customer_id,
        status: params.status,
    };
    let records = state.payment_service.list_subscriptions(query).await?;
    Ok(Json(normalize_all(&records, |r| {
        state.normalizer.subscription(r)
    })))
}

/// GET /customers/:customer_id/subscriptions
pub async fn list_customer_subscriptions(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SubscriptionQuery {
        page: params.page(),
        customer_id: Some(customer_id),
        status: None,
    };
    let records = state.payment_service.list_subscriptions(query).await?;
    Ok(Json(normalize_all(&records, |r| {
        state.normalizer.subscription(r)
    })))
}

/// POST /customers/:customer_id/subscriptions
pub async fn create_subscription(
    State(state): State<PaymentsAppState>,
    Path(customer_id): Path<String>,
    ApiJson(body): ApiJson<CreateSubscriptionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.select(body.provider.as_deref())?;
    let request = CreateSubscriptionRequest {
        provider,
        plan_id: body.plan_id,
        quantity: body.quantity,
        trial_period_days: body.trial_period_days,
        meta_info: body.meta_info,
    };
    let record = state
        .payment_service
        .create_subscription(&customer_id, request)
        .await?;
    let subscription = state.normalizer.subscription(&record);
    tracing::info!(
        provider = %provider,
        customer_id = %customer_id,
        widget = subscription.checkout_config.is_some(),
        redirect = subscription.redirect_url.is_some(),
        "subscription created"
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// GET /subscriptions/:subscription_id
pub async fn get_subscription(
    State(state): State<PaymentsAppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .payment_service
        .get_subscription(&subscription_id)
        .await?
        .ok_or_else(|| PaymentServiceError::not_found("subscription", &subscription_id))?;
    Ok(Json(state.normalizer.subscription(&record)))
}

/// POST /subscriptions/:subscription_id/cancel
pub async fn cancel_subscription(
    State(state): State<PaymentsAppState>,
    Path(subscription_id): Path<String>,
    ApiQuery(params): ApiQuery<CancelParams>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .payment_service
        .cancel_subscription(&subscription_id, params.cancel_at_period_end)
        .await?;
    tracing::info!(
        subscription_id = %subscription_id,
        at_period_end = params.cancel_at_period_end,
        "subscription canceled"
    );
    Ok(Json(state.normalizer.subscription(&record)))
}

fn normalize_all<T>(records: &[Value], normalize: impl Fn(&Value) -> T) -> Vec<T> {
    records.iter().map(normalize).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Extractors
// ════════════════════════════════════════════════════════════════════════════════

/// JSON body whose rejections use the API error body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string whose rejections use the API error body.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts service and selection errors to HTTP
/// responses.
#[derive(Debug)]
pub enum ApiError {
    Service(PaymentServiceError),
    Selection(ProviderSelectionError),
    /// Body or query string that failed to parse.
    Malformed(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<PaymentServiceError> for ApiError {
    fn from(err: PaymentServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<ProviderSelectionError> for ApiError {
    fn from(err: ProviderSelectionError) -> Self {
        Self::Selection(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            ApiError::Service(err @ PaymentServiceError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.to_string())
            }
            ApiError::Service(err @ PaymentServiceError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            ApiError::Service(err @ PaymentServiceError::Upstream(_)) => {
                tracing::error!(error = %err, "payment service failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PAYMENT_PROVIDER_ERROR",
                    err.to_string(),
                )
            }
            ApiError::Selection(err @ ProviderSelectionError::Unknown(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_PROVIDER", err.to_string())
            }
            ApiError::Selection(err @ ProviderSelectionError::Inactive(_)) => (
                StatusCode::BAD_REQUEST,
                "PROVIDER_NOT_CONFIGURED",
                err.to_string(),
            ),
            ApiError::Malformed(message) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", message.clone())
            }
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
