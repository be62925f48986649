//! Axum router configuration for the payments API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, create_customer, create_payment, create_payment_method, create_plan,
    create_product, create_setup_intent, create_subscription, get_customer, get_subscription, health_check,
    link_customer_provider, list_customer_subscriptions, list_customers, list_payment_methods,
    list_payments, list_plans, list_products, list_providers, list_subscriptions, root,
    update_customer, PaymentsAppState,
};

/// Create the payments API router.
///
/// # Routes
///
/// - `GET /`, `GET /health`
/// - `GET /providers` - Active providers and the default
/// - `GET|POST /customers`, `GET|PATCH /customers/:customer_id`
/// - `POST /customers/:customer_id/providers/:provider`
/// - `GET|POST /customers/:customer_id/payment-methods`
/// - `POST /customers/:customer_id/payment-methods/setup-intent`
/// - `GET|POST /customers/:customer_id/subscriptions`
/// - `GET|POST /payments`
/// - `GET|POST /products`, `GET|POST /products/:product_id/plans`
/// - `GET /subscriptions`, `GET /subscriptions/:subscription_id`
/// - `POST /subscriptions/:subscription_id/cancel`
pub fn payments_router() -> Router<PaymentsAppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/providers", get(list_providers))
        // Customers
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:customer_id",
            get(get_customer).patch(update_customer),
        )
        .route(
            "/customers/:customer_id/providers/:provider",
            post(link_customer_provider),
        )
        .route(
            "/customers/:customer_id/payment-methods",
            get(list_payment_methods).post(create_payment_method),
        )
        .route(
            "/customers/:customer_id/payment-methods/setup-intent",
            post(create_setup_intent),
        )
        .route(
            "/customers/:customer_id/subscriptions",
            get(list_customer_subscriptions).post(create_subscription),
        )
        // Payments
        .route("/payments", get(list_payments).post(create_payment))
        // Catalog
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:product_id/plans",
            get(list_plans).post(create_plan),
        )
        // Subscriptions
        .route("/subscriptions", get(list_subscriptions))
        .route("/subscriptions/:subscription_id", get(get_subscription))
        .route(
            "/subscriptions/:subscription_id/cancel",
            post(cancel_subscription),
        )
}
