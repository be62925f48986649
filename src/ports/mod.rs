//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentService` - the opaque payment-processing collaborator
//! - `Clock` - time source for normalization

mod clock;
mod payment_service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use payment_service::{
    CreateCustomerRequest, CreatePaymentMethodRequest, CreatePlanRequest, CreateProductRequest,
    CreateSubscriptionRequest, CustomerQuery, Page, PaymentQuery, PaymentService,
    PaymentServiceError, ProcessPaymentRequest, SetupIntentRequest, SubscriptionQuery,
    UpdateCustomerRequest,
};
