//! Adapters - Implementations of port interfaces.
//!
//! - `http` - axum REST API
//! - `sandbox` - in-memory `PaymentService`

pub mod http;
pub mod sandbox;

pub use sandbox::SandboxPaymentService;
