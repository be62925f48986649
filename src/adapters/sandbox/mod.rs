//! Sandbox payment service.
//!
//! Implements the `PaymentService` port in memory. Used when no external
//! payment collaborator is wired in, and throughout the test suite.

mod provider_records;
mod sandbox_payment_service;

pub use sandbox_payment_service::SandboxPaymentService;
