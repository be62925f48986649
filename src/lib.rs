//! Payment Hub - multi-provider payment configuration and response
//! normalization.
//!
//! Resolves which payment providers (Stripe, PayU, Cashfree, Razorpay) are
//! active from the environment, and maps provider-shaped records onto
//! canonical records served over HTTP.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
