//! HTTP adapter for the payments API.
//!
//! Every record returned by the payment service is normalized before it is
//! serialized, so responses have the same shape whichever provider served
//! the request.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{ApiError, PaymentsAppState};
pub use routes::payments_router;
