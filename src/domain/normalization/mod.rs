//! Response normalization.
//!
//! Provider and storage records arrive in whatever shape the producing
//! provider chose. `ResponseNormalizer` maps them onto one canonical record
//! per entity so clients never branch on provider.

mod checkout;
mod entities;
mod fields;
mod normalizer;

pub use checkout::{is_mandate_token, CheckoutFlow};
pub use entities::{
    CanonicalCustomer, CanonicalPayment, CanonicalPaymentMethod, CanonicalPlan, CanonicalProduct,
    CanonicalSubscription, Metadata, ProviderLink,
};
pub use fields::{first_non_empty, Fields};
pub use normalizer::ResponseNormalizer;
