//! Checkout flow resolution: embedded widget vs. hosted redirect, and
//! mandate token visibility.

use serde_json::{Map, Value};

use super::fields::{first_non_empty, Fields};

/// How the client should continue checkout.
///
/// At most one of the two is set: a client must not open a widget and
/// navigate away at the same time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutFlow {
    /// Options for an embedded checkout widget.
    pub checkout_config: Option<Map<String, Value>>,
    /// Hosted page to navigate to.
    pub redirect_url: Option<String>,
}

/// Looks fields up on the record first, then in its resolved metadata.
#[derive(Debug, Clone, Copy)]
pub(super) struct Layered<'a> {
    pub record: Fields<'a>,
    pub metadata: Fields<'a>,
}

impl<'a> Layered<'a> {
    fn text(&self, key: &str) -> Option<String> {
        first_non_empty([self.record.text(key), self.metadata.text(key)])
    }

    fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        first_non_empty([self.record.object(key), self.metadata.object(key)])
    }
}

/// Resolve the checkout flow of a subscription or payment record.
///
/// A `checkout_config` wins outright. Otherwise the redirect URL is the
/// first of `redirect.action_url`, `short_url`, `auth_link`.
pub(super) fn checkout_flow(fields: Layered<'_>) -> CheckoutFlow {
    if let Some(config) = fields.object("checkout_config") {
        return CheckoutFlow {
            checkout_config: Some(config.clone()),
            redirect_url: None,
        };
    }

    let action_url = fields
        .metadata
        .object("redirect")
        .and_then(|redirect| Fields::of(redirect).text("action_url"));

    CheckoutFlow {
        checkout_config: None,
        redirect_url: first_non_empty([
            action_url,
            fields.text("short_url"),
            fields.text("auth_link"),
        ]),
    }
}

/// Mandate token to show the client, if the candidate is a recognised one.
///
/// The candidate is an explicit `mandate_token`, else the provider-side
/// subscription id.
pub(super) fn mandate_token(fields: Layered<'_>) -> Option<String> {
    first_non_empty([
        fields.text("mandate_token"),
        fields.record.text("provider_subscription_id"),
    ])
    .filter(|candidate| is_mandate_token(candidate))
}

/// Whether `candidate` has the shape of a provider mandate token.
///
/// Recognised shapes:
/// - `sub_` followed by ASCII alphanumerics or underscores (subscription ids)
/// - `SI` followed by ASCII alphanumerics (standing-instruction tokens)
pub fn is_mandate_token(candidate: &str) -> bool {
    if let Some(rest) = candidate.strip_prefix("sub_") {
        return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    }
    if let Some(rest) = candidate.strip_prefix("SI") {
        return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric());
    }
    false
}
