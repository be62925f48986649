//! Static provider capability table.
//!
//! Capabilities only tell clients which UI flow to expect from a provider.
//! They never influence normalization.

use super::ProviderName;

/// What a provider supports, as advertised by the discovery endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub display_name: &'static str,
    /// Payment methods can be attached to a customer and reused.
    pub supports_payment_methods: bool,
    /// Checkout happens through a full-page redirect to a hosted page.
    pub supports_hosted_payments: bool,
    /// Checkout opens an embedded widget configured by `checkout_config`.
    pub uses_checkout_widget: bool,
}

const STRIPE: ProviderCapabilities = ProviderCapabilities {
    display_name: "Stripe",
    supports_payment_methods: true,
    supports_hosted_payments: false,
    uses_checkout_widget: false,
};

const PAYU: ProviderCapabilities = ProviderCapabilities {
    display_name: "PayU",
    supports_payment_methods: false,
    supports_hosted_payments: true,
    uses_checkout_widget: false,
};

const CASHFREE: ProviderCapabilities = ProviderCapabilities {
    display_name: "Cashfree",
    supports_payment_methods: false,
    supports_hosted_payments: true,
    uses_checkout_widget: false,
};

const RAZORPAY: ProviderCapabilities = ProviderCapabilities {
    display_name: "Razorpay",
    supports_payment_methods: false,
    supports_hosted_payments: false,
    uses_checkout_widget: true,
};

impl ProviderName {
    pub const fn capabilities(self) -> &'static ProviderCapabilities {
        match self {
            ProviderName::Stripe => &STRIPE,
            ProviderName::Payu => &PAYU,
            ProviderName::Cashfree => &CASHFREE,
            ProviderName::Razorpay => &RAZORPAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stripe_stores_payment_methods() {
        let storing: Vec<_> = ProviderName::ALL
            .into_iter()
            .filter(|p| p.capabilities().supports_payment_methods)
            .collect();
        assert_eq!(storing, vec![ProviderName::Stripe]);
    }

    #[test]
    fn hosted_redirect_and_widget_are_exclusive() {
        for provider in ProviderName::ALL {
            let caps = provider.capabilities();
            assert!(
                !(caps.supports_hosted_payments && caps.uses_checkout_widget),
                "{provider} advertises both flows"
            );
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(ProviderName::Payu.capabilities().display_name, "PayU");
        assert_eq!(ProviderName::Razorpay.capabilities().display_name, "Razorpay");
    }
}
