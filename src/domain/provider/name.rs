//! Provider identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A payment network known to the system.
///
/// Variant order is registration order: it decides which provider is
/// force-activated when nothing is configured and which active provider is
/// "first" when a default has to be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Stripe,
    Payu,
    Cashfree,
    Razorpay,
}

impl ProviderName {
    /// Every provider, in registration order.
    pub const ALL: [ProviderName; 4] = [
        ProviderName::Stripe,
        ProviderName::Payu,
        ProviderName::Cashfree,
        ProviderName::Razorpay,
    ];

    /// Lowercase wire name, also used as the callback URL path segment.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProviderName::Stripe => "stripe",
            ProviderName::Payu => "payu",
            ProviderName::Cashfree => "cashfree",
            ProviderName::Razorpay => "razorpay",
        }
    }

    /// Prefix of this provider's environment variables.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            ProviderName::Stripe => "STRIPE",
            ProviderName::Payu => "PAYU",
            ProviderName::Cashfree => "CASHFREE",
            ProviderName::Razorpay => "RAZORPAY",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment provider '{0}'")]
pub struct ProviderParseError(pub String);

impl FromStr for ProviderName {
    type Err = ProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProviderName::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ProviderParseError(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("PayU".parse::<ProviderName>(), Ok(ProviderName::Payu));
        assert_eq!(" razorpay ".parse::<ProviderName>(), Ok(ProviderName::Razorpay));
        assert_eq!("STRIPE".parse::<ProviderName>(), Ok(ProviderName::Stripe));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "paypal".parse::<ProviderName>().unwrap_err();
        assert_eq!(err, ProviderParseError("paypal".to_string()));
        assert!("".parse::<ProviderName>().is_err());
    }

    #[test]
    fn ordering_follows_registration() {
        let mut shuffled = vec![
            ProviderName::Razorpay,
            ProviderName::Stripe,
            ProviderName::Cashfree,
            ProviderName::Payu,
        ];
        shuffled.sort();
        assert_eq!(shuffled, ProviderName::ALL.to_vec());
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&ProviderName::Cashfree).unwrap();
        assert_eq!(json, "\"cashfree\"");
        let back: ProviderName = serde_json::from_str("\"payu\"").unwrap();
        assert_eq!(back, ProviderName::Payu);
    }
}
