//! Payment provider domain: identity, capabilities and resolved configuration.

mod capabilities;
mod configuration;
mod name;
mod settings;

pub use capabilities::ProviderCapabilities;
pub use configuration::{
    DatabaseSettings, MessagingSettings, PaymentConfiguration, ProviderCatalog,
    ProviderSelectionError, ProviderSummary,
};
pub use name::{ProviderName, ProviderParseError};
pub use settings::{CallbackUrls, Credentials, ProviderConfig, ProviderSettings};
