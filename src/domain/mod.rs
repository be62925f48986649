//! Domain layer.
//!
//! - `provider` - provider identities, capabilities and resolved configuration
//! - `normalization` - mapping raw provider records onto canonical records

pub mod normalization;
pub mod provider;
