//! Engine configuration

pub mod config;

pub use config::{PricingConfig, ReorderConfig};
