//! Engine configuration
//!
//! # Environment variables
//!
//! Every setting can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | TAX_RATE | 0.20 | Tax rate applied to the subtotal |
//! | FREE_SHIPPING_THRESHOLD | 100.00 | Subtotal at which shipping is free |
//! | STANDARD_SHIPPING | 6.99 | Flat shipping below the threshold |
//! | CURRENCY | gbp | ISO currency code passed to the gateway |
//! | LOCK_TIMEOUT_MS | 10000 | Per-cycle lock acquisition bound |
//! | GATEWAY_TIMEOUT_MS | 30000 | Outbound charge call bound |
//! | DAYS_BEFORE_DELIVERY | 3 | Lead time for creating pending orders |
//! | PENDING_EXPIRATION_DAYS | 7 | Days past due before a cycle expires |

use rust_decimal::Decimal;

/// Pricing rules for snapshot building
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Tax rate as a fraction (0.20 = 20%)
    pub tax_rate: Decimal,
    /// Subtotal at or above which shipping is free
    pub free_shipping_threshold: Decimal,
    /// Flat shipping cost below the threshold
    pub standard_shipping: Decimal,
    /// Currency code for gateway charges
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(20, 2),
            free_shipping_threshold: Decimal::new(100_00, 2),
            standard_shipping: Decimal::new(6_99, 2),
            currency: "gbp".to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ReorderConfig {
    pub pricing: PricingConfig,
    /// How long a confirmation waits for the per-cycle lock (milliseconds)
    pub lock_timeout_ms: u64,
    /// Bound on the outbound gateway charge call (milliseconds)
    pub gateway_timeout_ms: u64,
    /// Pending orders are created this many days before delivery
    pub days_before_delivery: u32,
    /// Pending orders expire this many days past their due date
    pub expiration_days: u32,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            lock_timeout_ms: 10_000,
            gateway_timeout_ms: 30_000,
            days_before_delivery: 3,
            expiration_days: 7,
        }
    }
}

impl ReorderConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pricing: PricingConfig {
                tax_rate: env_decimal("TAX_RATE", defaults.pricing.tax_rate),
                free_shipping_threshold: env_decimal(
                    "FREE_SHIPPING_THRESHOLD",
                    defaults.pricing.free_shipping_threshold,
                ),
                standard_shipping: env_decimal(
                    "STANDARD_SHIPPING",
                    defaults.pricing.standard_shipping,
                ),
                currency: std::env::var("CURRENCY").unwrap_or(defaults.pricing.currency),
            },
            lock_timeout_ms: env_parse("LOCK_TIMEOUT_MS", defaults.lock_timeout_ms),
            gateway_timeout_ms: env_parse("GATEWAY_TIMEOUT_MS", defaults.gateway_timeout_ms),
            days_before_delivery: env_parse("DAYS_BEFORE_DELIVERY", defaults.days_before_delivery),
            expiration_days: env_parse("PENDING_EXPIRATION_DAYS", defaults.expiration_days),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
