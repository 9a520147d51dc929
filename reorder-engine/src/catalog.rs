//! Catalog lookup contract
//!
//! The product catalog lives outside the core; the engine only asks it two
//! questions per variant: is it still purchasable, and what does it cost
//! right now. Snapshot building never trusts a template price.

use rust_decimal::Decimal;

/// Point-in-time view of a product variant
#[derive(Debug, Clone)]
pub struct VariantInfo {
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub sku: Option<String>,
    /// Current live price
    pub price: Decimal,
    pub variant_active: bool,
    pub product_active: bool,
}

impl VariantInfo {
    /// A variant is purchasable when it and its parent product are active
    pub fn is_purchasable(&self) -> bool {
        self.variant_active && self.product_active
    }
}

/// Read-only catalog collaborator
pub trait CatalogLookup: Send + Sync {
    /// Resolve a variant; `None` when the variant no longer exists
    fn lookup(&self, variant_id: &str) -> Option<VariantInfo>;

    /// Whether the variant can currently be sold
    fn is_variant_purchasable(&self, variant_id: &str) -> bool {
        self.lookup(variant_id)
            .map(|v| v.is_purchasable())
            .unwrap_or(false)
    }

    /// Current live price, if the variant still resolves
    fn current_price(&self, variant_id: &str) -> Option<Decimal> {
        self.lookup(variant_id).map(|v| v.price)
    }
}
