//! Point-in-time pricing snapshot builder
//!
//! Building a snapshot is a pure function of the catalog, the pricing config
//! and the input items; it has no side effects on the schedule or pending
//! order. Every cycle is re-priced at the current live price - the template
//! price stored on a schedule item is display history, never trusted.
//!
//! Two entry points share one output contract:
//!
//! - [`SnapshotBuilder::from_schedule`] reports unpurchasable items as
//!   unavailable lines with a human-readable reason
//! - [`SnapshotBuilder::from_items`] (customer-edited item list) silently
//!   drops anything that does not resolve to a purchasable variant
//!
//! The asymmetry is deliberate and preserved from the shipped behavior: an
//! edited list is the customer's own fresh selection, while a schedule
//! template carries items the customer has not looked at in a while.

use crate::catalog::{CatalogLookup, VariantInfo};
use crate::core::PricingConfig;
use crate::money::round_money;
use rust_decimal::Decimal;
use shared::snapshot::{LineItem, OrderSnapshot, UnavailableItem, SNAPSHOT_SCHEMA_VERSION};
use shared::ReorderSchedule;

/// A caller-supplied (variant, quantity) pair for the edited-items path
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EditedItem {
    pub variant_id: String,
    pub quantity: u32,
}

/// Builds immutable priced snapshots
pub struct SnapshotBuilder<'a> {
    catalog: &'a dyn CatalogLookup,
    pricing: &'a PricingConfig,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(catalog: &'a dyn CatalogLookup, pricing: &'a PricingConfig) -> Self {
        Self { catalog, pricing }
    }

    /// Price a schedule's template items, reporting what can no longer be bought
    pub fn from_schedule(&self, schedule: &ReorderSchedule) -> OrderSnapshot {
        let mut items = Vec::new();
        let mut unavailable = Vec::new();

        for template in schedule.items() {
            match self.catalog.lookup(&template.variant_id) {
                Some(info) if info.is_purchasable() => {
                    items.push(self.price_line(&info, template.quantity));
                }
                Some(info) => {
                    let reason = if !info.variant_active {
                        "Product variant is no longer available"
                    } else {
                        "Product is no longer available"
                    };
                    unavailable.push(UnavailableItem {
                        variant_id: Some(info.variant_id),
                        product_name: info.product_name,
                        variant_name: info.variant_name,
                        reason: reason.to_string(),
                    });
                }
                None => {
                    unavailable.push(UnavailableItem {
                        variant_id: Some(template.variant_id.clone()),
                        product_name: "Unknown Product".to_string(),
                        variant_name: "Unknown".to_string(),
                        reason: "Product variant no longer exists".to_string(),
                    });
                }
            }
        }

        self.finish(items, unavailable)
    }

    /// Price a customer-edited item list, silently dropping what cannot be bought
    pub fn from_items(&self, edited: &[EditedItem]) -> OrderSnapshot {
        let items = edited
            .iter()
            .filter(|e| e.quantity > 0)
            .filter_map(|e| {
                self.catalog
                    .lookup(&e.variant_id)
                    .filter(VariantInfo::is_purchasable)
                    .map(|info| self.price_line(&info, e.quantity))
            })
            .collect();

        self.finish(items, Vec::new())
    }

    fn price_line(&self, info: &VariantInfo, quantity: u32) -> LineItem {
        let unit_price = round_money(info.price);
        LineItem {
            variant_id: info.variant_id.clone(),
            product_name: info.product_name.clone(),
            variant_name: info.variant_name.clone(),
            quantity,
            unit_price,
            line_total: round_money(unit_price * Decimal::from(quantity)),
            available: true,
        }
    }

    fn finish(&self, items: Vec<LineItem>, unavailable: Vec<UnavailableItem>) -> OrderSnapshot {
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * self.pricing.tax_rate);
        let shipping = if subtotal >= self.pricing.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.pricing.standard_shipping
        };
        let total = subtotal + tax + shipping;

        OrderSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            items,
            unavailable_items: unavailable,
            subtotal,
            tax,
            shipping,
            total,
            built_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
