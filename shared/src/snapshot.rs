//! Pricing snapshot - immutable point-in-time copy of a pending order's contents
//!
//! A snapshot is a value object, not a mutable entity: once built it is never
//! edited in place. A pending order may swap its snapshot for a freshly built
//! one while still pending (customer edit), but individual fields are never
//! re-derived after the fact. This is the price lock the customer confirms
//! against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current snapshot document schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// A priced, purchasable line in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product variant reference (String ID)
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub quantity: u32,
    /// Unit price captured at snapshot time (current live price, not the template price)
    pub unit_price: Decimal,
    /// unit_price * quantity
    pub line_total: Decimal,
    /// Always true for priced lines; kept explicit so the document is self-describing
    pub available: bool,
}

/// A line the schedule wanted but the catalog can no longer supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableItem {
    /// Variant reference, if it still resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    pub variant_name: String,
    /// Human-readable reason shown to the customer
    pub reason: String,
}

/// Immutable priced document for one due cycle
///
/// All monetary fields are fixed-point decimals rounded to two places with
/// half-to-even semantics; binary floats never appear in this document.
/// Invariant: `subtotal + tax + shipping == total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Document schema version (for forward migration of stored snapshots)
    pub schema_version: u32,
    /// Purchasable items, priced at snapshot time
    pub items: Vec<LineItem>,
    /// Items that could not be priced, with reasons
    #[serde(default)]
    pub unavailable_items: Vec<UnavailableItem>,
    /// Sum of available line totals
    pub subtotal: Decimal,
    /// Tax on the subtotal
    pub tax: Decimal,
    /// Shipping cost (zero above the free-shipping threshold)
    pub shipping: Decimal,
    /// subtotal + tax + shipping
    pub total: Decimal,
    /// Snapshot build timestamp (Unix millis)
    pub built_at: i64,
}

impl OrderSnapshot {
    /// True if the snapshot holds at least one purchasable line
    pub fn has_available_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// True if nothing at all survived pricing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.unavailable_items.is_empty()
    }

    /// Total quantity across available lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
