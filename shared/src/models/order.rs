//! Placed order model
//!
//! Orders are materialized by the confirmation orchestrator from a confirmed
//! snapshot; beyond that creation contract they belong to the wider shop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status (recurring orders are created already paid)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Paid,
    Refunded,
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product variant reference (String ID)
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-facing order number, `<year>-<6 alphanumerics>`
    pub order_number: String,
    pub customer_id: String,
    /// Originating reorder schedule; absent for one-off checkout orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    pub status: OrderStatus,
    /// Charge idempotency key, used to recover from lost confirmation responses
    pub charge_key: String,
    /// Gateway charge reference
    pub charge_id: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub placed_at: i64,
}
