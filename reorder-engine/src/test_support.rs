//! Shared test fixtures and mock collaborators

use crate::catalog::{CatalogLookup, VariantInfo};
use crate::gateway::{
    Charge, ChargeRequest, PaymentError, PaymentGateway, Refund, SetupCompletion, SetupSession,
    SetupSessionRequest,
};
use crate::notify::ReorderMailer;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::snapshot::{LineItem, OrderSnapshot, SNAPSHOT_SCHEMA_VERSION};
use shared::{
    Cadence, Order, OrderItem, OrderStatus, PendingOrder, ReorderSchedule, ScheduleItem,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ========== Fixtures ==========

/// Monthly schedule for cust-1 with var-1 x2 @ 12.50 and var-2 x1 @ 6.00
pub fn schedule_with_items(id: &str, next_due: NaiveDate) -> ReorderSchedule {
    ReorderSchedule::new(
        id.to_string(),
        "cust-1".to_string(),
        Cadence::Monthly,
        next_due,
        "pm_123".to_string(),
        Some("visa".to_string()),
        Some("4242".to_string()),
        vec![
            ScheduleItem {
                variant_id: "var-1".to_string(),
                quantity: 2,
                price: Decimal::new(1250, 2),
            },
            ScheduleItem {
                variant_id: "var-2".to_string(),
                quantity: 1,
                price: Decimal::new(600, 2),
            },
        ],
        1_700_000_000_000,
    )
    .expect("valid fixture schedule")
}

/// Snapshot matching [`schedule_with_items`] at its template prices:
/// subtotal 31.00, tax 6.20, shipping 6.99, total 44.19
pub fn sample_snapshot() -> OrderSnapshot {
    OrderSnapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        items: vec![
            LineItem {
                variant_id: "var-1".to_string(),
                product_name: "Espresso Beans".to_string(),
                variant_name: "1kg".to_string(),
                quantity: 2,
                unit_price: Decimal::new(1250, 2),
                line_total: Decimal::new(2500, 2),
                available: true,
            },
            LineItem {
                variant_id: "var-2".to_string(),
                product_name: "Filter Papers".to_string(),
                variant_name: "100pk".to_string(),
                quantity: 1,
                unit_price: Decimal::new(600, 2),
                line_total: Decimal::new(600, 2),
                available: true,
            },
        ],
        unavailable_items: vec![],
        subtotal: Decimal::new(3100, 2),
        tax: Decimal::new(620, 2),
        shipping: Decimal::new(699, 2),
        total: Decimal::new(4419, 2),
        built_at: 1_700_000_000_000,
    }
}

pub fn pending_order(id: &str, schedule_id: &str, due_date: NaiveDate) -> PendingOrder {
    PendingOrder::new(
        id.to_string(),
        schedule_id.to_string(),
        due_date,
        sample_snapshot(),
        1_700_000_000_000,
    )
}

pub fn paid_order(id: &str, charge_key: &str) -> Order {
    Order {
        id: id.to_string(),
        order_number: "2024-ABC123".to_string(),
        customer_id: "cust-1".to_string(),
        schedule_id: None,
        status: OrderStatus::Paid,
        charge_key: charge_key.to_string(),
        charge_id: "ch_1".to_string(),
        subtotal: Decimal::new(3100, 2),
        tax: Decimal::new(620, 2),
        shipping: Decimal::new(699, 2),
        total: Decimal::new(4419, 2),
        items: vec![OrderItem {
            variant_id: "var-1".to_string(),
            product_name: "Espresso Beans".to_string(),
            variant_name: "1kg".to_string(),
            sku: Some("SKU-var-1".to_string()),
            unit_price: Decimal::new(1250, 2),
            quantity: 2,
            line_total: Decimal::new(2500, 2),
        }],
        placed_at: 1_700_000_000_000,
    }
}

// ========== Mock Catalog ==========

#[derive(Default)]
pub struct MockCatalog {
    variants: DashMap<String, VariantInfo>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-seeded with the fixture variants var-1 and var-2
    pub fn with_defaults() -> Self {
        let catalog = Self::new();
        catalog.add_variant("var-1", "Espresso Beans", "1kg", Decimal::new(1250, 2));
        catalog.add_variant("var-2", "Filter Papers", "100pk", Decimal::new(600, 2));
        catalog
    }

    pub fn add_variant(&self, variant_id: &str, product_name: &str, variant_name: &str, price: Decimal) {
        self.variants.insert(
            variant_id.to_string(),
            VariantInfo {
                variant_id: variant_id.to_string(),
                product_name: product_name.to_string(),
                variant_name: variant_name.to_string(),
                sku: Some(format!("SKU-{}", variant_id)),
                price,
                variant_active: true,
                product_active: true,
            },
        );
    }

    pub fn set_price(&self, variant_id: &str, price: Decimal) {
        if let Some(mut v) = self.variants.get_mut(variant_id) {
            v.price = price;
        }
    }

    pub fn deactivate_variant(&self, variant_id: &str) {
        if let Some(mut v) = self.variants.get_mut(variant_id) {
            v.variant_active = false;
        }
    }

    pub fn deactivate_product(&self, variant_id: &str) {
        if let Some(mut v) = self.variants.get_mut(variant_id) {
            v.product_active = false;
        }
    }

    pub fn remove_variant(&self, variant_id: &str) {
        self.variants.remove(variant_id);
    }
}

impl CatalogLookup for MockCatalog {
    fn lookup(&self, variant_id: &str) -> Option<VariantInfo> {
        self.variants.get(variant_id).map(|v| v.value().clone())
    }
}

// ========== Mock Gateway ==========

/// In-memory gateway double
///
/// Records charges, refunds and setup sessions; can decline, fail once
/// (transient fault), or delay every call to widen race windows.
pub struct MockGateway {
    charges: Mutex<Vec<Charge>>,
    refunds: Mutex<Vec<Refund>>,
    sessions: Mutex<HashMap<String, SetupSessionRequest>>,
    decline_reason: Option<String>,
    fail_next: AtomicBool,
    delay: Option<Duration>,
    counter: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            charges: Mutex::new(Vec::new()),
            refunds: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
            decline_reason: None,
            fail_next: AtomicBool::new(false),
            delay: None,
            counter: AtomicUsize::new(0),
        }
    }

    /// Decline every charge with the given reason
    pub fn declining(mut self, reason: &str) -> Self {
        self.decline_reason = Some(reason.to_string());
        self
    }

    /// Fail the next charge with a transient gateway error
    pub fn failing_once(self) -> Self {
        self.fail_next.store(true, Ordering::SeqCst);
        self
    }

    /// Sleep before answering any call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }

    pub fn charges(&self) -> Vec<Charge> {
        self.charges.lock().unwrap().clone()
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.lock().unwrap().len()
    }

    pub fn refunds(&self) -> Vec<Refund> {
        self.refunds.lock().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn maybe_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        self.maybe_delay().await;

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PaymentError::Gateway("connection reset".to_string()));
        }
        if let Some(reason) = &self.decline_reason {
            return Err(PaymentError::Declined {
                reason: reason.clone(),
            });
        }

        let charge = Charge {
            id: self.next_id("ch"),
            amount_minor: request.amount_minor,
        };
        self.charges.lock().unwrap().push(charge.clone());
        Ok(charge)
    }

    async fn refund(&self, charge_id: &str) -> Result<Refund, PaymentError> {
        let refund = Refund {
            id: self.next_id("re"),
            charge_id: charge_id.to_string(),
        };
        self.refunds.lock().unwrap().push(refund.clone());
        Ok(refund)
    }

    async fn retrieve(&self, charge_id: &str) -> Result<Charge, PaymentError> {
        self.charges
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == charge_id)
            .cloned()
            .ok_or_else(|| PaymentError::Gateway(format!("no such charge: {}", charge_id)))
    }

    async fn create_setup_session(
        &self,
        request: SetupSessionRequest,
    ) -> Result<SetupSession, PaymentError> {
        let id = self.next_id("cs");
        let url = format!("https://gateway.test/setup/{}", id);
        self.sessions.lock().unwrap().insert(id.clone(), request);
        Ok(SetupSession { id, url })
    }

    async fn retrieve_setup(&self, session_id: &str) -> Result<SetupCompletion, PaymentError> {
        let sessions = self.sessions.lock().unwrap();
        let request = sessions
            .get(session_id)
            .ok_or_else(|| PaymentError::Gateway(format!("no such session: {}", session_id)))?;
        Ok(SetupCompletion {
            payment_method_id: "pm_collected".to_string(),
            card_brand: Some("visa".to_string()),
            card_last4: Some("4242".to_string()),
            metadata: request.metadata.clone(),
        })
    }
}

// ========== Recording Mailer ==========

#[derive(Default)]
pub struct RecordingMailer {
    events: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ReorderMailer for RecordingMailer {
    fn enqueue_confirmation(&self, order: &Order) {
        self.events
            .lock()
            .unwrap()
            .push(format!("confirmation:{}", order.id));
    }

    fn enqueue_order_ready(&self, pending: &PendingOrder) {
        self.events
            .lock()
            .unwrap()
            .push(format!("ready:{}", pending.id));
    }

    fn enqueue_order_expired(&self, pending: &PendingOrder) {
        self.events
            .lock()
            .unwrap()
            .push(format!("expired:{}", pending.id));
    }
}
