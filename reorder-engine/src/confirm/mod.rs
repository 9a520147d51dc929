//! Confirmation orchestrator - idempotent charge and order materialization
//!
//! Turning a pending order into a paid order must happen exactly once per
//! cycle, no matter how many times a cron retry, a stale email link or an
//! impatient double-click asks for it, and a successful charge must never be
//! left without either a resulting order or a reversing refund.
//!
//! # Confirmation Flow
//!
//! ```text
//! confirm(pending_order_id)
//!     ├─ 1. Fast-path recovery: order already exists for this cycle's
//!     │     charge key -> re-link if needed, return success
//!     ├─ 2. Acquire the per-cycle exclusive lock (bounded wait)
//!     ├─ 3. Re-validate under lock (confirmed / expired / empty -> fail
//!     │     fast, nothing charged)
//!     ├─ 4. Charge the gateway (idempotency key = second safety net,
//!     │     call bounded by a timeout)
//!     ├─ 5. Materialize the order from the snapshot (re-resolving each
//!     │     variant; vanished variants are skipped)
//!     ├─ 6. One write transaction: store order + recovery index, confirm
//!     │     pending order, advance schedule, commit
//!     ├─ 7. On any failure after the charge: abort the transaction, issue
//!     │     a best-effort compensating refund, report failure
//!     └─ 8. Enqueue the confirmation mail (fire-and-forget)
//! ```
//!
//! The charge and the local transaction are not atomic and no code here
//! pretends they are: the refund in step 7 is a compensating action, and the
//! per-cycle lock (held across the gateway call) is what serializes
//! concurrent attempts, not the storage transaction.

mod error;
mod lock;

pub use error::{ConfirmError, ConfirmErrorCode};
pub use lock::CycleLocks;

use crate::catalog::CatalogLookup;
use crate::core::ReorderConfig;
use crate::db::{ReorderStorage, StorageError};
use crate::gateway::{Charge, ChargeRequest, PaymentError, PaymentGateway};
use crate::money::to_minor_units;
use crate::notify::ReorderMailer;
use chrono::{Datelike, Utc};
use rand::Rng;
use shared::{Order, OrderItem, OrderStatus, PendingOrder, PendingOrderError, ReorderSchedule};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures between a successful charge and a committed order; every one of
/// these triggers the compensating refund
#[derive(Debug, Error)]
enum FinalizeError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Transition(#[from] PendingOrderError),

    #[error("no purchasable items remained at confirmation time")]
    NoItems,
}

/// Orchestrates the confirmation of pending orders
pub struct ConfirmationOrchestrator {
    storage: ReorderStorage,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<dyn CatalogLookup>,
    mailer: Arc<dyn ReorderMailer>,
    locks: CycleLocks,
    gateway_timeout: Duration,
    currency: String,
}

impl ConfirmationOrchestrator {
    pub fn new(
        storage: ReorderStorage,
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<dyn CatalogLookup>,
        mailer: Arc<dyn ReorderMailer>,
        config: &ReorderConfig,
    ) -> Self {
        Self {
            storage,
            gateway,
            catalog,
            mailer,
            locks: CycleLocks::new(Duration::from_millis(config.lock_timeout_ms)),
            gateway_timeout: Duration::from_millis(config.gateway_timeout_ms),
            currency: config.pricing.currency.clone(),
        }
    }

    /// Confirm a pending order: charge, materialize, advance
    ///
    /// Idempotent per cycle. Concurrent calls for the same pending order
    /// serialize behind one lock; calls for different pending orders run
    /// independently.
    pub async fn confirm(&self, pending_order_id: &str) -> Result<Order, ConfirmError> {
        let charge_key = PendingOrder::idempotency_key_for(pending_order_id);

        // 1. Fast-path recovery: a prior attempt may have charged and placed
        // the order without the caller ever seeing the response
        if let Some(order) = self.storage.find_order_by_charge_key(&charge_key)? {
            tracing::info!(
                pending_order_id = %pending_order_id,
                order_id = %order.id,
                "Confirmation retry recovered an already placed order"
            );
            self.ensure_confirmed(pending_order_id, &order)?;
            return Ok(order);
        }

        // 2. Serialize: one confirmation per cycle at a time. The guard is
        // held for the rest of this call, including the gateway round trip.
        let _guard = self.locks.acquire(pending_order_id).await?;

        // 3. Re-validate under the lock; fail fast before any money moves
        let mut pending = self
            .storage
            .get_pending_order(pending_order_id)?
            .ok_or_else(|| ConfirmError::NotFound(pending_order_id.to_string()))?;
        if pending.is_confirmed() {
            return Err(ConfirmError::AlreadyConfirmed);
        }
        if pending.is_expired() {
            return Err(ConfirmError::Expired);
        }
        if !pending.snapshot().has_available_items() {
            return Err(ConfirmError::EmptySnapshot);
        }
        let mut schedule = self
            .storage
            .get_schedule(&pending.schedule_id)?
            .ok_or_else(|| ConfirmError::Storage(format!(
                "schedule {} missing for pending order {}",
                pending.schedule_id, pending.id
            )))?;

        // 4. Charge. The idempotency key makes the gateway a second,
        // independent guard against duplicate charges. Bounded by a timeout
        // so a hung gateway cannot wedge the cycle lock.
        let request = ChargeRequest {
            amount_minor: to_minor_units(pending.snapshot().total),
            currency: self.currency.clone(),
            customer_id: schedule.customer_id.clone(),
            payment_method_id: schedule.payment_method_id.clone(),
            idempotency_key: charge_key.clone(),
            description: format!("Scheduled reorder {}", pending.id),
        };
        let charge = match tokio::time::timeout(self.gateway_timeout, self.gateway.charge(request))
            .await
        {
            Ok(Ok(charge)) => charge,
            Ok(Err(PaymentError::Declined { reason })) => {
                tracing::info!(pending_order_id = %pending.id, reason = %reason, "Card declined");
                return Err(ConfirmError::PaymentDeclined(reason));
            }
            Ok(Err(PaymentError::Gateway(msg))) => {
                tracing::warn!(pending_order_id = %pending.id, error = %msg, "Gateway charge failed");
                return Err(ConfirmError::Gateway(msg));
            }
            Err(_) => {
                tracing::warn!(pending_order_id = %pending.id, "Gateway charge timed out");
                return Err(ConfirmError::Gateway(
                    "payment gateway request timed out".to_string(),
                ));
            }
        };

        // 5-6. Materialize and commit; 7. refund if that fails
        let order = match self.finalize(&mut pending, &mut schedule, &charge, &charge_key) {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    pending_order_id = %pending.id,
                    charge_id = %charge.id,
                    error = %e,
                    "Order creation failed after successful charge, refunding"
                );
                self.refund_best_effort(&charge.id).await;
                return Err(ConfirmError::OrderCreation(e.to_string()));
            }
        };

        tracing::info!(
            pending_order_id = %pending.id,
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Pending order confirmed"
        );

        // 8. Fire-and-forget notification; never fails the confirmation
        self.mailer.enqueue_confirmation(&order);

        Ok(order)
    }

    /// Steps 5-6: build the order and commit it together with the pending
    /// order confirmation and the schedule advance
    fn finalize(
        &self,
        pending: &mut PendingOrder,
        schedule: &mut ReorderSchedule,
        charge: &Charge,
        charge_key: &str,
    ) -> Result<Order, FinalizeError> {
        let now = Utc::now().timestamp_millis();
        let order = self.materialize_order(pending, schedule, charge, charge_key, now)?;

        let txn = self.storage.begin_write()?;
        self.storage.store_order(&txn, &order)?;

        pending.confirm(&order.id, now)?;
        self.storage.store_pending_order(&txn, pending)?;

        schedule.advance();
        self.storage.store_schedule(&txn, schedule)?;

        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    /// Build the order from the snapshot's available items, re-resolving each
    /// variant at this moment; vanished variants are skipped
    fn materialize_order(
        &self,
        pending: &PendingOrder,
        schedule: &ReorderSchedule,
        charge: &Charge,
        charge_key: &str,
        now: i64,
    ) -> Result<Order, FinalizeError> {
        let snapshot = pending.snapshot();

        let mut items = Vec::new();
        for line in &snapshot.items {
            match self.catalog.lookup(&line.variant_id) {
                Some(info) => items.push(OrderItem {
                    variant_id: line.variant_id.clone(),
                    product_name: line.product_name.clone(),
                    variant_name: line.variant_name.clone(),
                    sku: info.sku,
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total,
                }),
                None => {
                    tracing::warn!(
                        pending_order_id = %pending.id,
                        variant_id = %line.variant_id,
                        "Variant disappeared between snapshot and confirmation, skipping line"
                    );
                }
            }
        }
        if items.is_empty() {
            return Err(FinalizeError::NoItems);
        }

        Ok(Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: generate_order_number(),
            customer_id: schedule.customer_id.clone(),
            schedule_id: Some(schedule.id.clone()),
            status: OrderStatus::Paid,
            charge_key: charge_key.to_string(),
            charge_id: charge.id.clone(),
            subtotal: snapshot.subtotal,
            tax: snapshot.tax,
            shipping: snapshot.shipping,
            total: snapshot.total,
            items,
            placed_at: now,
        })
    }

    /// Step 7: compensating refund, best effort
    ///
    /// A refund failure is logged and swallowed - the original order-creation
    /// error is the one the caller must see, and support needs the charge id
    /// in the log either way.
    async fn refund_best_effort(&self, charge_id: &str) {
        match self.gateway.refund(charge_id).await {
            Ok(refund) => {
                tracing::info!(charge_id = %charge_id, refund_id = %refund.id, "Compensating refund issued");
            }
            Err(e) => {
                tracing::error!(
                    charge_id = %charge_id,
                    error = %e,
                    "Compensating refund FAILED, manual intervention required"
                );
            }
        }
    }

    /// Fast-path repair: the order exists, make sure the pending order links it
    fn ensure_confirmed(&self, pending_order_id: &str, order: &Order) -> Result<(), ConfirmError> {
        let Some(mut pending) = self.storage.get_pending_order(pending_order_id)? else {
            return Ok(());
        };
        if pending.is_confirmed() {
            return Ok(());
        }
        match pending.confirm(&order.id, Utc::now().timestamp_millis()) {
            Ok(()) => {
                let txn = self.storage.begin_write()?;
                self.storage.store_pending_order(&txn, &pending)?;
                txn.commit().map_err(StorageError::from)?;
                Ok(())
            }
            Err(e) => {
                // The charge and the order both exist; the cycle state is
                // wrong but the customer outcome is right. Log, don't fail.
                tracing::warn!(
                    pending_order_id = %pending_order_id,
                    order_id = %order.id,
                    error = %e,
                    "Placed order exists but pending order refused confirmation"
                );
                Ok(())
            }
        }
    }
}

/// Human-facing order number: `<year>-<6 uppercase alphanumerics>`
fn generate_order_number() -> String {
    let year = Utc::now().year();
    let mut rng = rand::thread_rng();
    let random_part: String = (0..6)
        .map(|_| (rng.sample(rand::distributions::Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}", year, random_part)
}
