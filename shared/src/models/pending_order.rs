//! Pending order - the not-yet-charged instance of one due cycle
//!
//! State machine: `pending` (initial) -> `confirmed` | `expired`, both
//! terminal. Confirmation is idempotent against the already-linked order and
//! rejects any other order, so a retried confirmation can never re-link a
//! cycle to a second order.

use crate::snapshot::OrderSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pending order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingOrderStatus {
    #[default]
    Pending,
    Confirmed,
    Expired,
}

/// Pending order transition errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PendingOrderError {
    #[error("Pending order has already been confirmed")]
    AlreadyConfirmed,

    #[error("Pending order has expired")]
    Expired,

    #[error("Pending order is already linked to order {linked}, refusing to link {attempted}")]
    OrderMismatch { linked: String, attempted: String },
}

/// One due cycle of a reorder schedule, awaiting confirmation
///
/// The snapshot is write-once: it can be wholly replaced while still pending
/// (customer edit), never mutated in place, and never touched after the
/// order reaches a terminal state. Status and the order link only move
/// through the guarded transitions below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: String,
    /// Owning schedule (String ID)
    pub schedule_id: String,
    status: PendingOrderStatus,
    /// The delivery date this cycle was scheduled for
    pub due_date: chrono::NaiveDate,
    snapshot: OrderSnapshot,
    /// Link to the placed order, set on confirmation
    order_id: Option<String>,
    pub created_at: i64,
    confirmed_at: Option<i64>,
    expired_at: Option<i64>,
}

impl PendingOrder {
    pub fn new(
        id: String,
        schedule_id: String,
        due_date: chrono::NaiveDate,
        snapshot: OrderSnapshot,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            schedule_id,
            status: PendingOrderStatus::Pending,
            due_date,
            snapshot,
            order_id: None,
            created_at,
            confirmed_at: None,
            expired_at: None,
        }
    }

    /// Deterministic charge idempotency key for a pending order id
    ///
    /// The same cycle always derives the same key, so every retry of a
    /// confirmation reuses the charge the gateway already knows about.
    pub fn idempotency_key_for(pending_order_id: &str) -> String {
        format!("pending_order_{}", pending_order_id)
    }

    /// Charge idempotency key for this cycle
    pub fn idempotency_key(&self) -> String {
        Self::idempotency_key_for(&self.id)
    }

    pub fn status(&self) -> PendingOrderStatus {
        self.status
    }

    pub fn snapshot(&self) -> &OrderSnapshot {
        &self.snapshot
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    pub fn confirmed_at(&self) -> Option<i64> {
        self.confirmed_at
    }

    pub fn expired_at(&self) -> Option<i64> {
        self.expired_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == PendingOrderStatus::Pending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PendingOrderStatus::Confirmed
    }

    pub fn is_expired(&self) -> bool {
        self.status == PendingOrderStatus::Expired
    }

    /// pending -> confirmed, linking the placed order
    ///
    /// Re-confirming with the already-linked order is a no-op success;
    /// confirming with any other order is rejected.
    pub fn confirm(&mut self, order_id: &str, now: i64) -> Result<(), PendingOrderError> {
        match self.status {
            PendingOrderStatus::Pending => {
                self.status = PendingOrderStatus::Confirmed;
                self.order_id = Some(order_id.to_string());
                self.confirmed_at = Some(now);
                Ok(())
            }
            PendingOrderStatus::Confirmed => match self.order_id.as_deref() {
                Some(linked) if linked == order_id => Ok(()),
                Some(linked) => Err(PendingOrderError::OrderMismatch {
                    linked: linked.to_string(),
                    attempted: order_id.to_string(),
                }),
                // Confirmed always carries a link; treat a missing one as a mismatch
                None => Err(PendingOrderError::OrderMismatch {
                    linked: String::new(),
                    attempted: order_id.to_string(),
                }),
            },
            PendingOrderStatus::Expired => Err(PendingOrderError::Expired),
        }
    }

    /// pending -> expired (cycle skipped or left unconfirmed too long)
    pub fn expire(&mut self, now: i64) -> Result<(), PendingOrderError> {
        match self.status {
            PendingOrderStatus::Pending => {
                self.status = PendingOrderStatus::Expired;
                self.expired_at = Some(now);
                Ok(())
            }
            PendingOrderStatus::Confirmed => Err(PendingOrderError::AlreadyConfirmed),
            PendingOrderStatus::Expired => Err(PendingOrderError::Expired),
        }
    }

    /// Swap in a freshly built snapshot (customer edited the cycle)
    ///
    /// Only allowed while pending: the price lock a customer confirmed or
    /// that has lapsed is immutable history.
    pub fn replace_snapshot(&mut self, snapshot: OrderSnapshot) -> Result<(), PendingOrderError> {
        match self.status {
            PendingOrderStatus::Pending => {
                self.snapshot = snapshot;
                Ok(())
            }
            PendingOrderStatus::Confirmed => Err(PendingOrderError::AlreadyConfirmed),
            PendingOrderStatus::Expired => Err(PendingOrderError::Expired),
        }
    }
}
