//! Notification contract
//!
//! All mail is fire-and-forget: a mailer failure never fails the operation
//! that triggered it. Implementations are expected to enqueue and log their
//! own delivery errors.

use shared::{Order, PendingOrder};

/// Mailer collaborator
pub trait ReorderMailer: Send + Sync {
    /// Order confirmed and paid
    fn enqueue_confirmation(&self, order: &Order);

    /// A pending order was created and awaits confirmation
    fn enqueue_order_ready(&self, pending: &PendingOrder);

    /// A pending order lapsed without confirmation
    fn enqueue_order_expired(&self, pending: &PendingOrder);
}

/// Mailer that drops everything (tests, headless deployments)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMailer;

impl ReorderMailer for NullMailer {
    fn enqueue_confirmation(&self, _order: &Order) {}
    fn enqueue_order_ready(&self, _pending: &PendingOrder) {}
    fn enqueue_order_expired(&self, _pending: &PendingOrder) {}
}
