//! Shared domain types for the reorder system
//!
//! Common types used across the workspace: the reorder schedule and
//! pending order entities with their lifecycle state machines, the
//! placed order model, and the immutable pricing snapshot document.

pub mod models;
pub mod snapshot;

// Re-exports
pub use models::{
    Cadence, Order, OrderItem, OrderStatus, PendingOrder, PendingOrderError, PendingOrderStatus,
    ReorderSchedule, ResumeMode, ScheduleError, ScheduleItem, ScheduleStatus,
};
pub use snapshot::{LineItem, OrderSnapshot, UnavailableItem, SNAPSHOT_SCHEMA_VERSION};
