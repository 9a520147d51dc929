//! Domain entity models
//!
//! Each entity with a lifecycle is modelled as an explicit state machine:
//! guarded transition methods return a typed `Result` instead of mutating
//! through ad-hoc flags. Terminal states are closed - no method reopens them.

pub mod order;
pub mod pending_order;
pub mod schedule;

pub use order::{Order, OrderItem, OrderStatus};
pub use pending_order::{PendingOrder, PendingOrderError, PendingOrderStatus};
pub use schedule::{
    Cadence, ReorderSchedule, ResumeMode, ScheduleError, ScheduleItem, ScheduleStatus,
};
