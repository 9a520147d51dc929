//! Application services
//!
//! The operations the request layer calls into, one service per concern:
//!
//! - [`ScheduleService`] - pause / resume / cancel / skip / edit a schedule
//! - [`CycleService`] - create due pending orders, expire stale ones
//! - [`PendingOrderService`] - customer edits to a pending cycle
//! - [`ScheduleSetupService`] - one-time schedule creation from a prior order

pub mod cycles;
pub mod pending;
pub mod schedule;
pub mod setup;

pub use cycles::CycleService;
pub use pending::PendingOrderService;
pub use schedule::ScheduleService;
pub use setup::{ScheduleSetupService, SetupError};

use crate::db::StorageError;
use shared::{PendingOrderError, ScheduleError};
use thiserror::Error;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Pending order not found: {0}")]
    PendingOrderNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0}")]
    PendingOrder(#[from] PendingOrderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
