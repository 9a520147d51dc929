//! Reorder engine - recurring reorder core
//!
//! # Architecture
//!
//! The engine turns a customer's reorder schedule into paid orders, one due
//! cycle at a time, with an exactly-once charge guarantee:
//!
//! - **Storage** (`db`): embedded redb persistence for schedules, pending
//!   orders and placed orders, plus the charge-key recovery index
//! - **Pricing** (`pricing`): pure point-in-time snapshot builder
//! - **Confirmation** (`confirm`): the idempotent charge / order
//!   materialization / compensating-refund orchestrator
//! - **Services** (`services`): schedule lifecycle ops, cycle creation and
//!   expiry, pending-order edits, one-time schedule setup
//! - **Collaborators** (`gateway`, `catalog`, `notify`): trait seams for the
//!   payment gateway, product catalog and mailer
//!
//! # Module Structure
//!
//! ```text
//! reorder-engine/src/
//! ├── core/          # configuration
//! ├── db/            # redb storage layer
//! ├── pricing/       # snapshot builder
//! ├── confirm/       # confirmation orchestrator + per-cycle locks
//! ├── services/      # schedule / cycle / pending / setup services
//! ├── gateway.rs     # payment gateway contract
//! ├── catalog.rs     # catalog lookup contract
//! ├── notify.rs      # mailer contract
//! ├── money.rs       # fixed-point money helpers
//! └── utils/         # logging bootstrap
//! ```

pub mod catalog;
pub mod confirm;
pub mod core;
pub mod db;
pub mod gateway;
pub mod money;
pub mod notify;
pub mod pricing;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export public types
pub use catalog::{CatalogLookup, VariantInfo};
pub use confirm::{ConfirmError, ConfirmErrorCode, ConfirmationOrchestrator, CycleLocks};
pub use core::{PricingConfig, ReorderConfig};
pub use db::{ReorderStorage, StorageError};
pub use gateway::{
    Charge, ChargeRequest, PaymentError, PaymentGateway, Refund, SetupCompletion, SetupSession,
    SetupSessionRequest,
};
pub use notify::{NullMailer, ReorderMailer};
pub use pricing::{EditedItem, SnapshotBuilder};
pub use services::{
    CycleService, PendingOrderService, ScheduleService, ScheduleSetupService, ServiceError,
    SetupError,
};
pub use utils::logger::{init_logger, init_logger_with_level};
