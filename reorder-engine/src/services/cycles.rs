//! Cycle management - creating and expiring pending orders
//!
//! An external scheduler invokes these on a timer. Creation runs a few days
//! ahead of the due date so the customer has a window to review, edit or
//! skip before being charged; anything left unconfirmed long past its date
//! lapses instead of charging a customer who went quiet.

use super::ServiceResult;
use crate::catalog::CatalogLookup;
use crate::core::ReorderConfig;
use crate::db::ReorderStorage;
use crate::notify::ReorderMailer;
use crate::pricing::SnapshotBuilder;
use chrono::{Duration, NaiveDate, Utc};
use shared::PendingOrder;
use std::sync::Arc;

pub struct CycleService {
    storage: ReorderStorage,
    catalog: Arc<dyn CatalogLookup>,
    mailer: Arc<dyn ReorderMailer>,
    config: ReorderConfig,
}

impl CycleService {
    pub fn new(
        storage: ReorderStorage,
        catalog: Arc<dyn CatalogLookup>,
        mailer: Arc<dyn ReorderMailer>,
        config: ReorderConfig,
    ) -> Self {
        Self {
            storage,
            catalog,
            mailer,
            config,
        }
    }

    /// Create pending orders for schedules due `days_before_delivery` from now
    ///
    /// At most one cycle exists per (schedule, due date): a second scheduler
    /// run over the same day finds the existing cycle and skips it. Each
    /// created cycle gets a freshly priced snapshot and a reminder mail.
    pub fn create_due_pending_orders(&self, today: NaiveDate) -> ServiceResult<Vec<PendingOrder>> {
        let target = today + Duration::days(self.config.days_before_delivery as i64);
        let builder = SnapshotBuilder::new(self.catalog.as_ref(), &self.config.pricing);

        let mut created = Vec::new();
        for schedule in self.storage.schedules_due_on(target)? {
            let due_date = schedule.next_due_date();
            if self.storage.pending_exists_for(&schedule.id, due_date)? {
                tracing::info!(
                    schedule_id = %schedule.id,
                    due_date = %due_date,
                    "Pending order already exists, skipping"
                );
                continue;
            }

            let snapshot = builder.from_schedule(&schedule);
            let pending = PendingOrder::new(
                uuid::Uuid::new_v4().to_string(),
                schedule.id.clone(),
                due_date,
                snapshot,
                Utc::now().timestamp_millis(),
            );

            let txn = self.storage.begin_write()?;
            self.storage.store_pending_order(&txn, &pending)?;
            txn.commit().map_err(crate::db::StorageError::from)?;

            tracing::info!(
                schedule_id = %schedule.id,
                pending_order_id = %pending.id,
                due_date = %due_date,
                total = %pending.snapshot().total,
                "Pending order created"
            );
            self.mailer.enqueue_order_ready(&pending);
            created.push(pending);
        }
        Ok(created)
    }

    /// Expire pending orders more than `expiration_days` past their due date
    pub fn expire_stale_pending_orders(&self, today: NaiveDate) -> ServiceResult<Vec<PendingOrder>> {
        let cutoff = today - Duration::days(self.config.expiration_days as i64);
        let now = Utc::now().timestamp_millis();

        let mut expired = Vec::new();
        for mut pending in self.storage.list_unconfirmed()? {
            if pending.due_date >= cutoff {
                continue;
            }
            pending.expire(now)?;

            let txn = self.storage.begin_write()?;
            self.storage.store_pending_order(&txn, &pending)?;
            txn.commit().map_err(crate::db::StorageError::from)?;

            tracing::info!(
                pending_order_id = %pending.id,
                due_date = %pending.due_date,
                "Pending order expired"
            );
            self.mailer.enqueue_order_expired(&pending);
            expired.push(pending);
        }
        Ok(expired)
    }
}
