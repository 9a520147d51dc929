//! Schedule lifecycle operations
//!
//! Thin orchestration over the schedule state machine: load, transition,
//! persist. The state machine itself guards every transition; this service
//! only adds storage and the cross-entity `skip_next` flow.

use super::{ServiceError, ServiceResult};
use crate::db::ReorderStorage;
use chrono::{NaiveDate, Utc};
use shared::{Cadence, ReorderSchedule, ResumeMode, ScheduleItem};

pub struct ScheduleService {
    storage: ReorderStorage,
}

impl ScheduleService {
    pub fn new(storage: ReorderStorage) -> Self {
        Self { storage }
    }

    fn load(&self, schedule_id: &str) -> ServiceResult<ReorderSchedule> {
        self.storage
            .get_schedule(schedule_id)?
            .ok_or_else(|| ServiceError::ScheduleNotFound(schedule_id.to_string()))
    }

    fn store(&self, schedule: &ReorderSchedule) -> ServiceResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.store_schedule(&txn, schedule)?;
        txn.commit().map_err(crate::db::StorageError::from)?;
        Ok(())
    }

    /// Pause an active schedule
    pub fn pause(&self, schedule_id: &str) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        schedule.pause(Utc::now().timestamp_millis())?;
        self.store(&schedule)?;
        tracing::info!(schedule_id = %schedule_id, "Schedule paused");
        Ok(schedule)
    }

    /// Resume a paused schedule
    pub fn resume(
        &self,
        schedule_id: &str,
        mode: ResumeMode,
        today: NaiveDate,
    ) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        schedule.resume(mode, today)?;
        self.store(&schedule)?;
        tracing::info!(
            schedule_id = %schedule_id,
            mode = ?mode,
            next_due = %schedule.next_due_date(),
            "Schedule resumed"
        );
        Ok(schedule)
    }

    /// Cancel a schedule (terminal; the record is kept for history)
    pub fn cancel(&self, schedule_id: &str) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        schedule.cancel(Utc::now().timestamp_millis())?;
        self.store(&schedule)?;
        tracing::info!(schedule_id = %schedule_id, "Schedule cancelled");
        Ok(schedule)
    }

    /// Skip the upcoming delivery: expire its pending cycles, advance the date
    ///
    /// Only active schedules can skip; the expiry and the advance commit
    /// together so a crash cannot leave a skipped date with a live cycle.
    pub fn skip_next(&self, schedule_id: &str) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        if !schedule.is_active() {
            return Err(ServiceError::Validation(format!(
                "Cannot skip delivery for a {:?} schedule",
                schedule.status()
            )));
        }

        let now = Utc::now().timestamp_millis();
        let txn = self.storage.begin_write()?;
        for mut pending in self.storage.pending_for_schedule(schedule_id)? {
            if pending.is_pending() {
                pending.expire(now)?;
                self.storage.store_pending_order(&txn, &pending)?;
                tracing::info!(
                    schedule_id = %schedule_id,
                    pending_order_id = %pending.id,
                    "Pending cycle expired by skip"
                );
            }
        }
        schedule.advance();
        self.storage.store_schedule(&txn, &schedule)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            schedule_id = %schedule_id,
            next_due = %schedule.next_due_date(),
            "Next delivery skipped"
        );
        Ok(schedule)
    }

    /// Replace the schedule's template items
    pub fn update_items(
        &self,
        schedule_id: &str,
        items: Vec<ScheduleItem>,
    ) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        schedule.set_items(items)?;
        self.store(&schedule)?;
        Ok(schedule)
    }

    /// Change the recurrence interval
    pub fn update_cadence(
        &self,
        schedule_id: &str,
        cadence: Cadence,
    ) -> ServiceResult<ReorderSchedule> {
        let mut schedule = self.load(schedule_id)?;
        schedule.set_cadence(cadence)?;
        self.store(&schedule)?;
        Ok(schedule)
    }
}
