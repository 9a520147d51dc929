//! Reorder schedule - a customer's standing instruction to repurchase
//!
//! State machine: `active` (initial) -> `paused` -> `active` (resume), with
//! `cancelled` terminal and reachable from either. Cancelled schedules are
//! never hard-deleted; they stay on record for history but reject every
//! further mutation.

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Recurrence interval between cycles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

impl Cadence {
    /// One cadence period after `from`
    ///
    /// Weekly cadences are exact day arithmetic; monthly cadences use calendar
    /// months with day-of-month overflow clamped to the last day of the target
    /// month (Jan 31 + 1 month -> Feb 28/29).
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        match self {
            Cadence::Weekly => from + Duration::days(7),
            Cadence::Biweekly => from + Duration::days(14),
            // checked_add_months only fails past year 262142, far outside any real schedule
            Cadence::Monthly => from
                .checked_add_months(Months::new(1))
                .expect("date within supported range"),
            Cadence::Quarterly => from
                .checked_add_months(Months::new(3))
                .expect("date within supported range"),
        }
    }

    /// Stable lowercase name (used in gateway session metadata)
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
        }
    }
}

impl FromStr for Cadence {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Cadence::Weekly),
            "biweekly" => Ok(Cadence::Biweekly),
            "monthly" => Ok(Cadence::Monthly),
            "quarterly" => Ok(Cadence::Quarterly),
            other => Err(ScheduleError::InvalidCadence(other.to_string())),
        }
    }
}

/// Schedule lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

/// How a paused schedule re-enters the active rotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeMode {
    /// Next due date = today + cadence
    Asap,
    /// Keep stepping the stored due date by one cadence until it is strictly
    /// in the future, so a long pause does not create a backlog of missed dates
    OriginalSchedule,
}

/// One template line of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Product variant reference (String ID)
    pub variant_id: String,
    pub quantity: u32,
    /// Price at the time the item entered the schedule; display only -
    /// every cycle is re-priced at the current live price
    pub price: Decimal,
}

/// Schedule transition / validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Schedule has been cancelled")]
    Cancelled,

    #[error("Schedule is not active")]
    NotActive,

    #[error("Schedule is not paused")]
    NotPaused,

    #[error("An active schedule must keep at least one item; pause or cancel instead")]
    EmptyItems,

    #[error("Duplicate schedule item for variant: {0}")]
    DuplicateItem(String),

    #[error("Item quantity must be positive for variant: {0}")]
    ZeroQuantity(String),

    #[error("Unknown cadence: {0}")]
    InvalidCadence(String),
}

/// A customer's recurring reorder instruction
///
/// Status, due date and the item set are private: all mutation goes through
/// the guarded transition methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderSchedule {
    pub id: String,
    /// Owning customer (String ID)
    pub customer_id: String,
    cadence: Cadence,
    status: ScheduleStatus,
    next_due_date: NaiveDate,
    /// Saved payment method reference at the gateway
    pub payment_method_id: String,
    /// Card display metadata
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    items: Vec<ScheduleItem>,
    pub created_at: i64,
    paused_at: Option<i64>,
    cancelled_at: Option<i64>,
}

impl ReorderSchedule {
    /// Create an active schedule
    ///
    /// Rejects an empty or duplicated item set - the active-implies-non-empty
    /// invariant holds from birth.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        customer_id: String,
        cadence: Cadence,
        next_due_date: NaiveDate,
        payment_method_id: String,
        card_brand: Option<String>,
        card_last4: Option<String>,
        items: Vec<ScheduleItem>,
        created_at: i64,
    ) -> Result<Self, ScheduleError> {
        if items.is_empty() {
            return Err(ScheduleError::EmptyItems);
        }
        validate_items(&items)?;
        Ok(Self {
            id,
            customer_id,
            cadence,
            status: ScheduleStatus::Active,
            next_due_date,
            payment_method_id,
            card_brand,
            card_last4,
            items,
            created_at,
            paused_at: None,
            cancelled_at: None,
        })
    }

    pub fn status(&self) -> ScheduleStatus {
        self.status
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn next_due_date(&self) -> NaiveDate {
        self.next_due_date
    }

    pub fn items(&self) -> &[ScheduleItem] {
        &self.items
    }

    pub fn paused_at(&self) -> Option<i64> {
        self.paused_at
    }

    pub fn cancelled_at(&self) -> Option<i64> {
        self.cancelled_at
    }

    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }

    pub fn is_paused(&self) -> bool {
        self.status == ScheduleStatus::Paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ScheduleStatus::Cancelled
    }

    /// active -> paused
    pub fn pause(&mut self, now: i64) -> Result<(), ScheduleError> {
        match self.status {
            ScheduleStatus::Active => {
                self.status = ScheduleStatus::Paused;
                self.paused_at = Some(now);
                Ok(())
            }
            ScheduleStatus::Paused => Err(ScheduleError::NotActive),
            ScheduleStatus::Cancelled => Err(ScheduleError::Cancelled),
        }
    }

    /// paused -> active, recomputing the next due date per `mode`
    pub fn resume(&mut self, mode: ResumeMode, today: NaiveDate) -> Result<(), ScheduleError> {
        match self.status {
            ScheduleStatus::Paused => {}
            ScheduleStatus::Cancelled => return Err(ScheduleError::Cancelled),
            ScheduleStatus::Active => return Err(ScheduleError::NotPaused),
        }
        // A schedule emptied while paused must be refilled before resuming
        if self.items.is_empty() {
            return Err(ScheduleError::EmptyItems);
        }
        self.next_due_date = match mode {
            ResumeMode::Asap => self.cadence.advance(today),
            ResumeMode::OriginalSchedule => {
                let mut next = self.next_due_date;
                while next <= today {
                    next = self.cadence.advance(next);
                }
                next
            }
        };
        self.status = ScheduleStatus::Active;
        self.paused_at = None;
        Ok(())
    }

    /// any non-cancelled -> cancelled (terminal)
    pub fn cancel(&mut self, now: i64) -> Result<(), ScheduleError> {
        if self.status == ScheduleStatus::Cancelled {
            return Err(ScheduleError::Cancelled);
        }
        self.status = ScheduleStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(())
    }

    /// Move the next due date forward by one cadence period
    pub fn advance(&mut self) {
        self.next_due_date = self.cadence.advance(self.next_due_date);
    }

    /// Replace the template item set
    ///
    /// An active schedule must stay non-empty; callers wanting to stop
    /// deliveries pause or cancel instead.
    pub fn set_items(&mut self, items: Vec<ScheduleItem>) -> Result<(), ScheduleError> {
        if self.status == ScheduleStatus::Cancelled {
            return Err(ScheduleError::Cancelled);
        }
        if self.status == ScheduleStatus::Active && items.is_empty() {
            return Err(ScheduleError::EmptyItems);
        }
        validate_items(&items)?;
        self.items = items;
        Ok(())
    }

    /// Change the recurrence interval; takes effect from the next advance
    pub fn set_cadence(&mut self, cadence: Cadence) -> Result<(), ScheduleError> {
        if self.status == ScheduleStatus::Cancelled {
            return Err(ScheduleError::Cancelled);
        }
        self.cadence = cadence;
        Ok(())
    }
}

fn validate_items(items: &[ScheduleItem]) -> Result<(), ScheduleError> {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if item.quantity == 0 {
            return Err(ScheduleError::ZeroQuantity(item.variant_id.clone()));
        }
        if !seen.insert(item.variant_id.as_str()) {
            return Err(ScheduleError::DuplicateItem(item.variant_id.clone()));
        }
    }
    Ok(())
}
