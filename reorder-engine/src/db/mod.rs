//! redb-based storage layer for the reorder engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `schedules` | `schedule_id` | `ReorderSchedule` | Recurring schedules |
//! | `pending_orders` | `pending_order_id` | `PendingOrder` | Due cycles |
//! | `pending_by_schedule` | `(schedule_id, pending_order_id)` | `()` | Schedule -> cycle index |
//! | `orders` | `order_id` | `Order` | Placed orders |
//! | `orders_by_charge_key` | charge idempotency key | `order_id` | Confirmation recovery index |
//!
//! # Transaction discipline
//!
//! Writes that must land together (order + pending order + schedule on
//! confirmation) share one `WriteTransaction` and commit only on the success
//! path. redb commits with `Durability::Immediate`, so a returned commit is
//! persistent; an aborted confirmation simply drops the transaction.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::{Order, PendingOrder, ReorderSchedule};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Schedules: key = schedule_id, value = JSON-serialized ReorderSchedule
const SCHEDULES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("schedules");

/// Pending orders: key = pending_order_id, value = JSON-serialized PendingOrder
const PENDING_ORDERS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("pending_orders");

/// Schedule -> pending order index: key = (schedule_id, pending_order_id)
const PENDING_BY_SCHEDULE_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("pending_by_schedule");

/// Placed orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Recovery index: key = charge idempotency key, value = order_id
const ORDERS_BY_CHARGE_KEY_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("orders_by_charge_key");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Reorder storage backed by redb
#[derive(Clone)]
pub struct ReorderStorage {
    db: Arc<Database>,
}

impl ReorderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables so first reads never hit a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SCHEDULES_TABLE)?;
            let _ = write_txn.open_table(PENDING_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PENDING_BY_SCHEDULE_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_CHARGE_KEY_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Schedule Operations ==========

    /// Store a schedule (within transaction)
    pub fn store_schedule(
        &self,
        txn: &WriteTransaction,
        schedule: &ReorderSchedule,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SCHEDULES_TABLE)?;
        let value = serde_json::to_vec(schedule)?;
        table.insert(schedule.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a schedule by ID
    pub fn get_schedule(&self, schedule_id: &str) -> StorageResult<Option<ReorderSchedule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCHEDULES_TABLE)?;
        match table.get(schedule_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Active schedules whose next due date is exactly `due_on`
    pub fn schedules_due_on(
        &self,
        due_on: chrono::NaiveDate,
    ) -> StorageResult<Vec<ReorderSchedule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCHEDULES_TABLE)?;

        let mut due = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let schedule: ReorderSchedule = serde_json::from_slice(value.value())?;
            if schedule.is_active() && schedule.next_due_date() == due_on {
                due.push(schedule);
            }
        }
        Ok(due)
    }

    /// All schedules for a customer
    pub fn schedules_for_customer(
        &self,
        customer_id: &str,
    ) -> StorageResult<Vec<ReorderSchedule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCHEDULES_TABLE)?;

        let mut schedules = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let schedule: ReorderSchedule = serde_json::from_slice(value.value())?;
            if schedule.customer_id == customer_id {
                schedules.push(schedule);
            }
        }
        Ok(schedules)
    }

    // ========== Pending Order Operations ==========

    /// Store a pending order and maintain the schedule index (within transaction)
    pub fn store_pending_order(
        &self,
        txn: &WriteTransaction,
        pending: &PendingOrder,
    ) -> StorageResult<()> {
        {
            let mut table = txn.open_table(PENDING_ORDERS_TABLE)?;
            let value = serde_json::to_vec(pending)?;
            table.insert(pending.id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(PENDING_BY_SCHEDULE_TABLE)?;
        index.insert((pending.schedule_id.as_str(), pending.id.as_str()), ())?;
        Ok(())
    }

    /// Get a pending order by ID
    pub fn get_pending_order(&self, pending_order_id: &str) -> StorageResult<Option<PendingOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;
        match table.get(pending_order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All pending orders belonging to a schedule
    pub fn pending_for_schedule(&self, schedule_id: &str) -> StorageResult<Vec<PendingOrder>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PENDING_BY_SCHEDULE_TABLE)?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;

        let mut pending = Vec::new();
        for result in index.range((schedule_id, "")..)? {
            let (key, _value) = result?;
            let (owner_id, pending_id) = key.value();
            if owner_id != schedule_id {
                break;
            }
            if let Some(value) = table.get(pending_id)? {
                pending.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(pending)
    }

    /// Whether a cycle already exists for (schedule, due date)
    ///
    /// Guards against double-creation when two scheduler runs overlap.
    pub fn pending_exists_for(
        &self,
        schedule_id: &str,
        due_date: chrono::NaiveDate,
    ) -> StorageResult<bool> {
        Ok(self
            .pending_for_schedule(schedule_id)?
            .iter()
            .any(|p| p.due_date == due_date))
    }

    /// All pending orders still awaiting confirmation, across schedules
    pub fn list_unconfirmed(&self) -> StorageResult<Vec<PendingOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;

        let mut pending = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let p: PendingOrder = serde_json::from_slice(value.value())?;
            if p.is_pending() {
                pending.push(p);
            }
        }
        Ok(pending)
    }

    // ========== Order Operations ==========

    /// Store an order and its charge-key recovery index entry (within transaction)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ORDERS_BY_CHARGE_KEY_TABLE)?;
        index.insert(order.charge_key.as_str(), order.id.as_str())?;
        Ok(())
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an order by its charge idempotency key
    ///
    /// This is the fast-path recovery read: a retried confirmation whose
    /// earlier attempt charged and persisted but lost the response lands here.
    pub fn find_order_by_charge_key(&self, charge_key: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDERS_BY_CHARGE_KEY_TABLE)?;

        let order_id = match index.get(charge_key)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };
        drop(index);

        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{paid_order, pending_order, schedule_with_items};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_round_trip() {
        let storage = ReorderStorage::open_in_memory().unwrap();
        let schedule = schedule_with_items("sched-1", date(2024, 3, 1));

        let txn = storage.begin_write().unwrap();
        storage.store_schedule(&txn, &schedule).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_schedule("sched-1").unwrap().unwrap();
        assert_eq!(loaded.id, "sched-1");
        assert_eq!(loaded.next_due_date(), date(2024, 3, 1));
        assert_eq!(loaded.items().len(), schedule.items().len());

        assert!(storage.get_schedule("missing").unwrap().is_none());
    }

    #[test]
    fn test_schedules_due_on_filters_status_and_date() {
        let storage = ReorderStorage::open_in_memory().unwrap();

        let due = schedule_with_items("sched-due", date(2024, 3, 1));
        let later = schedule_with_items("sched-later", date(2024, 4, 1));
        let mut paused = schedule_with_items("sched-paused", date(2024, 3, 1));
        paused.pause(1).unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_schedule(&txn, &due).unwrap();
        storage.store_schedule(&txn, &later).unwrap();
        storage.store_schedule(&txn, &paused).unwrap();
        txn.commit().unwrap();

        let found = storage.schedules_due_on(date(2024, 3, 1)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "sched-due");
    }

    #[test]
    fn test_pending_order_index() {
        let storage = ReorderStorage::open_in_memory().unwrap();

        let a = pending_order("po-a", "sched-1", date(2024, 3, 1));
        let b = pending_order("po-b", "sched-1", date(2024, 4, 1));
        let other = pending_order("po-c", "sched-2", date(2024, 3, 1));

        let txn = storage.begin_write().unwrap();
        storage.store_pending_order(&txn, &a).unwrap();
        storage.store_pending_order(&txn, &b).unwrap();
        storage.store_pending_order(&txn, &other).unwrap();
        txn.commit().unwrap();

        let for_one = storage.pending_for_schedule("sched-1").unwrap();
        assert_eq!(for_one.len(), 2);

        assert!(storage.pending_exists_for("sched-1", date(2024, 3, 1)).unwrap());
        assert!(!storage.pending_exists_for("sched-1", date(2024, 5, 1)).unwrap());
    }

    #[test]
    fn test_order_charge_key_lookup() {
        let storage = ReorderStorage::open_in_memory().unwrap();
        let order = paid_order("order-1", "pending_order_po-1");

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let found = storage
            .find_order_by_charge_key("pending_order_po-1")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "order-1");

        assert!(storage
            .find_order_by_charge_key("pending_order_other")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let storage = ReorderStorage::open_in_memory().unwrap();
        let schedule = schedule_with_items("sched-1", date(2024, 3, 1));

        let txn = storage.begin_write().unwrap();
        storage.store_schedule(&txn, &schedule).unwrap();
        drop(txn); // abort

        assert!(storage.get_schedule("sched-1").unwrap().is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reorder.redb");

        {
            let storage = ReorderStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage
                .store_pending_order(&txn, &pending_order("po-1", "sched-1", date(2024, 3, 1)))
                .unwrap();
            txn.commit().unwrap();
        }

        let reopened = ReorderStorage::open(&path).unwrap();
        let loaded = reopened.get_pending_order("po-1").unwrap().unwrap();
        assert_eq!(loaded.schedule_id, "sched-1");
    }
}
