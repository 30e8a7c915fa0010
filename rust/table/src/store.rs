//! Persistence boundary: versioned table records, the per-table action queue
//! and change notification.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use holdem_engine::action::Action;
use holdem_engine::game::Table;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};

use crate::errors::StoreError;

pub type TableId = String;

/// The committed state of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Bumped by every successful commit
    pub version: u64,
    /// Highest action `seq` already folded into `table`
    pub last_applied_seq: u64,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub action: Action,
    pub submitted_at: DateTime<Utc>,
}

impl QueuedAction {
    pub fn seq(&self) -> u64 {
        self.action.seq
    }
}

/// Storage the orchestrator runs against. Implementations must make
/// `compare_and_swap` atomic and hand out strictly increasing `seq` values
/// per table.
pub trait TableStore: Send + Sync {
    fn create(&self, table_id: &str, table: Table) -> Result<TableRecord, StoreError>;

    fn load(&self, table_id: &str) -> Result<TableRecord, StoreError>;

    /// Replaces the record if its version is still `expected_version`.
    fn compare_and_swap(
        &self,
        table_id: &str,
        expected_version: u64,
        last_applied_seq: u64,
        table: Table,
    ) -> Result<TableRecord, StoreError>;

    /// Appends `action` to the queue. The `seq` it carries is replaced by
    /// the next arrival number.
    fn enqueue(&self, table_id: &str, action: Action) -> Result<QueuedAction, StoreError>;

    fn oldest_pending(&self, table_id: &str) -> Result<Option<QueuedAction>, StoreError>;

    fn pending(&self, table_id: &str) -> Result<Vec<QueuedAction>, StoreError>;

    /// Returns false if the action was already gone.
    fn remove_action(&self, table_id: &str, seq: u64) -> Result<bool, StoreError>;

    /// Receiver that observes every committed record.
    fn subscribe(&self, table_id: &str) -> Result<watch::Receiver<TableRecord>, StoreError>;

    /// Notified after every enqueue.
    fn queue_signal(&self, table_id: &str) -> Result<Arc<Notify>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<TableId, Arc<TableSlot>>>,
}

#[derive(Debug)]
struct TableSlot {
    record: watch::Sender<TableRecord>,
    queue: Mutex<ActionQueue>,
    signal: Arc<Notify>,
}

#[derive(Debug, Default)]
struct ActionQueue {
    next_seq: u64,
    pending: BTreeMap<u64, QueuedAction>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, table_id: &str) -> Result<Arc<TableSlot>, StoreError> {
        let guard = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        guard
            .get(table_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(table_id.to_string()))
    }
}

impl TableStore for InMemoryStore {
    fn create(&self, table_id: &str, table: Table) -> Result<TableRecord, StoreError> {
        let mut guard = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        if guard.contains_key(table_id) {
            return Err(StoreError::AlreadyExists(table_id.to_string()));
        }
        let record = TableRecord {
            version: 0,
            last_applied_seq: 0,
            table,
        };
        let (sender, _) = watch::channel(record.clone());
        guard.insert(
            table_id.to_string(),
            Arc::new(TableSlot {
                record: sender,
                queue: Mutex::new(ActionQueue::default()),
                signal: Arc::new(Notify::new()),
            }),
        );
        Ok(record)
    }

    fn load(&self, table_id: &str) -> Result<TableRecord, StoreError> {
        let slot = self.slot(table_id)?;
        let record = slot.record.borrow().clone();
        Ok(record)
    }

    fn compare_and_swap(
        &self,
        table_id: &str,
        expected_version: u64,
        last_applied_seq: u64,
        table: Table,
    ) -> Result<TableRecord, StoreError> {
        let slot = self.slot(table_id)?;
        let mut outcome = Err(StoreError::Poisoned);
        // the watch lock makes check-and-replace one step
        slot.record.send_if_modified(|current| {
            if current.version != expected_version {
                outcome = Err(StoreError::Conflict {
                    expected: expected_version,
                    actual: current.version,
                });
                return false;
            }
            current.version += 1;
            current.last_applied_seq = current.last_applied_seq.max(last_applied_seq);
            current.table = table;
            outcome = Ok(current.clone());
            true
        });
        outcome
    }

    fn enqueue(&self, table_id: &str, mut action: Action) -> Result<QueuedAction, StoreError> {
        let slot = self.slot(table_id)?;
        let queued = {
            let mut queue = slot.queue.lock().map_err(|_| StoreError::Poisoned)?;
            queue.next_seq += 1;
            action.seq = queue.next_seq;
            let queued = QueuedAction {
                action,
                submitted_at: Utc::now(),
            };
            queue.pending.insert(queued.seq(), queued.clone());
            queued
        };
        slot.signal.notify_waiters();
        Ok(queued)
    }

    fn oldest_pending(&self, table_id: &str) -> Result<Option<QueuedAction>, StoreError> {
        let slot = self.slot(table_id)?;
        let queue = slot.queue.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(queue.pending.values().next().cloned())
    }

    fn pending(&self, table_id: &str) -> Result<Vec<QueuedAction>, StoreError> {
        let slot = self.slot(table_id)?;
        let queue = slot.queue.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(queue.pending.values().cloned().collect())
    }

    fn remove_action(&self, table_id: &str, seq: u64) -> Result<bool, StoreError> {
        let slot = self.slot(table_id)?;
        let mut queue = slot.queue.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(queue.pending.remove(&seq).is_some())
    }

    fn subscribe(&self, table_id: &str) -> Result<watch::Receiver<TableRecord>, StoreError> {
        Ok(self.slot(table_id)?.record.subscribe())
    }

    fn queue_signal(&self, table_id: &str) -> Result<Arc<Notify>, StoreError> {
        Ok(Arc::clone(&self.slot(table_id)?.signal))
    }
}
