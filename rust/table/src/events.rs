use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use holdem_engine::action::ActionKind;
use holdem_engine::errors::ErrorKind;
use holdem_engine::player::PlayerId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::store::TableId;

// bounded so one stalled subscriber cannot grow memory without limit
const EVENT_CHANNEL_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<TableEvent>;
pub type EventReceiver = mpsc::Receiver<TableEvent>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Accepted,
    Rejected { reason: String, kind: RejectKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    Validation,
    NotFound,
    Internal,
}

impl From<ErrorKind> for RejectKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => RejectKind::Validation,
            ErrorKind::NotFound => RejectKind::NotFound,
            ErrorKind::Internal => RejectKind::Internal,
        }
    }
}

/// What happened to one queued action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub table_id: TableId,
    pub seq: u64,
    pub player_id: PlayerId,
    pub kind: ActionKind,
    pub outcome: ActionOutcome,
    /// Record version the action was committed in
    pub version: u64,
}

impl ActionReceipt {
    pub fn is_accepted(&self) -> bool {
        self.outcome == ActionOutcome::Accepted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    ActionProcessed(ActionReceipt),
    HandStarted {
        table_id: TableId,
        hand_number: u64,
        dealer_seat: Option<usize>,
    },
    HandCompleted {
        table_id: TableId,
        hand_number: u64,
        message: String,
    },
    TurnTimedOut {
        table_id: TableId,
        player_id: PlayerId,
        turn_seq: u64,
    },
}

impl TableEvent {
    pub fn table_id(&self) -> &str {
        match self {
            TableEvent::ActionProcessed(receipt) => &receipt.table_id,
            TableEvent::HandStarted { table_id, .. }
            | TableEvent::HandCompleted { table_id, .. }
            | TableEvent::TurnTimedOut { table_id, .. } => table_id,
        }
    }
}

pub struct EventSubscription {
    bus: EventBus,
    table_id: TableId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }

    pub async fn recv(&mut self) -> Option<TableEvent> {
        self.receiver.recv().await
    }

    /// Waits for the receipt of the action with `seq`, skipping other events.
    pub async fn receipt_for(&mut self, seq: u64) -> Option<ActionReceipt> {
        while let Some(event) = self.receiver.recv().await {
            if let TableEvent::ActionProcessed(receipt) = event {
                if receipt.seq == seq {
                    return Some(receipt);
                }
            }
        }
        None
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.table_id, self.subscriber_id);
    }
}

/// Fan-out of table events to every subscriber of that table.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<TableId, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, table_id: &str) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(table_id);
        EventSubscription {
            bus: self.clone(),
            table_id: table_id.to_string(),
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, table_id: &str) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        match self.inner.subscribers.write() {
            Ok(mut guard) => guard.entry(table_id.to_string()).or_default().push((id, tx)),
            Err(_) => tracing::error!(table_id, "subscriber lock poisoned"),
        }

        tracing::debug!(table_id, subscriber_id = id, "subscribed to table events");
        (id, rx)
    }

    pub fn broadcast(&self, event: TableEvent) {
        let table_id = event.table_id().to_string();
        tracing::trace!(table_id = %table_id, event = ?event, "broadcasting table event");

        let subscribers = match self.inner.subscribers.read() {
            Ok(guard) => guard.get(&table_id).cloned(),
            Err(_) => {
                tracing::error!(table_id = %table_id, "subscriber lock poisoned");
                return;
            }
        };

        let Some(list) = subscribers else {
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            // try_send drops the event for full or closed receivers
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    table_id = %table_id,
                    subscriber_id = id,
                    error = %e,
                    "dropping table event subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(&table_id, &failed);
        }
    }

    pub fn unsubscribe(&self, table_id: &str, subscriber_id: usize) {
        self.remove_subscribers(table_id, &[subscriber_id]);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .map(|guard| guard.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn remove_subscribers(&self, table_id: &str, ids: &[usize]) {
        let Ok(mut guard) = self.inner.subscribers.write() else {
            return;
        };
        if let Some(list) = guard.get_mut(table_id) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(table_id);
            }
        }
    }
}
