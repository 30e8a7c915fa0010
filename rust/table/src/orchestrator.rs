//! Serializes queued actions into committed table states.
//!
//! Each step is one optimistic read-modify-write: load the versioned record,
//! run the action through [`holdem_engine::engine::apply`], then commit with
//! compare-and-swap. A lost race reloads and tries again. The record's
//! `last_applied_seq` marks actions that are already folded in, so any
//! number of runners can drain the same queue without applying an action
//! twice.

use std::sync::{Arc, Mutex};

use holdem_engine::engine::apply;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::errors::{StoreError, TableError};
use crate::events::{ActionOutcome, ActionReceipt, EventBus, TableEvent};
use crate::store::{QueuedAction, TableRecord, TableStore};

/// Result of one [`Orchestrator::process_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Queue was empty
    Idle,
    /// Oldest action had already been committed by another runner
    Skipped { seq: u64 },
    Processed(ActionReceipt),
}

pub struct Orchestrator {
    store: Arc<dyn TableStore>,
    events: EventBus,
    rng: Mutex<ChaCha20Rng>,
    commit_retries: u32,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn TableStore>, events: EventBus, seed: Option<u64>, commit_retries: u32) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_os_rng(),
        };
        Self {
            store,
            events,
            rng: Mutex::new(rng),
            commit_retries: commit_retries.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Takes the oldest queued action of `table_id` and applies it.
    pub fn process_next(&self, table_id: &str) -> Result<Step, TableError> {
        let Some(queued) = self.store.oldest_pending(table_id)? else {
            return Ok(Step::Idle);
        };
        let seq = queued.seq();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let record = self.store.load(table_id)?;

            if seq <= record.last_applied_seq {
                self.store.remove_action(table_id, seq)?;
                tracing::debug!(
                    table_id,
                    seq,
                    last_applied_seq = record.last_applied_seq,
                    "action already applied, dropping"
                );
                return Ok(Step::Skipped { seq });
            }

            let (table, outcome) = self.run_action(&record, &queued);
            match self
                .store
                .compare_and_swap(table_id, record.version, seq, table)
            {
                Ok(committed) => {
                    self.store.remove_action(table_id, seq)?;
                    let receipt = ActionReceipt {
                        table_id: table_id.to_string(),
                        seq,
                        player_id: queued.action.player_id.clone(),
                        kind: queued.action.kind.clone(),
                        outcome,
                        version: committed.version,
                    };
                    tracing::debug!(
                        table_id,
                        seq,
                        player_id = %receipt.player_id,
                        version = committed.version,
                        accepted = receipt.is_accepted(),
                        "action committed"
                    );
                    self.publish(table_id, &record, &committed, receipt.clone());
                    return Ok(Step::Processed(receipt));
                }
                Err(StoreError::Conflict { expected, actual }) if attempts < self.commit_retries => {
                    tracing::debug!(table_id, seq, expected, actual, attempts, "commit conflict, retrying");
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::warn!(table_id, seq, attempts, "giving up on contended commit");
                    return Err(TableError::Conflict { attempts });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Drains the queue; returns how many actions this call committed.
    pub fn process_pending(&self, table_id: &str) -> Result<usize, TableError> {
        let mut processed = 0;
        loop {
            match self.process_next(table_id)? {
                Step::Idle => return Ok(processed),
                Step::Skipped { .. } => {}
                Step::Processed(_) => processed += 1,
            }
        }
    }

    /// Drains the queue every time something is enqueued. Runs until the
    /// table disappears or the task is aborted.
    pub async fn run(self: Arc<Self>, table_id: String) -> Result<(), TableError> {
        let signal = self.store.queue_signal(&table_id)?;
        tracing::info!(table_id = %table_id, "orchestrator started");
        loop {
            let notified = signal.notified();
            tokio::pin!(notified);
            // register before draining so an enqueue in between still wakes us
            notified.as_mut().enable();

            match self.process_pending(&table_id) {
                Ok(_) => {}
                Err(TableError::Conflict { attempts }) => {
                    tracing::warn!(table_id = %table_id, attempts, "queue contended, draining again");
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(err) => {
                    tracing::error!(table_id = %table_id, error = %err, "orchestrator stopped");
                    return Err(err);
                }
            }
            notified.await;
        }
    }

    /// Applies the action to the loaded table. A rejection keeps the table
    /// as it was; the action is consumed either way.
    fn run_action(&self, record: &TableRecord, queued: &QueuedAction) -> (holdem_engine::game::Table, ActionOutcome) {
        let result = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            apply(&record.table, &queued.action, &mut *rng)
        };
        match result {
            Ok(table) => (table, ActionOutcome::Accepted),
            Err(err) => {
                tracing::info!(
                    seq = queued.seq(),
                    player_id = %queued.action.player_id,
                    reason = %err,
                    "action rejected"
                );
                (
                    record.table.clone(),
                    ActionOutcome::Rejected {
                        reason: err.to_string(),
                        kind: err.kind().into(),
                    },
                )
            }
        }
    }

    fn publish(&self, table_id: &str, before: &TableRecord, after: &TableRecord, receipt: ActionReceipt) {
        self.events.broadcast(TableEvent::ActionProcessed(receipt));

        let (old, new) = (&before.table.state, &after.table.state);
        let started_now = new.hand_number > old.hand_number;
        if started_now {
            tracing::info!(table_id, hand_number = new.hand_number, "hand started");
            self.events.broadcast(TableEvent::HandStarted {
                table_id: table_id.to_string(),
                hand_number: new.hand_number,
                dealer_seat: new.dealer_position,
            });
        }
        // a hand can start and finish in one action when everyone is all-in
        if (old.phase.in_hand() || started_now) && !new.phase.in_hand() {
            tracing::info!(table_id, hand_number = new.hand_number, result = %new.last_message, "hand completed");
            self.events.broadcast(TableEvent::HandCompleted {
                table_id: table_id.to_string(),
                hand_number: new.hand_number,
                message: new.last_message.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use holdem_engine::action::{Action, ActionKind};
    use holdem_engine::game::{Phase, Stakes, Table};
    use holdem_engine::player::PlayerAction;

    fn setup() -> (Arc<InMemoryStore>, Orchestrator) {
        let store = Arc::new(InMemoryStore::new());
        store.create("t", Table::new(Stakes::default())).unwrap();
        let orch = Orchestrator::new(store.clone(), EventBus::new(), Some(9), 3);
        (store, orch)
    }

    fn enqueue(store: &InMemoryStore, player: &str, kind: impl Into<ActionKind>) -> u64 {
        store.enqueue("t", Action::new(0, player, kind)).unwrap().seq()
    }

    fn join(store: &InMemoryStore, player: &str) -> u64 {
        enqueue(
            store,
            player,
            ActionKind::Join {
                name: player.to_uppercase(),
                buy_in: 100,
            },
        )
    }

    #[test]
    fn empty_queue_is_idle() {
        let (_, orch) = setup();
        assert_eq!(orch.process_next("t").unwrap(), Step::Idle);
    }

    #[test]
    fn accepted_action_commits_and_leaves_the_queue() {
        let (store, orch) = setup();
        let seq = join(&store, "a");
        let Step::Processed(receipt) = orch.process_next("t").unwrap() else {
            panic!("expected a processed step");
        };
        assert_eq!(receipt.seq, seq);
        assert!(receipt.is_accepted());

        let record = store.load("t").unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.last_applied_seq, seq);
        assert_eq!(record.table.players.len(), 1);
        assert!(store.pending("t").unwrap().is_empty());
    }

    #[test]
    fn rejected_action_is_consumed_without_touching_the_table() {
        let (store, orch) = setup();
        join(&store, "a");
        join(&store, "b");
        orch.process_pending("t").unwrap();
        let before = store.load("t").unwrap();

        let seq = enqueue(&store, "b", PlayerAction::Check);
        let Step::Processed(receipt) = orch.process_next("t").unwrap() else {
            panic!("expected a processed step");
        };
        assert!(matches!(receipt.outcome, ActionOutcome::Rejected { .. }));

        let after = store.load("t").unwrap();
        assert_eq!(after.table, before.table);
        assert_eq!(after.last_applied_seq, seq);
        assert_eq!(orch.process_next("t").unwrap(), Step::Idle);
    }

    #[test]
    fn already_applied_action_is_skipped() {
        let (store, orch) = setup();
        let seq = join(&store, "a");
        // pretend another runner committed it but died before deleting
        let table = store.load("t").unwrap().table;
        store.compare_and_swap("t", 0, seq, table).unwrap();

        assert_eq!(orch.process_next("t").unwrap(), Step::Skipped { seq });
        assert!(store.pending("t").unwrap().is_empty());
        assert!(store.load("t").unwrap().table.players.is_empty());
    }

    #[test]
    fn missing_table_is_an_error() {
        let (_, orch) = setup();
        let err = orch.process_next("nope").unwrap_err();
        assert!(matches!(err, TableError::TableNotFound(_)));
    }

    #[test]
    fn start_game_publishes_hand_started() {
        let store = Arc::new(InMemoryStore::new());
        store.create("t", Table::new(Stakes::default())).unwrap();
        let bus = EventBus::new();
        let mut sub = bus.subscribe("t");
        let orch = Orchestrator::new(store.clone(), bus, Some(1), 3);

        join(&store, "a");
        join(&store, "b");
        enqueue(&store, "a", ActionKind::StartGame);
        assert_eq!(orch.process_pending("t").unwrap(), 3);
        assert_eq!(store.load("t").unwrap().table.state.phase, Phase::PreFlop);

        let mut saw_start = false;
        while let Ok(event) = sub.receiver.try_recv() {
            if let TableEvent::HandStarted { hand_number, .. } = event {
                assert_eq!(hand_number, 1);
                saw_start = true;
            }
        }
        assert!(saw_start);
    }
}
