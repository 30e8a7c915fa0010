//! Per-turn deadline. When the player holding the turn sits on it for
//! longer than the timeout, a default action is queued on their behalf:
//! `check` if they owe nothing, `fold` otherwise.

use std::sync::Arc;
use std::time::Duration;

use holdem_engine::action::Action;
use holdem_engine::game::Table;
use holdem_engine::player::{PlayerAction, PlayerId};
use tokio::time::Instant;

use crate::errors::TableError;
use crate::events::{EventBus, TableEvent};
use crate::store::{TableRecord, TableStore};

pub struct TurnTimer {
    store: Arc<dyn TableStore>,
    events: EventBus,
    timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Deadline {
    turn_seq: u64,
    player_id: PlayerId,
    at: Instant,
}

impl TurnTimer {
    pub fn new(store: Arc<dyn TableStore>, events: EventBus, timeout: Duration) -> Self {
        Self {
            store,
            events,
            timeout,
        }
    }

    /// Watches `table_id` until its record goes away. Each turn is timed
    /// out at most once; commits that leave `turn_seq` alone do not restart
    /// the clock.
    pub async fn run(self, table_id: String) -> Result<(), TableError> {
        let mut records = self.store.subscribe(&table_id)?;
        let mut deadline: Option<Deadline> = None;
        let mut fired: Option<u64> = None;

        tracing::debug!(table_id = %table_id, timeout_ms = self.timeout.as_millis() as u64, "turn timer started");

        loop {
            let holder = {
                let record = records.borrow_and_update();
                turn_holder(&record.table)
            };
            deadline = match (holder, deadline.take()) {
                (Some((turn_seq, _)), Some(current)) if current.turn_seq == turn_seq => Some(current),
                (Some((turn_seq, player_id)), _) => Some(Deadline {
                    turn_seq,
                    player_id,
                    at: Instant::now() + self.timeout,
                }),
                (None, _) => None,
            };

            let armed = deadline.clone().filter(|d| fired != Some(d.turn_seq));
            match armed {
                Some(d) => {
                    tokio::select! {
                        changed = records.changed() => {
                            if changed.is_err() {
                                return Ok(());
                            }
                        }
                        _ = tokio::time::sleep_until(d.at) => {
                            fired = Some(d.turn_seq);
                            let current = records.borrow().clone();
                            self.expire(&table_id, &current, &d)?;
                        }
                    }
                }
                None => {
                    if records.changed().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn expire(&self, table_id: &str, record: &TableRecord, deadline: &Deadline) -> Result<(), TableError> {
        let action = default_action(&record.table, &deadline.player_id);
        let queued = self.store.enqueue(
            table_id,
            Action::new(0, deadline.player_id.clone(), action).with_expected_turn(deadline.turn_seq),
        )?;
        tracing::info!(
            table_id,
            seq = queued.seq(),
            player_id = %deadline.player_id,
            turn_seq = deadline.turn_seq,
            action = %action.label(),
            "turn timed out"
        );
        self.events.broadcast(TableEvent::TurnTimedOut {
            table_id: table_id.to_string(),
            player_id: deadline.player_id.clone(),
            turn_seq: deadline.turn_seq,
        });
        Ok(())
    }
}

fn turn_holder(table: &Table) -> Option<(u64, PlayerId)> {
    if !table.state.phase.in_hand() {
        return None;
    }
    let id = table.state.current_turn.clone()?;
    Some((table.state.turn_seq, id))
}

/// Check when nothing is owed, fold otherwise.
pub fn default_action(table: &Table, player_id: &str) -> PlayerAction {
    let owes = table
        .player(player_id)
        .map(|p| p.current_bet < table.state.current_bet)
        .unwrap_or(false);
    if owes {
        PlayerAction::Fold
    } else {
        PlayerAction::Check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_engine::game::{Phase, Stakes};
    use holdem_engine::player::Player;

    fn table_in_hand() -> Table {
        let mut table = Table::new(Stakes::default());
        for (i, id) in ["a", "b"].into_iter().enumerate() {
            let mut p = Player::new(id, id, 100, i);
            p.hole_cards = holdem_engine::cards::full_deck()[i * 2..i * 2 + 2].to_vec();
            table.players.push(p);
        }
        table.state.phase = Phase::PreFlop;
        table.state.current_bet = 2;
        table.players[1].current_bet = 2;
        table.state.set_turn(Some("a".into()));
        table
    }

    #[test]
    fn owing_player_folds() {
        let table = table_in_hand();
        assert_eq!(default_action(&table, "a"), PlayerAction::Fold);
    }

    #[test]
    fn matched_player_checks() {
        let table = table_in_hand();
        assert_eq!(default_action(&table, "b"), PlayerAction::Check);
    }

    #[test]
    fn no_holder_between_hands() {
        let mut table = table_in_hand();
        assert_eq!(turn_holder(&table), Some((1, "a".to_string())));
        table.state.phase = Phase::Waiting;
        assert_eq!(turn_holder(&table), None);
    }
}
