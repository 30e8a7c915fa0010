//! Command surface and read-only projection of one table.
//!
//! A [`TableHandle`] is bound to one player at one table. Commands only
//! append to the action queue and return the `seq` they were given; the
//! outcome arrives later as an [`ActionReceipt`](crate::events::ActionReceipt)
//! on the event bus.

use std::sync::Arc;

use holdem_engine::action::{Action, ActionKind};
use holdem_engine::cards::Card;
use holdem_engine::game::{GameState, Phase, Stakes};
use holdem_engine::hand::HandStrength;
use holdem_engine::player::{Player, PlayerAction, PlayerId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::TableError;
use crate::events::{EventBus, EventSubscription};
use crate::store::{TableId, TableRecord, TableStore};

#[derive(Clone)]
pub struct TableHandle {
    table_id: TableId,
    player_id: PlayerId,
    store: Arc<dyn TableStore>,
    events: EventBus,
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle")
            .field("table_id", &self.table_id)
            .field("player_id", &self.player_id)
            .finish()
    }
}

impl TableHandle {
    pub fn new(
        table_id: impl Into<TableId>,
        player_id: impl Into<PlayerId>,
        store: Arc<dyn TableStore>,
        events: EventBus,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            player_id: player_id.into(),
            store,
            events,
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Queues a betting move for this player.
    pub fn submit_action(&self, action: PlayerAction) -> Result<u64, TableError> {
        self.enqueue(action.into())
    }

    /// Queues a betting move given by wire name, e.g. `("raise", Some(40))`.
    /// Unknown names are refused here and never reach the queue.
    pub fn submit(&self, kind: &str, amount: Option<u32>) -> Result<u64, TableError> {
        let action = PlayerAction::parse(kind, amount)?;
        self.submit_action(action)
    }

    pub fn start_game(&self) -> Result<u64, TableError> {
        self.enqueue(ActionKind::StartGame)
    }

    pub fn request_rebuy(&self, amount: u32) -> Result<u64, TableError> {
        self.enqueue(ActionKind::Rebuy(amount))
    }

    pub fn toggle_spectator(&self) -> Result<u64, TableError> {
        self.enqueue(ActionKind::ToggleSpectator)
    }

    pub fn join(&self, name: impl Into<String>, buy_in: u32) -> Result<u64, TableError> {
        self.enqueue(ActionKind::Join {
            name: name.into(),
            buy_in,
        })
    }

    /// The table as this player is allowed to see it.
    pub fn snapshot(&self) -> Result<TableView, TableError> {
        let record = self.store.load(&self.table_id)?;
        Ok(TableView::project(&self.table_id, &record, Some(&self.player_id)))
    }

    /// Receipts and hand events of this table.
    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe(&self.table_id)
    }

    /// Raw committed records, for callers that want to react to every commit.
    pub fn watch(&self) -> Result<watch::Receiver<TableRecord>, TableError> {
        Ok(self.store.subscribe(&self.table_id)?)
    }

    fn enqueue(&self, kind: ActionKind) -> Result<u64, TableError> {
        let queued = self
            .store
            .enqueue(&self.table_id, Action::new(0, self.player_id.clone(), kind))?;
        tracing::debug!(
            table_id = %self.table_id,
            seq = queued.seq(),
            player_id = %self.player_id,
            kind = ?queued.action.kind,
            "action queued"
        );
        Ok(queued.seq())
    }
}

/// Read-only projection of a committed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub table_id: TableId,
    pub version: u64,
    pub state: ViewState,
    pub players: Vec<PlayerView>,
}

/// [`GameState`] without the deck order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub phase: Phase,
    pub pot: u32,
    pub community_cards: Vec<Card>,
    pub current_bet: u32,
    pub min_raise_to: u32,
    pub dealer_position: Option<usize>,
    pub small_blind_position: Option<usize>,
    pub big_blind_position: Option<usize>,
    pub current_turn: Option<PlayerId>,
    pub turn_seq: u64,
    pub hand_number: u64,
    pub deck_remaining: usize,
    pub last_message: String,
    pub stakes: Stakes,
}

impl From<&GameState> for ViewState {
    fn from(state: &GameState) -> Self {
        Self {
            phase: state.phase,
            pot: state.pot,
            community_cards: state.community_cards.clone(),
            current_bet: state.current_bet,
            min_raise_to: state.min_raise_to(),
            dealer_position: state.dealer_position,
            small_blind_position: state.small_blind_position,
            big_blind_position: state.big_blind_position,
            current_turn: state.current_turn.clone(),
            turn_seq: state.turn_seq,
            hand_number: state.hand_number,
            deck_remaining: state.deck.remaining(),
            last_message: state.last_message.clone(),
            stakes: state.stakes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub chips: u32,
    /// One slot per dealt card; `None` is a face-down card
    pub hole_cards: Vec<Option<Card>>,
    pub current_bet: u32,
    pub has_folded: bool,
    pub is_spectator: bool,
    pub seat_index: usize,
    pub last_action: String,
    pub show_cards: bool,
    pub hand_ranking: Option<HandStrength>,
}

impl PlayerView {
    fn project(player: &Player, viewer: Option<&str>) -> Self {
        let visible = player.show_cards || viewer == Some(player.id.as_str());
        let hole_cards = player
            .hole_cards
            .iter()
            .map(|&card| visible.then_some(card))
            .collect();
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            chips: player.chips,
            hole_cards,
            current_bet: player.current_bet,
            has_folded: player.has_folded,
            is_spectator: player.is_spectator,
            seat_index: player.seat_index,
            last_action: player.last_action.clone(),
            show_cards: player.show_cards,
            hand_ranking: player.hand_ranking.clone(),
        }
    }
}

impl TableView {
    /// Projects `record` for `viewer`. Only the viewer's own hole cards and
    /// cards revealed at showdown are face up; `None` hides every hand.
    pub fn project(table_id: &str, record: &TableRecord, viewer: Option<&str>) -> Self {
        let mut players: Vec<PlayerView> = record
            .table
            .players
            .iter()
            .map(|p| PlayerView::project(p, viewer))
            .collect();
        players.sort_by_key(|p| (p.is_spectator, p.seat_index));
        Self {
            table_id: table_id.to_string(),
            version: record.version,
            state: ViewState::from(&record.table.state),
            players,
        }
    }

    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
