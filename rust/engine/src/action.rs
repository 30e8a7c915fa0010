use serde::{Deserialize, Serialize};

use crate::player::{PlayerAction, PlayerId};

/// What a submitted action asks the table to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A betting move by the player holding the turn
    Play(PlayerAction),
    StartGame,
    Join { name: String, buy_in: u32 },
    Rebuy(u32),
    ToggleSpectator,
}

impl From<PlayerAction> for ActionKind {
    fn from(action: PlayerAction) -> Self {
        ActionKind::Play(action)
    }
}

/// One queued action. `seq` is the arrival marker, strictly increasing per
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub seq: u64,
    pub player_id: PlayerId,
    pub kind: ActionKind,
    /// Only valid while the table's `turn_seq` still equals this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_turn: Option<u64>,
}

impl Action {
    pub fn new(seq: u64, player_id: impl Into<PlayerId>, kind: impl Into<ActionKind>) -> Self {
        Self {
            seq,
            player_id: player_id.into(),
            kind: kind.into(),
            expected_turn: None,
        }
    }

    pub fn with_expected_turn(mut self, turn_seq: u64) -> Self {
        self.expected_turn = Some(turn_seq);
        self
    }
}
