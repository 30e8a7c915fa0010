use crate::cards::Card;
use crate::errors::GameError;
use crate::hand::HandStrength;
use serde::{Deserialize, Serialize};

/// Stable player identity, issued by whatever established the session.
pub type PlayerId = String;

/// A betting move. `Raise` carries the new total bet for the round, not the
/// increment.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Fold and forfeit the hand
    Fold,
    /// Check (only valid when already matching the table bet)
    Check,
    /// Call the current bet, or go all-in if short
    Call,
    /// Raise the round's bet to the given total
    Raise(u32),
    /// Bet all remaining chips
    AllIn,
}

impl PlayerAction {
    /// Builds an action from its wire name and optional amount, e.g.
    /// `("raise", Some(40))` or `("all-in", None)`.
    pub fn parse(kind: &str, amount: Option<u32>) -> Result<Self, GameError> {
        match (kind.to_ascii_lowercase().as_str(), amount) {
            ("fold", _) => Ok(PlayerAction::Fold),
            ("check", _) => Ok(PlayerAction::Check),
            ("call", _) => Ok(PlayerAction::Call),
            ("raise", Some(total)) => Ok(PlayerAction::Raise(total)),
            ("all-in" | "allin" | "all_in", _) => Ok(PlayerAction::AllIn),
            _ => Err(GameError::UnknownAction(kind.to_string())),
        }
    }

    /// Status text recorded on the player after the action is applied.
    pub fn label(self) -> String {
        match self {
            PlayerAction::Fold => "Fold".to_string(),
            PlayerAction::Check => "Check".to_string(),
            PlayerAction::Call => "Call".to_string(),
            PlayerAction::Raise(total) => format!("Raise to {total}"),
            PlayerAction::AllIn => "All-in".to_string(),
        }
    }
}

/// A seated player or spectator. Carries no layout data; seating position
/// on screen is derived from `seat_index` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Chips behind, not counting `current_bet`
    pub chips: u32,
    /// Empty between hands, exactly two while dealt in
    pub hole_cards: Vec<Card>,
    /// Chips committed in the current betting round
    pub current_bet: u32,
    pub has_folded: bool,
    pub is_spectator: bool,
    pub seat_index: usize,
    /// Status line; empty means the player has not acted this round
    pub last_action: String,
    /// Hole cards are revealed to everyone (showdown)
    pub show_cards: bool,
    /// Set only at showdown
    pub hand_ranking: Option<HandStrength>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, chips: u32, seat_index: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chips,
            hole_cards: Vec::new(),
            current_bet: 0,
            has_folded: false,
            is_spectator: false,
            seat_index,
            last_action: String::new(),
            show_cards: false,
            hand_ranking: None,
        }
    }

    /// Can be dealt into the next hand.
    pub fn is_eligible(&self) -> bool {
        !self.is_spectator && self.chips > 0
    }

    /// Holds cards in the running hand and has not folded.
    pub fn is_live(&self) -> bool {
        !self.is_spectator && !self.has_folded && self.hole_cards.len() == 2
    }

    /// Live and still able to put chips in.
    pub fn can_act(&self) -> bool {
        self.is_live() && self.chips > 0
    }

    pub fn has_acted(&self) -> bool {
        !self.last_action.is_empty()
    }

    /// Moves up to `amount` chips from the stack into the current bet and
    /// returns how much actually moved.
    pub fn commit(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.current_bet += paid;
        paid
    }

    pub fn add_chips(&mut self, amount: u32) {
        self.chips = self.chips.saturating_add(amount);
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.current_bet = 0;
        self.has_folded = false;
        self.last_action.clear();
        self.show_cards = false;
        self.hand_ranking = None;
    }
}
