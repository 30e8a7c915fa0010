use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::player::{Player, PlayerId};

/// Phase of the table. Cycles waiting -> pre-flop -> flop -> turn -> river
/// -> showdown -> waiting, one lap per hand.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Waiting,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    /// Betting is open in this phase.
    pub fn in_hand(self) -> bool {
        matches!(self, Phase::PreFlop | Phase::Flop | Phase::Turn | Phase::River)
    }

    /// Board size that goes with the phase.
    pub fn board_len(self) -> usize {
        match self {
            Phase::Waiting | Phase::PreFlop => 0,
            Phase::Flop => 3,
            Phase::Turn => 4,
            Phase::River | Phase::Showdown => 5,
        }
    }

    /// Street that follows once the round settles, with how many cards it
    /// reveals.
    pub fn next_street(self) -> Option<(Phase, usize)> {
        match self {
            Phase::PreFlop => Some((Phase::Flop, 3)),
            Phase::Flop => Some((Phase::Turn, 1)),
            Phase::Turn => Some((Phase::River, 1)),
            _ => None,
        }
    }
}

/// Fixed limits of a table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stakes {
    pub small_blind: u32,
    pub big_blind: u32,
    pub max_players: usize,
    pub max_buy_in: u32,
}

impl Default for Stakes {
    fn default() -> Self {
        Self {
            small_blind: 1,
            big_blind: 2,
            max_players: 9,
            max_buy_in: 800,
        }
    }
}

/// Shared table state, persisted across hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub pot: u32,
    pub community_cards: Vec<Card>,
    /// Bet every live player has to match this round
    pub current_bet: u32,
    /// Size of the last raise, for minimum-raise enforcement
    pub last_raise: u32,
    pub dealer_position: Option<usize>,
    pub small_blind_position: Option<usize>,
    pub big_blind_position: Option<usize>,
    pub current_turn: Option<PlayerId>,
    /// Bumped every time the turn pointer is set
    pub turn_seq: u64,
    pub hand_number: u64,
    pub deck: Deck,
    pub last_message: String,
    pub stakes: Stakes,
}

impl GameState {
    pub fn new(stakes: Stakes) -> Self {
        Self {
            phase: Phase::Waiting,
            pot: 0,
            community_cards: Vec::new(),
            current_bet: 0,
            last_raise: 0,
            dealer_position: None,
            small_blind_position: None,
            big_blind_position: None,
            current_turn: None,
            turn_seq: 0,
            hand_number: 0,
            deck: Deck::default(),
            last_message: String::new(),
            stakes,
        }
    }

    pub fn set_turn(&mut self, player: Option<PlayerId>) {
        self.current_turn = player;
        self.turn_seq += 1;
    }

    /// Smallest legal raise total.
    pub fn min_raise_to(&self) -> u32 {
        self.current_bet + self.last_raise.max(self.stakes.big_blind)
    }
}

/// The aggregate every action reads and rewrites as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub state: GameState,
    pub players: Vec<Player>,
}

impl Table {
    pub fn new(stakes: Stakes) -> Self {
        Self {
            state: GameState::new(stakes),
            players: Vec::new(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_at_seat(&self, seat: usize) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| !p.is_spectator && p.seat_index == seat)
    }

    /// Indices into `players` of everyone matching `pred`, in seat order.
    pub fn seat_order<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&Player) -> bool,
    {
        let mut idx: Vec<usize> = (0..self.players.len())
            .filter(|&i| pred(&self.players[i]))
            .collect();
        idx.sort_by_key(|&i| self.players[i].seat_index);
        idx
    }

    /// First player matching `pred` strictly after `seat`, wrapping around.
    /// With `seat == None` the lowest matching seat is returned.
    pub fn next_after<F>(&self, seat: Option<usize>, pred: F) -> Option<usize>
    where
        F: Fn(&Player) -> bool,
    {
        let order = self.seat_order(pred);
        let first = order.first().copied();
        match seat {
            None => first,
            Some(s) => order
                .iter()
                .copied()
                .find(|&i| self.players[i].seat_index > s)
                .or(first),
        }
    }

    pub fn seated_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_spectator).count()
    }

    /// Lowest seat index no seated player occupies.
    pub fn free_seat(&self) -> usize {
        (0..)
            .find(|s| self.player_at_seat(*s).is_none())
            .unwrap_or(self.players.len())
    }

    /// Chips on the table: stacks, open bets are already in the pot.
    pub fn total_chips(&self) -> u64 {
        self.players.iter().map(|p| p.chips as u64).sum::<u64>() + self.state.pot as u64
    }
}
