use thiserror::Error;

use crate::player::PlayerId;

/// How a failure should be treated by whoever drives the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The action is illegal right now; state stays as it was.
    Validation,
    /// The action names something that does not exist.
    NotFound,
    /// Broken invariant inside the engine.
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid raise to {amount}, minimum: {minimum}")]
    InvalidRaise { amount: u32, minimum: u32 },
    #[error("Insufficient chips for action")]
    InsufficientChips,
    #[error("Cannot check while facing a bet of {to_call}")]
    CannotCheck { to_call: u32 },
    #[error("Nothing to call")]
    CannotCall,
    #[error("No hand in progress")]
    NoHandInProgress,
    #[error("Hand already in progress")]
    HandInProgress,
    #[error("Turn {expected} already passed, table is at turn {actual}")]
    StaleTurn { expected: u64, actual: u64 },
    #[error("Unknown action {0:?}")]
    UnknownAction(String),
    #[error("It's not player {actual}'s turn (expected {expected:?})")]
    NotPlayersTurn {
        expected: Option<PlayerId>,
        actual: PlayerId,
    },
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("Player {0} is already seated")]
    AlreadySeated(PlayerId),
    #[error("Table is full")]
    TableFull,
    #[error("Invalid buy-in {amount}, allowed 1..={max}")]
    InvalidBuyIn { amount: u32, max: u32 },
    #[error("Player name must not be empty")]
    InvalidName,
    #[error("Invalid card: {0:?}")]
    InvalidCard(String),
    #[error("Hand evaluation needs 5 to 7 cards, got {0}")]
    InvalidCardCount(usize),
    #[error("Cannot deal {requested} cards, {remaining} left in deck")]
    DeckUnderflow { requested: usize, remaining: usize },
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::PlayerNotFound(_) => ErrorKind::NotFound,
            GameError::InvalidCardCount(_) | GameError::DeckUnderflow { .. } => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}
