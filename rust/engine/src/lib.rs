//! # holdem-engine: Texas Hold'em table logic
//!
//! Pure game logic for a multiplayer No-Limit Hold'em table: deck handling,
//! hand evaluation, the betting-round state machine and the action processor.
//! Nothing here does I/O or keeps global state; every transition goes
//! through [`engine::apply`], which maps a table snapshot plus one action to
//! the next snapshot.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and parsing
//! - [`deck`] - Fisher-Yates shuffling and dealing from the top
//! - [`hand`] - Best-five evaluation and hand comparison
//! - [`player`] - Player state and betting moves
//! - [`game`] - Table state, phases and seat rotation helpers
//! - [`rules`] - Betting validation and round settlement
//! - [`action`] - Queued actions
//! - [`engine`] - The action processor
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use holdem_engine::cards::parse_cards;
//! use holdem_engine::hand::{evaluate, Category};
//!
//! let hole = parse_cards("A♠ K♠").unwrap();
//! let board = parse_cards("Q♠ J♠ 10♠ 2♦ 3♣").unwrap();
//! let strength = evaluate(&hole, &board).unwrap();
//! assert_eq!(strength.category, Category::RoyalFlush);
//! ```
//!
//! ## Deterministic Shuffles
//!
//! ```rust
//! use holdem_engine::deck::Deck;
//!
//! let a = Deck::shuffled_with_seed(42);
//! let b = Deck::shuffled_with_seed(42);
//! assert_eq!(a, b);
//! ```

pub mod action;
pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod hand;
pub mod player;
pub mod rules;
