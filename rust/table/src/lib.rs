//! # holdem-table: running Hold'em tables
//!
//! Wraps the pure [`holdem_engine`] reducer in everything a live table
//! needs: a versioned store with an ordered action queue, the orchestrator
//! that folds queued actions into committed state, an event bus for
//! receipts, a per-turn timer and a player-facing command surface.
//!
//! ## Modules
//!
//! - [`store`] - `TableStore` trait and the in-memory implementation
//! - [`orchestrator`] - Compare-and-swap application of queued actions
//! - [`events`] - Receipts and hand events, fanned out per table
//! - [`table`] - `TableHandle` commands and the `TableView` projection
//! - [`turn_timer`] - Default check/fold when a turn runs out
//! - [`service`] - Table creation and background task ownership
//! - [`config`] - `TableConfig` from defaults, TOML file and environment
//! - [`logging`] - `tracing` setup and log capture for tests
//! - [`errors`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use holdem_table::config::TableConfig;
//! use holdem_table::service::TableService;
//!
//! let service = TableService::new(TableConfig {
//!     seed: Some(1),
//!     ..TableConfig::default()
//! })
//! .unwrap();
//! let table_id = service.create_table().unwrap();
//! let ann = service.handle(&table_id, "ann").unwrap();
//! let bob = service.handle(&table_id, "bob").unwrap();
//! ann.join("Ann", 200).unwrap();
//! bob.join("Bob", 200).unwrap();
//! ann.start_game().unwrap();
//!
//! // No runtime here, so drain the queue by hand.
//! service.orchestrator().process_pending(&table_id).unwrap();
//! let view = ann.snapshot().unwrap();
//! assert_eq!(view.state.hand_number, 1);
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod table;
pub mod turn_timer;

pub use errors::{StoreError, TableError};
pub use service::TableService;
pub use table::{TableHandle, TableView};
