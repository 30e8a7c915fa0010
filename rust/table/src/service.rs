use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use holdem_engine::game::Table;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{self, TableConfig};
use crate::errors::TableError;
use crate::events::EventBus;
use crate::logging::init_logging;
use crate::orchestrator::Orchestrator;
use crate::store::{InMemoryStore, TableId, TableStore};
use crate::table::TableHandle;
use crate::turn_timer::TurnTimer;

type TaskHandle = JoinHandle<Result<(), TableError>>;

/// Owns the store, the event bus and the background tasks of every table
/// it created.
pub struct TableService {
    config: TableConfig,
    store: Arc<dyn TableStore>,
    events: EventBus,
    orchestrator: Arc<Orchestrator>,
    tasks: Mutex<HashMap<TableId, Vec<TaskHandle>>>,
}

impl std::fmt::Debug for TableService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableService")
            .field("config", &self.config)
            .field("tables", &self.active_tables())
            .finish()
    }
}

impl TableService {
    pub fn new(config: TableConfig) -> Result<Self, TableError> {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    /// Service configured from `HOLDEM_CONFIG` and `HOLDEM_*` variables.
    /// Also installs the global log subscriber, JSON when `log_json` is set,
    /// unless one is already in place.
    pub fn from_env() -> Result<Self, TableError> {
        let config = config::load()?;
        if let Err(err) = init_logging(config.log_json) {
            tracing::debug!(error = %err, "global subscriber already installed");
        }
        Self::new(config)
    }

    pub fn with_store(config: TableConfig, store: Arc<dyn TableStore>) -> Result<Self, TableError> {
        config.validate()?;
        let events = EventBus::new();
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&store),
            events.clone(),
            config.seed,
            config.commit_retries,
        ));
        Ok(Self {
            config,
            store,
            events,
            orchestrator,
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Creates an empty table. Inside a tokio runtime its orchestrator loop
    /// and turn timer are spawned right away; without one the caller drives
    /// the table through [`TableService::orchestrator`].
    pub fn create_table(&self) -> Result<TableId, TableError> {
        let id = Uuid::new_v4().to_string();
        self.store.create(&id, Table::new(self.config.stakes()))?;

        tracing::info!(
            table_id = %id,
            small_blind = self.config.small_blind,
            big_blind = self.config.big_blind,
            max_players = self.config.max_players,
            "table created"
        );

        if tokio::runtime::Handle::try_current().is_ok() {
            self.spawn_tasks(&id);
        } else {
            tracing::debug!(table_id = %id, "no runtime, background tasks not started");
        }
        Ok(id)
    }

    /// Handle for `player_id` at an existing table.
    pub fn handle(&self, table_id: &str, player_id: &str) -> Result<TableHandle, TableError> {
        self.store.load(table_id)?;
        Ok(TableHandle::new(
            table_id,
            player_id,
            Arc::clone(&self.store),
            self.events.clone(),
        ))
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn store(&self) -> Arc<dyn TableStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Tables that still have background tasks running.
    pub fn active_tables(&self) -> Vec<TableId> {
        match self.tasks.lock() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Stops the background tasks of `table_id`. The committed record stays
    /// readable. Returns false if nothing was running.
    pub fn close_table(&self, table_id: &str) -> bool {
        let handles = match self.tasks.lock() {
            Ok(mut guard) => guard.remove(table_id),
            Err(poisoned) => poisoned.into_inner().remove(table_id),
        };
        match handles {
            Some(handles) => {
                handles.iter().for_each(JoinHandle::abort);
                tracing::info!(table_id, "table closed");
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let all: Vec<(TableId, Vec<TaskHandle>)> = match self.tasks.lock() {
            Ok(mut guard) => guard.drain().collect(),
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        };
        for (table_id, handles) in all {
            handles.iter().for_each(JoinHandle::abort);
            tracing::debug!(table_id = %table_id, "background tasks aborted");
        }
    }

    fn spawn_tasks(&self, table_id: &str) {
        let mut handles = vec![tokio::spawn(
            Arc::clone(&self.orchestrator).run(table_id.to_string()),
        )];

        if let Some(timeout) = self.config.turn_timeout() {
            let timer = TurnTimer::new(Arc::clone(&self.store), self.events.clone(), timeout);
            handles.push(tokio::spawn(timer.run(table_id.to_string())));
        }

        match self.tasks.lock() {
            Ok(mut guard) => {
                guard.insert(table_id.to_string(), handles);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(table_id.to_string(), handles);
            }
        }
    }
}

impl Drop for TableService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
