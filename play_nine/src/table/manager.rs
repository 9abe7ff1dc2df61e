//! Table manager for spawning and routing to table actors.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{RwLock, oneshot},
    task::JoinHandle,
};

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    errors::{TableError, TableResult},
    messages::{JoinOutcome, TableMessage},
};
use crate::{
    game::{Action, PlayerId, PlayerName, TableName, TableView},
    session::SessionRegistry,
    store::TableStore,
};

/// An actor's handle together with its task.
struct RunningTable {
    handle: TableHandle,
    task: JoinHandle<()>,
}

impl RunningTable {
    /// Stopped and done with any work it drained on the way out.
    fn is_finished(&self) -> bool {
        self.handle.is_closed() && self.task.is_finished()
    }
}

/// Table manager routing requests to one actor per table name
///
/// Actors are spawned on first use and stop by themselves once idle; the
/// next request for that table spawns a fresh one. A fresh actor does not
/// touch the table until its predecessor has finished draining, so there is
/// never more than one writer per table.
pub struct TableManager {
    /// Where table records live
    store: Arc<dyn TableStore>,

    /// Shared connection registry
    registry: Arc<SessionRegistry>,

    /// Actor configuration
    config: TableConfig,

    /// Actors by table, including stopped ones still draining
    tables: Arc<RwLock<HashMap<TableName, RunningTable>>>,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(store: Arc<dyn TableStore>, registry: Arc<SessionRegistry>, config: TableConfig) -> Self {
        Self {
            store,
            registry,
            config,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Join a table by name, creating it if needed. `None` joins as a viewer.
    pub async fn join(&self, table_name: &str, player_name: Option<&str>) -> TableResult<JoinOutcome> {
        let name = TableName::parse(table_name)?;
        let player_name = player_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(PlayerName::parse)
            .transpose()?;
        self.request(&name, |response| TableMessage::Join {
            player_name,
            response,
        })
        .await
    }

    /// Apply a player action and return the view that was broadcast
    pub async fn act(
        &self,
        name: &TableName,
        player_id: Option<PlayerId>,
        action: Action,
    ) -> TableResult<TableView> {
        let player_id = player_id.ok_or(TableError::PlayerIdRequired)?;
        self.request(name, |response| TableMessage::Act {
            player_id,
            action,
            response,
        })
        .await
    }

    /// Current public view with active player ids
    pub async fn view(&self, name: &TableName) -> TableResult<TableView> {
        self.request(name, |response| TableMessage::GetView { response })
            .await
    }

    /// Remove a player on behalf of the server. `Ok(false)` if they weren't seated.
    pub async fn force_leave(&self, name: &TableName, player_id: PlayerId) -> TableResult<bool> {
        self.request(name, |response| TableMessage::ForceLeave {
            player_id,
            response,
        })
        .await
    }

    /// Re-send the current view to everyone watching
    pub async fn rebroadcast(&self, name: &TableName) -> TableResult<()> {
        self.request(name, |response| TableMessage::Rebroadcast { response })
            .await
    }

    /// Number of actors currently running. Forgets actors that have finished.
    pub async fn active_table_count(&self) -> usize {
        let mut tables = self.tables.write().await;
        tables.retain(|_, running| !running.is_finished());
        tables
            .values()
            .filter(|running| !running.handle.is_closed())
            .count()
    }

    /// Send a request to the table's actor and wait for the answer.
    ///
    /// If the actor stopped in the meantime the message comes back and goes
    /// to its successor instead.
    async fn request<T>(
        &self,
        name: &TableName,
        make: impl FnOnce(oneshot::Sender<TableResult<T>>) -> TableMessage,
    ) -> TableResult<T> {
        let (tx, rx) = oneshot::channel();
        let mut message = make(tx);

        for _ in 0..2 {
            let handle = self.handle(name).await;
            match handle.send(message).await {
                Ok(()) => return rx.await.unwrap_or(Err(TableError::TableClosed)),
                Err(returned) => {
                    debug!("Table '{name}' actor stopped, respawning");
                    message = returned;
                }
            }
        }

        Err(TableError::TableClosed)
    }

    /// Handle of a running actor for `name`, spawning one if needed
    async fn handle(&self, name: &TableName) -> TableHandle {
        {
            let tables = self.tables.read().await;
            if let Some(running) = tables.get(name).filter(|r| !r.handle.is_closed()) {
                return running.handle.clone();
            }
        }

        let mut tables = self.tables.write().await;
        if let Some(running) = tables.get(name).filter(|r| !r.handle.is_closed()) {
            return running.handle.clone();
        }
        let predecessor = tables.remove(name).map(|running| running.task);
        tables.retain(|_, running| !running.is_finished());

        let (actor, handle) = TableActor::new(
            name.clone(),
            self.config,
            self.store.clone(),
            self.registry.clone(),
        );
        let task = tokio::spawn(async move {
            if let Some(previous) = predecessor {
                // Requests queue up in the new inbox meanwhile.
                let _ = previous.await;
            }
            actor.run().await;
        });
        tables.insert(
            name.clone(),
            RunningTable {
                handle: handle.clone(),
                task,
            },
        );
        info!("Spawned actor for table '{name}'");
        handle
    }
}
