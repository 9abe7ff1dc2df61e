//! Table actor: the single writer for one table.
//!
//! Every request runs load → validate/mutate → save → broadcast to
//! completion before the next one is taken off the inbox, so two actions
//! on the same table never interleave.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep},
};

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    messages::{JoinOutcome, TableMessage},
};
use crate::{
    game::{Action, PlayerId, PlayerName, Table, TableName, TableView},
    session::{SessionError, SessionRegistry},
    store::TableStore,
    sync::Broadcaster,
};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_name: TableName,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_name: TableName) -> Self {
        Self { sender, table_name }
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table. A stopped actor hands the message back.
    pub async fn send(&self, message: TableMessage) -> Result<(), TableMessage> {
        self.sender.send(message).await.map_err(|e| e.0)
    }
}

/// Table actor owning all writes to one table record
pub struct TableActor {
    name: TableName,
    config: TableConfig,
    inbox: mpsc::Receiver<TableMessage>,
    store: Arc<dyn TableStore>,
    registry: Arc<SessionRegistry>,
    broadcaster: Broadcaster,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        name: TableName,
        config: TableConfig,
        store: Arc<dyn TableStore>,
        registry: Arc<SessionRegistry>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);
        let broadcaster = Broadcaster::new(registry.clone());
        let handle = TableHandle::new(sender, name.clone());
        let actor = Self {
            name,
            config,
            inbox,
            store,
            registry,
            broadcaster,
        };
        (actor, handle)
    }

    /// Run the table actor event loop until it has been idle for too long
    pub async fn run(mut self) {
        debug!("Table '{}' actor starting", self.name);
        let idle = sleep(self.config.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else { break };
                    self.handle_message(message).await;
                    idle.as_mut().reset(Instant::now() + self.config.idle_timeout);
                }

                () = &mut idle => {
                    // Refuse new work, then finish whatever already queued up.
                    self.inbox.close();
                    while let Ok(message) = self.inbox.try_recv() {
                        self.handle_message(message).await;
                    }
                    break;
                }
            }
        }

        debug!("Table '{}' actor stopped", self.name);
    }

    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join {
                player_name,
                response,
            } => {
                let result = self.handle_join(player_name).await;
                let _ = response.send(result);
            }

            TableMessage::Act {
                player_id,
                action,
                response,
            } => {
                let result = self.handle_action(player_id, action).await;
                let _ = response.send(result);
            }

            TableMessage::GetView { response } => {
                let result = self.get_view().await;
                let _ = response.send(result);
            }

            TableMessage::ForceLeave {
                player_id,
                response,
            } => {
                let result = self.handle_force_leave(player_id).await;
                let _ = response.send(result);
            }

            TableMessage::Rebroadcast { response } => {
                let result = self.rebroadcast().await;
                let _ = response.send(result);
            }
        }
    }

    async fn handle_join(&mut self, player_name: Option<PlayerName>) -> TableResult<JoinOutcome> {
        let stored = self.store.load(&self.name).await?;
        let stored_missing = stored.is_none();
        let mut table = stored.unwrap_or_else(|| Table::new(self.name.clone()));

        let mut changed = stored_missing;
        let player_id = match player_name {
            None => None,
            Some(name) => match table.find_player_by_name(&name) {
                Some(existing) => {
                    if self.registry.is_player_connected(&self.name, &existing.id).await {
                        return Err(SessionError::AlreadyConnected.into());
                    }
                    info!("Table '{}': {} rejoined", self.name, name);
                    Some(existing.id.clone())
                }
                None => {
                    let id = table.add_player(name.clone())?;
                    info!("Table '{}': {} joined", self.name, name);
                    changed = true;
                    Some(id)
                }
            },
        };

        if changed {
            self.store.save(&table).await?;
        }
        self.broadcaster.publish(&self.name, Some(&table)).await;

        Ok(JoinOutcome {
            table_name: self.name.clone(),
            player_id,
        })
    }

    async fn handle_action(&mut self, player_id: PlayerId, action: Action) -> TableResult<TableView> {
        let mut table = self
            .store
            .load(&self.name)
            .await?
            .ok_or(TableError::TableNotFound)?;

        let tag = action.tag();
        if let Err(e) = table.apply(&player_id, action) {
            debug!("Table '{}': {} rejected for {}: {}", self.name, tag, player_id, e);
            return Err(e.into());
        }

        self.store.save(&table).await?;
        let view = self.broadcaster.view(&self.name, Some(&table)).await;
        self.broadcaster.send_view(&self.name, &view).await;
        Ok(view)
    }

    async fn get_view(&self) -> TableResult<TableView> {
        let table = self.store.load(&self.name).await?;
        Ok(self.broadcaster.view(&self.name, table.as_ref()).await)
    }

    async fn handle_force_leave(&mut self, player_id: PlayerId) -> TableResult<bool> {
        let Some(mut table) = self.store.load(&self.name).await? else {
            return Ok(false);
        };
        match table.remove_player(&player_id) {
            Ok(player) => {
                warn!("Table '{}': removed inactive player {}", self.name, player.name);
            }
            Err(_) => return Ok(false),
        }

        self.store.save(&table).await?;
        self.broadcaster.publish(&self.name, Some(&table)).await;
        Ok(true)
    }

    async fn rebroadcast(&self) -> TableResult<()> {
        let table = self.store.load(&self.name).await?;
        self.broadcaster.publish(&self.name, table.as_ref()).await;
        Ok(())
    }
}
