use log::{debug, info};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};
use tokio::sync::{Mutex, mpsc};

use super::{
    ConnectionId, Outbound,
    config::SessionConfig,
    errors::{SessionError, SessionResult},
};
use crate::game::{PlayerId, TableName};

#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    player_id: Option<PlayerId>,
    outbound: Outbound,
}

#[derive(Debug)]
struct Heartbeat {
    table: TableName,
    last_seen: Instant,
}

/// Who is connected to which table, and for how long they've been quiet.
///
/// Each map sits behind its own lock and no method holds two at once.
#[derive(Debug)]
pub struct SessionRegistry {
    config: SessionConfig,
    next_id: AtomicU64,
    connections: Mutex<HashMap<TableName, Vec<Connection>>>,
    heartbeats: Mutex<HashMap<ConnectionId, Heartbeat>>,
    /// When a player lost their last connection to a table.
    inactive: Mutex<HashMap<(TableName, PlayerId), Instant>>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
            heartbeats: Mutex::new(HashMap::new()),
            inactive: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an outbound channel sized for this registry.
    pub fn channel(&self) -> (Outbound, mpsc::Receiver<Arc<str>>) {
        mpsc::channel(self.config.outbound_buffer)
    }

    pub async fn is_player_connected(&self, table: &TableName, player_id: &PlayerId) -> bool {
        self.connections
            .lock()
            .await
            .get(table)
            .is_some_and(|conns| conns.iter().any(|c| c.player_id.as_ref() == Some(player_id)))
    }

    /// Register a live connection.
    ///
    /// A player may hold one connection per table; spectators (`None`) may
    /// hold any number.
    pub async fn connect(
        &self,
        table: &TableName,
        player_id: Option<PlayerId>,
        outbound: Outbound,
    ) -> SessionResult<ConnectionId> {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut connections = self.connections.lock().await;
            let conns = connections.entry(table.clone()).or_default();
            let taken = player_id
                .as_ref()
                .is_some_and(|pid| conns.iter().any(|c| c.player_id.as_ref() == Some(pid)));
            if taken {
                return Err(SessionError::AlreadyConnected);
            }
            conns.push(Connection {
                id,
                player_id: player_id.clone(),
                outbound,
            });
        }

        self.heartbeats.lock().await.insert(
            id,
            Heartbeat {
                table: table.clone(),
                last_seen: Instant::now(),
            },
        );
        if let Some(player_id) = player_id {
            self.inactive
                .lock()
                .await
                .remove(&(table.clone(), player_id));
        }
        debug!("{table}: connection {id} opened");
        Ok(id)
    }

    pub async fn record_heartbeat(&self, connection: ConnectionId) -> SessionResult<()> {
        self.record_heartbeat_at(connection, Instant::now()).await
    }

    pub async fn record_heartbeat_at(&self, connection: ConnectionId, now: Instant) -> SessionResult<()> {
        match self.heartbeats.lock().await.get_mut(&connection) {
            Some(heartbeat) => {
                heartbeat.last_seen = now;
                Ok(())
            }
            None => Err(SessionError::UnknownConnection(connection)),
        }
    }

    /// Forget a connection. Returns `false` if it was already gone.
    ///
    /// Dropping the connection drops its outbound sender, which ends the
    /// socket's writer once no broadcast still holds a clone.
    pub async fn disconnect(&self, connection: ConnectionId, table: &TableName) -> bool {
        self.disconnect_at(connection, table, Instant::now()).await
    }

    async fn disconnect_at(&self, connection: ConnectionId, table: &TableName, now: Instant) -> bool {
        let orphaned = {
            let mut connections = self.connections.lock().await;
            let Some(conns) = connections.get_mut(table) else {
                return false;
            };
            let Some(pos) = conns.iter().position(|c| c.id == connection) else {
                return false;
            };
            let removed = conns.remove(pos);
            let orphaned = removed
                .player_id
                .filter(|pid| !conns.iter().any(|c| c.player_id.as_ref() == Some(pid)));
            if conns.is_empty() {
                connections.remove(table);
            }
            orphaned
        };

        self.heartbeats.lock().await.remove(&connection);
        if let Some(player_id) = orphaned {
            debug!("{table}: {player_id} has no connections left");
            self.inactive
                .lock()
                .await
                .insert((table.clone(), player_id), now);
        }
        debug!("{table}: connection {connection} closed");
        true
    }

    /// Drop every connection that has missed its heartbeat window.
    ///
    /// Returns the tables that lost a connection.
    pub async fn sweep_stale_connections(&self) -> BTreeSet<TableName> {
        self.sweep_stale_connections_at(Instant::now()).await
    }

    pub async fn sweep_stale_connections_at(&self, now: Instant) -> BTreeSet<TableName> {
        let timeout = self.config.stale_connection_timeout;
        let stale: Vec<(ConnectionId, TableName)> = self
            .heartbeats
            .lock()
            .await
            .iter()
            .filter(|(_, hb)| now.saturating_duration_since(hb.last_seen) > timeout)
            .map(|(id, hb)| (*id, hb.table.clone()))
            .collect();

        let mut affected = BTreeSet::new();
        for (id, table) in stale {
            if self.disconnect_at(id, &table, now).await {
                info!("{table}: dropped stale connection {id}");
                affected.insert(table);
            }
        }
        affected
    }

    /// Players whose inactivity timer has run out and who still have no connection.
    pub async fn sweep_inactive_players(&self) -> Vec<(TableName, PlayerId)> {
        self.sweep_inactive_players_at(Instant::now()).await
    }

    pub async fn sweep_inactive_players_at(&self, now: Instant) -> Vec<(TableName, PlayerId)> {
        let timeout = self.config.inactive_player_timeout;
        let expired: Vec<(TableName, PlayerId)> = self
            .inactive
            .lock()
            .await
            .iter()
            .filter(|(_, since)| now.saturating_duration_since(**since) > timeout)
            .map(|(key, _)| key.clone())
            .collect();

        let mut gone = Vec::with_capacity(expired.len());
        for (table, player_id) in expired {
            if !self.is_player_connected(&table, &player_id).await {
                gone.push((table, player_id));
            }
        }
        gone
    }

    pub async fn clear_inactive(&self, table: &TableName, player_id: &PlayerId) {
        self.inactive
            .lock()
            .await
            .remove(&(table.clone(), player_id.clone()));
    }

    pub async fn active_player_ids(&self, table: &TableName) -> BTreeSet<PlayerId> {
        self.connections
            .lock()
            .await
            .get(table)
            .map(|conns| conns.iter().filter_map(|c| c.player_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of a table's outbound channels.
    pub async fn outbound(&self, table: &TableName) -> Vec<(ConnectionId, Outbound)> {
        self.connections
            .lock()
            .await
            .get(table)
            .map(|conns| conns.iter().map(|c| (c.id, c.outbound.clone())).collect())
            .unwrap_or_default()
    }

    pub async fn connection_count(&self, table: &TableName) -> usize {
        self.connections
            .lock()
            .await
            .get(table)
            .map_or(0, Vec::len)
    }
}
