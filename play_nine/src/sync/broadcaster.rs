use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

use crate::{
    game::{Table, TableName, TableView},
    session::SessionRegistry,
};

/// Pushes a table's public view to every connection watching it.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The public view of `table`, annotated with who is connected.
    ///
    /// `None` (no record) gets the empty-table view.
    pub async fn view(&self, name: &TableName, table: Option<&Table>) -> TableView {
        let view = table.map_or_else(|| TableView::empty(name.clone()), TableView::from);
        view.with_active_players(self.registry.active_player_ids(name).await)
    }

    /// Send the current view to every connection of `name`.
    ///
    /// A full queue loses this one message; a closed queue gets its
    /// connection removed. Returns the number of connections reached.
    pub async fn publish(&self, name: &TableName, table: Option<&Table>) -> usize {
        let view = self.view(name, table).await;
        self.send_view(name, &view).await
    }

    /// Serialize `view` once and fan it out to every connection of `name`.
    pub async fn send_view(&self, name: &TableName, view: &TableView) -> usize {
        let payload: Arc<str> = match serde_json::to_string(view) {
            Ok(json) => json.into(),
            Err(e) => {
                error!("{name}: failed to serialize view: {e}");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, outbound) in self.registry.outbound(name).await {
            match outbound.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("{name}: connection {id} is backed up, dropping update");
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            debug!("{name}: pruning closed connection {id}");
            self.registry.disconnect(id, name).await;
        }
        delivered
    }
}
