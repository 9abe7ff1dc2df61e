//! Table actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::errors::TableResult;
use crate::game::{Action, PlayerId, PlayerName, TableName, TableView};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Sit down as `player_name`, or just watch when `None`
    Join {
        player_name: Option<PlayerName>,
        response: oneshot::Sender<TableResult<JoinOutcome>>,
    },

    /// Player action; the resulting view is broadcast and returned
    Act {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<TableResult<TableView>>,
    },

    /// Read the current public view without changing anything
    GetView {
        response: oneshot::Sender<TableResult<TableView>>,
    },

    /// Remove a player who stopped showing up. Answers whether anyone was removed
    ForceLeave {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<bool>>,
    },

    /// Re-send the current view, e.g. after a presence change
    Rebroadcast {
        response: oneshot::Sender<TableResult<()>>,
    },
}

/// Reply to a join request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub table_name: TableName,
    /// Absent for viewers who joined without a name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}
