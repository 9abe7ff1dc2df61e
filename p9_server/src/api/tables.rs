//! Table API handlers.
//!
//! Lobby operations over plain HTTP. Every successful mutation is broadcast
//! to the table's live connections by the table actor, so these handlers
//! only report success or the reason for refusal.
//!
//! # Examples
//!
//! Join a table:
//! ```bash
//! curl -X POST http://localhost:6969/play9/join \
//!   -H "Content-Type: application/json" \
//!   -d '{"table_name": "sunday", "player_name": "alice"}'
//! ```
//!
//! Start the game:
//! ```bash
//! curl -X POST http://localhost:6969/play9/start \
//!   -H "Content-Type: application/json" \
//!   -d '{"table_name": "sunday", "player_id": "..."}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use play_nine::{
    Action, GameError, PlayerId, TableName, TableView,
    table::{JoinOutcome, TableError},
};
use serde::{Deserialize, Serialize};

use super::{AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct JoinTableRequest {
    pub table_name: String,
    /// Absent or blank joins as a viewer
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub table_name: String,
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RevealRequest {
    pub table_name: String,
    pub player_id: String,
    pub card_index: usize,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a table error onto a status code and a client-safe message.
pub fn error_response(err: &TableError) -> ApiError {
    let status = match err {
        TableError::InvalidName(_) => StatusCode::BAD_REQUEST,
        TableError::TableNotFound | TableError::Store(_) => StatusCode::NOT_FOUND,
        TableError::Game(GameError::NotAPlayer) => StatusCode::FORBIDDEN,
        TableError::Game(_) | TableError::Session(_) | TableError::PlayerIdRequired => {
            StatusCode::BAD_REQUEST
        }
        TableError::TableClosed => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        tracing::error!("Table request failed: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            detail: err.client_message(),
        }),
    )
}

fn parse_table_name(raw: &str) -> Result<TableName, ApiError> {
    TableName::parse(raw).map_err(|e| error_response(&TableError::InvalidName(e)))
}

/// Join a table as a player, or as a viewer with no name.
///
/// Creates the table if nobody has used the name before. Rejoining with the
/// name of a seated player returns that player's id, unless they are
/// connected right now.
///
/// # Response
///
/// Returns `200 OK` with:
/// ```json
/// { "table_name": "sunday", "player_id": "8d2c..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid names, table full, game in progress, or
///   the player is already connected
pub async fn join_table(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<JoinTableRequest>,
) -> Result<Json<JoinOutcome>, ApiError> {
    let outcome = state
        .table_manager
        .join(&request.table_name, request.player_name.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    tracing::info!(
        request_id = %request_id.as_str(),
        table = %outcome.table_name,
        viewer = outcome.player_id.is_none(),
        "Joined table"
    );
    Ok(Json(outcome))
}

async fn act(
    state: &AppState,
    table_name: &str,
    player_id: String,
    action: Action,
) -> Result<TableView, ApiError> {
    let name = parse_table_name(table_name)?;
    let kind = action.tag();
    let result = state
        .table_manager
        .act(&name, Some(PlayerId::from(player_id)), action)
        .await;
    metrics::actions_total(kind, result.is_ok());
    result.map_err(|e| {
        logging::log_rejected_action(name.as_str(), kind, &e.to_string());
        error_response(&e)
    })
}

/// Deal the first hole.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid table name, game already started, or too few players
/// - `403 Forbidden`: Caller is not seated at the table
/// - `404 Not Found`: Table doesn't exist
pub async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    act(&state, &request.table_name, request.player_id, Action::Start).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// Flip one of the two opening cards during the reveal phase.
pub async fn reveal_card(
    State(state): State<AppState>,
    Json(request): Json<RevealRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let action = Action::Reveal {
        card_index: request.card_index,
    };
    act(&state, &request.table_name, request.player_id, action).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// Give up a seat. The last player out leaves an empty table.
pub async fn leave_table(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    act(&state, &request.table_name, request.player_id, Action::Leave).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// Current public view of a table, with the ids of connected players.
///
/// Tables nobody has created report phase `empty`.
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> Result<Json<TableView>, ApiError> {
    let name = parse_table_name(&table_name)?;
    let view = state
        .table_manager
        .view(&name)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(view))
}
