use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        debug::{ClearWaitingResponse, WaitingListResponse},
        matches::MatchListResponse,
    },
    error::AppError,
    services::{match_service, matchmaking_service},
    state::SharedState,
};

/// Diagnostic endpoints, mounted only when enabled by configuration.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/debug/waiting", get(list_waiting).delete(clear_waiting))
        .route("/debug/matches", get(list_matches))
}

/// Inspect the current waiting pool.
#[utoipa::path(
    get,
    path = "/debug/waiting",
    tag = "debug",
    responses((status = 200, description = "Users currently waiting for an opponent", body = WaitingListResponse))
)]
pub async fn list_waiting(
    State(state): State<SharedState>,
) -> Result<Json<WaitingListResponse>, AppError> {
    let waiting = matchmaking_service::list_waiting_entries(&state).await?;
    Ok(Json(WaitingListResponse { waiting }))
}

/// Empty the waiting pool.
#[utoipa::path(
    delete,
    path = "/debug/waiting",
    tag = "debug",
    responses((status = 200, description = "Waiting pool cleared", body = ClearWaitingResponse))
)]
pub async fn clear_waiting(
    State(state): State<SharedState>,
) -> Result<Json<ClearWaitingResponse>, AppError> {
    Ok(Json(matchmaking_service::clear_waiting_pool(&state).await?))
}

/// List every stored match regardless of participants.
#[utoipa::path(
    get,
    path = "/debug/matches",
    tag = "debug",
    responses((status = 200, description = "Every stored match", body = MatchListResponse))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<MatchListResponse>, AppError> {
    let matches = match_service::list_all_matches(&state).await?;
    Ok(Json(MatchListResponse { matches }))
}
