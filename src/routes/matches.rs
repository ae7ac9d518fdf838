use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthedUser,
    dto::matches::{
        CancelSearchResponse, HistoryQuery, MatchDetailResponse, MatchListResponse,
        MatchRequestResponse, OngoingMatchResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    },
    error::AppError,
    services::{answer_service, match_service, matchmaking_service},
    state::SharedState,
};

/// Matchmaking and match progression endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches",
            post(request_match).get(match_history).delete(cancel_search),
        )
        .route("/matches/ongoing", get(ongoing_match))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/answer", post(submit_answer))
}

/// Pair the caller with the longest-waiting opponent, or enqueue them.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer credential checked against the identity service")),
    responses(
        (status = 200, description = "Paired into a match or placed in the waiting pool", body = MatchRequestResponse)
    )
)]
pub async fn request_match(
    State(state): State<SharedState>,
    user: AuthedUser,
) -> Result<Json<MatchRequestResponse>, AppError> {
    Ok(Json(
        matchmaking_service::request_match(&state, &user.id).await?,
    ))
}

/// Return the match history of the user named in the query.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(("userId" = Option<String>, Query, description = "User whose matches to list")),
    responses(
        (status = 200, description = "Matches the user played in, newest first", body = MatchListResponse)
    )
)]
pub async fn match_history(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    let matches = match query.user_id {
        Some(user_id) => match_service::history_for(&state, &user_id).await?,
        None => Vec::new(),
    };
    Ok(Json(MatchListResponse { matches }))
}

/// Withdraw the caller from the waiting pool.
#[utoipa::path(
    delete,
    path = "/matches",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer credential checked against the identity service")),
    responses(
        (status = 200, description = "Number of waiting entries removed", body = CancelSearchResponse)
    )
)]
pub async fn cancel_search(
    State(state): State<SharedState>,
    user: AuthedUser,
) -> Result<Json<CancelSearchResponse>, AppError> {
    Ok(Json(
        matchmaking_service::cancel_search(&state, &user.id).await?,
    ))
}

/// The caller's ongoing match, or `null` when they have none.
#[utoipa::path(
    get,
    path = "/matches/ongoing",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer credential checked against the identity service")),
    responses(
        (status = 200, description = "Ongoing match of the caller, if any", body = OngoingMatchResponse)
    )
)]
pub async fn ongoing_match(
    State(state): State<SharedState>,
    user: AuthedUser,
) -> Result<Json<OngoingMatchResponse>, AppError> {
    let ongoing = match_service::ongoing_match_for(&state, &user.id).await?;
    Ok(Json(OngoingMatchResponse { ongoing }))
}

/// Fetch one match by its identifier.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Identifier of the match to retrieve")),
    responses(
        (status = 200, description = "Match details", body = MatchDetailResponse),
        (status = 404, description = "No match with that identifier")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetailResponse>, AppError> {
    let detail = match_service::get_match(&state, id).await?;
    Ok(Json(MatchDetailResponse { detail }))
}

/// Submit the caller's answer for the current question of a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/answer",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer credential checked against the identity service"),
    ("id" = Uuid, Path, description = "Identifier of the match being played")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SubmitAnswerResponse),
        (status = 409, description = "Already answered this round or the match is over")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    user: AuthedUser,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        answer_service::submit_answer(&state, id, &user.id, &payload.answer).await?,
    ))
}
