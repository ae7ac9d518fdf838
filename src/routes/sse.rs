use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/matches/{id}/events",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Identifier of the match to follow")),
    responses((status = 200, description = "Match event stream", content_type = "text/event-stream", body = String))
)]
/// Stream question changes and the final result of one match.
pub async fn match_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state, id);
    info!(match_id = %id, "new match SSE connection");
    sse_service::to_sse_stream(state, id, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{id}/events", get(match_stream))
}
