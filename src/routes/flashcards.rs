use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::flashcards::FlashcardListResponse, error::AppError, services::flashcard_service,
    state::SharedState,
};

/// Read-only access to the flashcard deck.
pub fn router() -> Router<SharedState> {
    Router::new().route("/flashcards", get(list_flashcards))
}

/// List every flashcard in the deck.
#[utoipa::path(
    get,
    path = "/flashcards",
    tag = "flashcards",
    responses((status = 200, description = "All stored flashcards", body = FlashcardListResponse))
)]
pub async fn list_flashcards(
    State(state): State<SharedState>,
) -> Result<Json<FlashcardListResponse>, AppError> {
    let flashcards = flashcard_service::list_flashcards(&state).await?;
    Ok(Json(FlashcardListResponse { flashcards }))
}
