use crate::{dto::flashcards::FlashcardView, error::ServiceError, state::SharedState};

/// The whole stored deck.
pub async fn list_flashcards(state: &SharedState) -> Result<Vec<FlashcardView>, ServiceError> {
    let store = state.require_store().await?;
    let cards = store.list_flashcards().await?;
    Ok(cards.into_iter().map(FlashcardView::from).collect())
}
