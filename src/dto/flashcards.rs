use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::FlashcardEntity;

/// One question/answer pair as exposed over HTTP.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlashcardView {
    /// Question text shown to players.
    pub question: String,
    /// Canonical answer text.
    pub answer: String,
}

impl From<FlashcardEntity> for FlashcardView {
    fn from(entity: FlashcardEntity) -> Self {
        Self {
            question: entity.question,
            answer: entity.answer,
        }
    }
}

/// Response payload listing the full flashcard deck.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlashcardListResponse {
    pub flashcards: Vec<FlashcardView>,
}
