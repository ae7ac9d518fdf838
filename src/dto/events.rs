use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::flashcards::FlashcardView;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when the match moved on to another question.
pub struct NewQuestionEvent {
    /// The card now in play.
    pub question: FlashcardView,
    /// One-based number of the question, for display.
    pub question_number: usize,
    /// Total number of questions in the deck.
    pub total_questions: usize,
    /// Zero-based index of the question now in play.
    pub current_question: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once after the final answer of a match was recorded.
pub struct GameFinishedEvent {
    /// Email of the winner, or `"Draw"` when scores were level.
    pub email: String,
    /// Final scores per player identifier.
    #[schema(value_type = HashMap<String, i32>)]
    pub scores: IndexMap<String, i32>,
}
