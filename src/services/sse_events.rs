use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, MatchOutcomeEntity},
    dto::events::{GameFinishedEvent, NewQuestionEvent, ServerEvent},
    state::SharedState,
};

const EVENT_NEW_QUESTION: &str = "new-question";
const EVENT_GAME_FINISHED: &str = "game-finished";

/// Broadcast the question a match moved on to.
pub fn broadcast_new_question(state: &SharedState, entity: &MatchEntity) {
    let Some(card) = entity.questions.get(entity.current_question) else {
        return;
    };
    let payload = NewQuestionEvent {
        question: card.clone().into(),
        question_number: entity.current_question + 1,
        total_questions: entity.questions.len(),
        current_question: entity.current_question,
    };
    send_match_event(state, entity.id, EVENT_NEW_QUESTION, &payload);
}

/// Broadcast the final result of a match.
///
/// The `email` field carries the winner's stored email (possibly empty) or
/// the literal `"Draw"`, which is what clients key their end screen on.
pub fn broadcast_game_finished(
    state: &SharedState,
    match_id: Uuid,
    outcome: &MatchOutcomeEntity,
    scores: &IndexMap<String, i32>,
) {
    let email = match outcome {
        MatchOutcomeEntity::Winner { email, .. } => email.clone(),
        MatchOutcomeEntity::Draw => "Draw".to_string(),
    };
    let payload = GameFinishedEvent {
        email,
        scores: scores.clone(),
    };
    send_match_event(state, match_id, EVENT_GAME_FINISHED, &payload);
}

fn send_match_event(state: &SharedState, match_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events().broadcast(match_id, event),
        Err(err) => warn!(event, %match_id, error = %err, "failed to serialize SSE payload"),
    }
}
