use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::match_store::UpdateOutcome,
    dto::matches::SubmitAnswerResponse,
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        match_machine::{self, AnswerOutcome, RoundProgress},
    },
};

const CORRECT_MESSAGE: &str = "Correct answer!";
const INCORRECT_MESSAGE: &str = "Incorrect answer";

/// Record one answer submission, advancing the match when the round closes.
///
/// Runs a read-compute-replace cycle: the whole computation is replayed
/// whenever a concurrent submission wins the version race, and events go
/// out only after the write stuck.
pub async fn submit_answer(
    state: &SharedState,
    match_id: Uuid,
    user_id: &str,
    answer: &str,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let store = state.require_store().await?;

    for attempt in 0..state.config().update_retry_budget {
        let Some(entity) = store.find_match(match_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "match `{match_id}` not found"
            )));
        };

        let AnswerOutcome {
            updated,
            correct,
            round,
        } = match_machine::apply_answer(&entity, user_id, answer, SystemTime::now())?;

        match store
            .update_progress(entity.version, updated.clone())
            .await?
        {
            UpdateOutcome::Applied => {
                match &round {
                    RoundProgress::Pending => {}
                    RoundProgress::Advanced { .. } => {
                        sse_events::broadcast_new_question(state, &updated);
                    }
                    RoundProgress::Finished { outcome } => {
                        info!(%match_id, outcome = ?outcome, "match finished");
                        sse_events::broadcast_game_finished(
                            state,
                            match_id,
                            outcome,
                            &updated.scores,
                        );
                    }
                }

                let message = if correct {
                    CORRECT_MESSAGE
                } else {
                    INCORRECT_MESSAGE
                };
                return Ok(SubmitAnswerResponse {
                    success: true,
                    correct,
                    scores: updated.scores,
                    message: message.to_string(),
                });
            }
            UpdateOutcome::Conflict => {
                debug!(%match_id, attempt, "concurrent update won the version race; retrying");
            }
        }
    }

    Err(ServiceError::Contention)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use indexmap::IndexMap;
    use serde_json::Value;
    use tokio::time::timeout;

    use super::*;
    use crate::{
        auth::tests::StaticIdentityResolver,
        config::AppConfig,
        dao::{
            match_store::{DuelStore, tests::MemoryDuelStore},
            models::{
                FlashcardEntity, MatchEntity, MatchOutcomeEntity, MatchPlayerEntity, MatchStatus,
            },
        },
        dto::events::ServerEvent,
        state::AppState,
    };

    fn card(question: &str, answer: &str) -> FlashcardEntity {
        FlashcardEntity {
            question: question.into(),
            answer: answer.into(),
        }
    }

    fn two_player_match(questions: Vec<FlashcardEntity>) -> MatchEntity {
        let now = SystemTime::now();
        MatchEntity {
            id: Uuid::new_v4(),
            players: vec![
                MatchPlayerEntity {
                    id: "alice".into(),
                    email: "alice@example.com".into(),
                },
                MatchPlayerEntity {
                    id: "bob".into(),
                    email: String::new(),
                },
            ],
            scores: IndexMap::from([("alice".to_string(), 0), ("bob".to_string(), 0)]),
            questions,
            current_question: 0,
            current_question_answers: IndexMap::new(),
            status: MatchStatus::Ongoing,
            host_id: "alice".into(),
            outcome: None,
            correct_answers: 0,
            wrong_answers: 0,
            created_at: now,
            last_updated: now,
            version: 0,
        }
    }

    async fn state_with(store: MemoryDuelStore) -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(StaticIdentityResolver::default()),
        );
        state.set_store(Arc::new(store)).await;
        state
    }

    async fn next_event(
        receiver: &mut tokio::sync::broadcast::Receiver<ServerEvent>,
    ) -> ServerEvent {
        timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn correct_answer_is_scored_and_acknowledged() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("Capital of France?", "Paris"), card("q2", "a2")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;

        let response = submit_answer(&state, match_id, "alice", " PARIS! ")
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.correct);
        assert_eq!(response.message, "Correct answer!");
        assert_eq!(response.scores["alice"], 1);
        assert_eq!(response.scores["bob"], 0);

        let stored = store.match_by_id(match_id).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.correct_answers, 1);
        assert_eq!(stored.current_question, 0);
    }

    #[tokio::test]
    async fn incorrect_answer_is_acknowledged_without_scoring() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("Capital of France?", "Paris"), card("q2", "a2")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;

        let response = submit_answer(&state, match_id, "bob", "London").await.unwrap();

        assert!(response.success);
        assert!(!response.correct);
        assert_eq!(response.message, "Incorrect answer");
        assert_eq!(response.scores["bob"], 0);
        assert_eq!(store.match_by_id(match_id).unwrap().wrong_answers, 1);
    }

    #[tokio::test]
    async fn completed_round_broadcasts_the_next_question() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![
            card("Capital of France?", "Paris"),
            card("Largest planet?", "Jupiter"),
        ]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;
        let mut events = state.events().subscribe(match_id);

        submit_answer(&state, match_id, "alice", "Paris").await.unwrap();
        submit_answer(&state, match_id, "bob", "Rome").await.unwrap();

        let event = next_event(&mut events).await;
        assert_eq!(event.event.as_deref(), Some("new-question"));
        let payload: Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["question"]["question"], "Largest planet?");
        assert_eq!(payload["questionNumber"], 2);
        assert_eq!(payload["totalQuestions"], 2);
        assert_eq!(payload["currentQuestion"], 1);

        let stored = store.match_by_id(match_id).unwrap();
        assert_eq!(stored.current_question, 1);
        assert!(stored.current_question_answers.is_empty());
    }

    #[tokio::test]
    async fn finishing_broadcasts_the_result_with_the_winner_email() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("5 + 7?", "12")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;
        let mut events = state.events().subscribe(match_id);

        submit_answer(&state, match_id, "alice", "12").await.unwrap();
        submit_answer(&state, match_id, "bob", "eleven").await.unwrap();

        let event = next_event(&mut events).await;
        assert_eq!(event.event.as_deref(), Some("game-finished"));
        let payload: Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["email"], "alice@example.com");
        assert_eq!(payload["scores"]["alice"], 1);
        assert_eq!(payload["scores"]["bob"], 0);

        let stored = store.match_by_id(match_id).unwrap();
        assert_eq!(stored.status, MatchStatus::Finished);
        assert_eq!(
            stored.outcome,
            Some(MatchOutcomeEntity::Winner {
                player_id: "alice".into(),
                email: "alice@example.com".into(),
            })
        );
    }

    #[tokio::test]
    async fn level_scores_finish_as_a_draw() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("5 + 7?", "12")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;
        let mut events = state.events().subscribe(match_id);

        submit_answer(&state, match_id, "alice", "12").await.unwrap();
        submit_answer(&state, match_id, "bob", "12").await.unwrap();

        let event = next_event(&mut events).await;
        let payload: Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["email"], "Draw");
        assert_eq!(
            store.match_by_id(match_id).unwrap().outcome,
            Some(MatchOutcomeEntity::Draw)
        );
    }

    #[tokio::test]
    async fn duplicate_submission_in_a_round_is_refused() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("5 + 7?", "12"), card("q2", "a2")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;

        submit_answer(&state, match_id, "alice", "12").await.unwrap();
        let error = submit_answer(&state, match_id, "alice", "12").await;

        assert!(matches!(error, Err(ServiceError::InvalidState(_))));
        // The refused attempt must not have touched the stored match.
        assert_eq!(store.match_by_id(match_id).unwrap().version, 1);
    }

    #[tokio::test]
    async fn outsiders_cannot_submit() {
        let store = MemoryDuelStore::new();
        let entity = two_player_match(vec![card("5 + 7?", "12")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store).await;

        let error = submit_answer(&state, match_id, "mallory", "12").await;

        assert!(matches!(error, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn finished_match_refuses_submissions() {
        let store = MemoryDuelStore::new();
        let mut entity = two_player_match(vec![card("5 + 7?", "12")]);
        entity.status = MatchStatus::Finished;
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store).await;

        let error = submit_answer(&state, match_id, "alice", "12").await;

        assert!(matches!(error, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let store = MemoryDuelStore::new();
        let state = state_with(store).await;

        let error = submit_answer(&state, Uuid::new_v4(), "alice", "12").await;

        assert!(matches!(error, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn version_conflict_is_retried_and_succeeds() {
        let store = MemoryDuelStore::new().with_injected_conflicts(1);
        let entity = two_player_match(vec![card("5 + 7?", "12"), card("q2", "a2")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;

        let response = submit_answer(&state, match_id, "alice", "12").await.unwrap();

        assert!(response.correct);
        // One applied write despite the conflicted first attempt.
        assert_eq!(store.match_by_id(match_id).unwrap().version, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_contention() {
        let budget = AppConfig::default().update_retry_budget;
        let store = MemoryDuelStore::new().with_injected_conflicts(budget);
        let entity = two_player_match(vec![card("5 + 7?", "12")]);
        let match_id = entity.id;
        store.insert_match(entity).await.unwrap();
        let state = state_with(store.clone()).await;
        let mut events = state.events().subscribe(match_id);

        let error = submit_answer(&state, match_id, "alice", "12").await;

        assert!(matches!(error, Err(ServiceError::Contention)));
        // Nothing was written and nothing was announced.
        assert_eq!(store.match_by_id(match_id).unwrap().version, 0);
        assert!(events.try_recv().is_err());
    }
}
