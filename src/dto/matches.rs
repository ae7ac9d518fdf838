use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{MatchEntity, MatchOutcomeEntity, MatchPlayerEntity, MatchStatus},
    dto::{flashcards::FlashcardView, format_system_time, validation::validate_answer_text},
};

/// Result of a pairing attempt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchRequestResponse {
    /// Nobody compatible was waiting; the caller joined the pool.
    #[serde(rename_all = "camelCase")]
    Waiting {
        /// How many other users are waiting right now.
        waiting_count: u64,
    },
    /// A partner was found (or a match was already running).
    #[serde(rename_all = "camelCase")]
    MatchCreated {
        /// Identifier of the match to play.
        match_id: Uuid,
    },
}

/// One participant of a match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchPlayerView {
    /// Player identifier.
    pub id: String,
    /// Email resolved at creation time, empty when unknown.
    pub email: String,
}

impl From<MatchPlayerEntity> for MatchPlayerView {
    fn from(entity: MatchPlayerEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
        }
    }
}

/// Lifecycle states of a match as serialized on the wire.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatusView {
    /// Players are still answering questions.
    Ongoing,
    /// All questions were answered and the outcome is final.
    Finished,
}

impl From<MatchStatus> for MatchStatusView {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Ongoing => Self::Ongoing,
            MatchStatus::Finished => Self::Finished,
        }
    }
}

/// Final result of a finished match.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcomeView {
    /// One player ended with a strictly higher score.
    #[serde(rename_all = "camelCase")]
    Winner {
        /// Identifier of the winning player.
        player_id: String,
        /// Email of the winning player, empty when unknown.
        email: String,
    },
    /// Both players ended with the same score.
    Draw,
}

impl From<MatchOutcomeEntity> for MatchOutcomeView {
    fn from(outcome: MatchOutcomeEntity) -> Self {
        match outcome {
            MatchOutcomeEntity::Winner { player_id, email } => Self::Winner { player_id, email },
            MatchOutcomeEntity::Draw => Self::Draw,
        }
    }
}

/// Full state of one match as exposed over HTTP.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    /// Match identifier.
    pub id: Uuid,
    /// The two participants in pairing order.
    pub players: Vec<MatchPlayerView>,
    /// Points per player identifier.
    #[schema(value_type = HashMap<String, i32>)]
    pub scores: IndexMap<String, i32>,
    /// Question deck played in order.
    pub questions: Vec<FlashcardView>,
    /// Zero-based index of the question in play.
    pub current_question: usize,
    /// Answers recorded so far for the question in play.
    #[schema(value_type = HashMap<String, String>)]
    pub current_question_answers: IndexMap<String, String>,
    /// Lifecycle state.
    pub status: MatchStatusView,
    /// Player whose pairing request created the match.
    pub host_id: String,
    /// Final result, present once the match finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MatchOutcomeView>,
    /// Correct submissions recorded across both players.
    pub correct_answers: i64,
    /// Incorrect submissions recorded across both players.
    pub wrong_answers: i64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last accepted update.
    pub last_updated: String,
}

impl From<MatchEntity> for MatchSnapshot {
    fn from(entity: MatchEntity) -> Self {
        Self {
            id: entity.id,
            players: entity.players.into_iter().map(Into::into).collect(),
            scores: entity.scores,
            questions: entity.questions.into_iter().map(Into::into).collect(),
            current_question: entity.current_question,
            current_question_answers: entity.current_question_answers,
            status: entity.status.into(),
            host_id: entity.host_id,
            outcome: entity.outcome.map(Into::into),
            correct_answers: entity.correct_answers,
            wrong_answers: entity.wrong_answers,
            created_at: format_system_time(entity.created_at),
            last_updated: format_system_time(entity.last_updated),
        }
    }
}

/// Response wrapping a single match lookup.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDetailResponse {
    /// The requested match.
    #[serde(rename = "match")]
    pub detail: MatchSnapshot,
}

/// Response for the ongoing-match lookup of the authenticated caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct OngoingMatchResponse {
    /// The ongoing match, or null when the caller is not playing.
    #[serde(rename = "match")]
    pub ongoing: Option<MatchSnapshot>,
}

/// Response listing matches.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSnapshot>,
}

/// Response after leaving the waiting pool.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelSearchResponse {
    /// Number of waiting entries removed (0 or 1).
    pub deleted_count: u64,
}

/// Query parameters accepted by the match history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Player whose matches should be listed.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Request body for submitting an answer to the question in play.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    /// Raw answer text; comparison ignores case, punctuation and spacing.
    pub answer: String,
}

impl Validate for SubmitAnswerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_answer_text(&self.answer) {
            errors.add("answer", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Receipt for one processed answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    /// Whether the submission was accepted and recorded.
    pub success: bool,
    /// Whether the answer matched the canonical one.
    pub correct: bool,
    /// Scores after the submission.
    #[schema(value_type = HashMap<String, i32>)]
    pub scores: IndexMap<String, i32>,
    /// Human-readable verdict.
    pub message: String,
}
