use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Question/answer pair drawn from the flashcard deck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashcardEntity {
    /// Question text shown to both players.
    pub question: String,
    /// Canonical answer the submissions are compared against.
    pub answer: String,
}

/// Participant of a match as stored in persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchPlayerEntity {
    /// Stable identifier handed out by the identity provider.
    pub id: String,
    /// Display email attached at match creation; empty when unknown.
    pub email: String,
}

/// Lifecycle state of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Players are still working through the question deck.
    Ongoing,
    /// The last round completed; scores are final.
    Finished,
}

/// Final result of a match, recorded once the status flips to finished.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcomeEntity {
    /// A single player holds the strictly greatest score.
    Winner {
        /// Identifier of the winning player.
        player_id: String,
        /// Display email of the winning player, empty when unknown.
        email: String,
    },
    /// Both players finished with the same score.
    Draw,
}

/// Aggregate match entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// The two paired players; the first entry is the one taken from the waiting pool.
    pub players: Vec<MatchPlayerEntity>,
    /// Scores keyed by player id.
    pub scores: IndexMap<String, i32>,
    /// Question deck fixed at creation time.
    pub questions: Vec<FlashcardEntity>,
    /// Zero-based index of the question currently in play.
    pub current_question: usize,
    /// Raw answers recorded for the current round only, keyed by player id.
    pub current_question_answers: IndexMap<String, String>,
    /// Lifecycle state.
    pub status: MatchStatus,
    /// Identifier of the player listed first (the one who waited).
    pub host_id: String,
    /// Final result, present once the match is finished.
    pub outcome: Option<MatchOutcomeEntity>,
    /// Running count of correct submissions across both players.
    pub correct_answers: i64,
    /// Running count of incorrect submissions across both players.
    pub wrong_answers: i64,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the match entity was updated.
    pub last_updated: SystemTime,
    /// Monotonic revision used for optimistic concurrency control.
    pub version: i64,
}

impl MatchEntity {
    /// Whether the given user is one of the match players.
    pub fn has_player(&self, user_id: &str) -> bool {
        self.players.iter().any(|player| player.id == user_id)
    }
}

/// A user queued up for pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaitingEntity {
    /// Identifier of the queued user.
    pub user_id: String,
    /// When the user joined the pool; drives FIFO pairing and eviction.
    pub joined_at: SystemTime,
}

/// Display profile stored for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier handed out by the identity provider.
    pub id: String,
    /// Email shown to opponents.
    pub email: String,
}
