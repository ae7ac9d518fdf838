//! Pure answer-progression logic, kept free of storage and transport so the
//! round semantics can be tested exhaustively.
//!
//! One submission produces a fully updated [`MatchEntity`] (version bumped by
//! one) plus flags describing what happened. The caller persists the entity
//! with a version-conditioned write and replays the whole computation when it
//! loses the race.

use std::time::SystemTime;

use thiserror::Error;

use crate::dao::models::{MatchEntity, MatchOutcomeEntity, MatchPlayerEntity, MatchStatus};

/// Why a submission was rejected without changing anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    /// The match already completed; scores are final.
    #[error("match already finished")]
    MatchFinished,
    /// The submitter is not one of the match players.
    #[error("user is not part of this match")]
    NotAParticipant,
    /// The question pointer is outside the deck.
    #[error("no active question (index {index} of {total})")]
    NoActiveQuestion {
        /// Question index the match currently points at.
        index: usize,
        /// Number of questions in the deck.
        total: usize,
    },
    /// The submitter already answered the question in play.
    #[error("answer already recorded for this question")]
    AlreadyAnswered,
}

/// What the round did as a result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundProgress {
    /// At least one other player still owes an answer for this question.
    Pending,
    /// Every player answered; play moved to the question at this index.
    Advanced {
        /// Index of the question now in play.
        next_question: usize,
    },
    /// Every player answered the final question; the match is over.
    Finished {
        /// Final result of the match.
        outcome: MatchOutcomeEntity,
    },
}

/// Result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// The match entity after the submission, version already bumped.
    pub updated: MatchEntity,
    /// Whether the submission matched the canonical answer.
    pub correct: bool,
    /// Round-level effect of the submission.
    pub round: RoundProgress,
}

/// Canonicalize an answer for comparison.
///
/// Lowercases, drops every character that is neither alphanumeric, an
/// underscore, nor whitespace, collapses whitespace runs to a single space,
/// and trims the ends. The result is stable under repeated application.
pub fn normalize_answer(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for c in lowered.chars() {
        if c.is_whitespace() {
            if !normalized.is_empty() {
                pending_space = true;
            }
        } else if c.is_alphanumeric() || c == '_' {
            if pending_space {
                normalized.push(' ');
                pending_space = false;
            }
            normalized.push(c);
        }
    }

    normalized
}

/// Apply one answer submission to a match snapshot.
///
/// Pure: the input entity is left untouched and the returned entity carries
/// every field the submission changed, including the bumped version and the
/// correct/wrong telemetry counters.
pub fn apply_answer(
    entity: &MatchEntity,
    user_id: &str,
    raw_answer: &str,
    now: SystemTime,
) -> Result<AnswerOutcome, AnswerError> {
    if entity.status == MatchStatus::Finished {
        return Err(AnswerError::MatchFinished);
    }
    if !entity.has_player(user_id) {
        return Err(AnswerError::NotAParticipant);
    }
    let Some(question) = entity.questions.get(entity.current_question) else {
        return Err(AnswerError::NoActiveQuestion {
            index: entity.current_question,
            total: entity.questions.len(),
        });
    };
    if entity.current_question_answers.contains_key(user_id) {
        return Err(AnswerError::AlreadyAnswered);
    }

    let correct = normalize_answer(&question.answer) == normalize_answer(raw_answer);

    let mut updated = entity.clone();
    if correct {
        *updated.scores.entry(user_id.to_owned()).or_insert(0) += 1;
        updated.correct_answers += 1;
    } else {
        updated.wrong_answers += 1;
    }
    updated
        .current_question_answers
        .insert(user_id.to_owned(), raw_answer.to_owned());

    let all_answered = updated
        .players
        .iter()
        .all(|player| updated.current_question_answers.contains_key(&player.id));

    let round = if all_answered {
        updated.current_question_answers.clear();
        let next_question = entity.current_question + 1;
        if next_question < entity.questions.len() {
            updated.current_question = next_question;
            RoundProgress::Advanced { next_question }
        } else {
            let outcome = decide_outcome(&updated.players, &updated.scores);
            updated.status = MatchStatus::Finished;
            updated.outcome = Some(outcome.clone());
            RoundProgress::Finished { outcome }
        }
    } else {
        RoundProgress::Pending
    };

    updated.last_updated = now;
    updated.version = entity.version + 1;

    Ok(AnswerOutcome {
        updated,
        correct,
        round,
    })
}

/// Pick the final result: the strictly greatest score wins, an exact tie is
/// a draw. Players missing from the score map count as zero.
pub fn decide_outcome(
    players: &[MatchPlayerEntity],
    scores: &indexmap::IndexMap<String, i32>,
) -> MatchOutcomeEntity {
    let mut best: Option<(&MatchPlayerEntity, i32)> = None;
    let mut tied = false;

    for player in players {
        let score = scores.get(&player.id).copied().unwrap_or(0);
        match best {
            None => best = Some((player, score)),
            Some((_, top)) if score > top => {
                best = Some((player, score));
                tied = false;
            }
            Some((_, top)) if score == top => tied = true,
            Some(_) => {}
        }
    }

    match best {
        Some((winner, _)) if !tied => MatchOutcomeEntity::Winner {
            player_id: winner.id.clone(),
            email: winner.email.clone(),
        },
        _ => MatchOutcomeEntity::Draw,
    }
}
