use std::{sync::Arc, time::SystemTime};

use indexmap::IndexMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        match_store::DuelStore,
        models::{FlashcardEntity, MatchEntity, MatchPlayerEntity, MatchStatus, WaitingEntity},
    },
    dto::{
        debug::{ClearWaitingResponse, WaitingEntryView},
        matches::{CancelSearchResponse, MatchRequestResponse},
    },
    error::ServiceError,
    state::SharedState,
};

/// Pair the caller with the oldest compatible waiting user, or enqueue them.
///
/// A caller who already has an ongoing match is pointed back at it, so
/// retried requests cannot strand a player in the pool mid-game.
pub async fn request_match(
    state: &SharedState,
    user_id: &str,
) -> Result<MatchRequestResponse, ServiceError> {
    let store = state.require_store().await?;

    if let Some(ongoing) = store.find_ongoing_match_for(user_id.to_owned()).await? {
        return Ok(MatchRequestResponse::MatchCreated {
            match_id: ongoing.id,
        });
    }

    let now = SystemTime::now();
    let cutoff = now
        .checked_sub(state.config().max_waiting_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let evicted = store.evict_stale_waiting(cutoff).await?;
    if evicted > 0 {
        info!(evicted, "dropped stale waiting entries");
    }

    match store.take_oldest_waiting_except(user_id.to_owned()).await? {
        Some(partner) => {
            let entity = create_match(state, &store, user_id, partner, now).await?;
            // The caller may still sit in the pool from an earlier request.
            // A failure here only leaves an entry the next sweep evicts.
            if let Err(err) = store.leave_waiting(user_id.to_owned()).await {
                warn!(error = %err, user_id, "failed to drop the caller's waiting entry");
            }
            Ok(MatchRequestResponse::MatchCreated {
                match_id: entity.id,
            })
        }
        None => {
            store.join_waiting(user_id.to_owned(), now).await?;
            let waiting_count = store.count_waiting_except(user_id.to_owned()).await?;
            Ok(MatchRequestResponse::Waiting { waiting_count })
        }
    }
}

/// Remove the caller from the waiting pool.
pub async fn cancel_search(
    state: &SharedState,
    user_id: &str,
) -> Result<CancelSearchResponse, ServiceError> {
    let store = state.require_store().await?;
    let deleted_count = store.leave_waiting(user_id.to_owned()).await?;
    Ok(CancelSearchResponse { deleted_count })
}

/// List the waiting pool for the debug surface.
pub async fn list_waiting_entries(
    state: &SharedState,
) -> Result<Vec<WaitingEntryView>, ServiceError> {
    let store = state.require_store().await?;
    let entries = store.list_waiting().await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

/// Wipe the waiting pool, reporting how many entries were dropped.
pub async fn clear_waiting_pool(state: &SharedState) -> Result<ClearWaitingResponse, ServiceError> {
    let store = state.require_store().await?;
    let deleted_count = store.clear_waiting().await?;
    Ok(ClearWaitingResponse { deleted_count })
}

async fn create_match(
    state: &SharedState,
    store: &Arc<dyn DuelStore>,
    caller_id: &str,
    partner: WaitingEntity,
    now: SystemTime,
) -> Result<MatchEntity, ServiceError> {
    let questions = store
        .sample_flashcards(state.config().questions_per_match)
        .await?;
    if questions.is_empty() {
        // Give the partner their queue slot back, keeping the original
        // join time so they stay first in line.
        if let Err(err) = store
            .join_waiting(partner.user_id.clone(), partner.joined_at)
            .await
        {
            warn!(error = %err, user_id = %partner.user_id, "failed to re-enqueue the partner");
        }
        return Err(ServiceError::InvalidState("flashcard deck is empty".into()));
    }

    let (partner_email, caller_email) = resolve_emails(store, &partner.user_id, caller_id).await;
    let entity = build_match(
        &partner.user_id,
        partner_email,
        caller_id,
        caller_email,
        questions,
        now,
    );
    store.insert_match(entity.clone()).await?;
    info!(match_id = %entity.id, host = %entity.host_id, guest = caller_id, "match created");
    Ok(entity)
}

/// Look up stored profile emails for both players. Missing profiles or a
/// lookup failure leave the emails empty rather than failing the pairing.
async fn resolve_emails(
    store: &Arc<dyn DuelStore>,
    partner_id: &str,
    caller_id: &str,
) -> (String, String) {
    match store
        .find_users(vec![partner_id.to_owned(), caller_id.to_owned()])
        .await
    {
        Ok(users) => {
            let email_of = |id: &str| {
                users
                    .iter()
                    .find(|user| user.id == id)
                    .map(|user| user.email.clone())
                    .unwrap_or_default()
            };
            (email_of(partner_id), email_of(caller_id))
        }
        Err(err) => {
            warn!(error = %err, "failed to resolve player emails");
            (String::new(), String::new())
        }
    }
}

/// Assemble a fresh match. The partner waited longest and becomes the host
/// and first player.
fn build_match(
    partner_id: &str,
    partner_email: String,
    caller_id: &str,
    caller_email: String,
    questions: Vec<FlashcardEntity>,
    now: SystemTime,
) -> MatchEntity {
    MatchEntity {
        id: Uuid::new_v4(),
        players: vec![
            MatchPlayerEntity {
                id: partner_id.to_owned(),
                email: partner_email,
            },
            MatchPlayerEntity {
                id: caller_id.to_owned(),
                email: caller_email,
            },
        ],
        scores: IndexMap::from([(partner_id.to_owned(), 0), (caller_id.to_owned(), 0)]),
        questions,
        current_question: 0,
        current_question_answers: IndexMap::new(),
        status: MatchStatus::Ongoing,
        host_id: partner_id.to_owned(),
        outcome: None,
        correct_answers: 0,
        wrong_answers: 0,
        created_at: now,
        last_updated: now,
        version: 0,
    }
}
