use uuid::Uuid;

use crate::{dto::matches::MatchSnapshot, error::ServiceError, state::SharedState};

/// Fetch one match by identifier.
pub async fn get_match(state: &SharedState, match_id: Uuid) -> Result<MatchSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let Some(entity) = store.find_match(match_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    };
    Ok(entity.into())
}

/// The caller's ongoing match, if they are in one.
pub async fn ongoing_match_for(
    state: &SharedState,
    user_id: &str,
) -> Result<Option<MatchSnapshot>, ServiceError> {
    let store = state.require_store().await?;
    let entity = store.find_ongoing_match_for(user_id.to_owned()).await?;
    Ok(entity.map(MatchSnapshot::from))
}

/// Every match the user played in, newest first.
pub async fn history_for(
    state: &SharedState,
    user_id: &str,
) -> Result<Vec<MatchSnapshot>, ServiceError> {
    let store = state.require_store().await?;
    let entities = store.list_matches_for(user_id.to_owned()).await?;
    Ok(entities.into_iter().map(MatchSnapshot::from).collect())
}

/// Every stored match, for the diagnostic listing.
pub async fn list_all_matches(state: &SharedState) -> Result<Vec<MatchSnapshot>, ServiceError> {
    let store = state.require_store().await?;
    let entities = store.list_matches().await?;
    Ok(entities.into_iter().map(MatchSnapshot::from).collect())
}
