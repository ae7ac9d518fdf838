use tracing::debug;

use crate::{dao::models::UserEntity, error::ServiceError, state::SharedState};

/// Store or refresh the caller's profile so match records can carry their
/// email.
pub async fn upsert_profile(
    state: &SharedState,
    user_id: &str,
    email: &str,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    store
        .upsert_user(UserEntity {
            id: user_id.to_owned(),
            email: email.to_owned(),
        })
        .await?;
    debug!(user_id, "profile upserted");
    Ok(())
}
