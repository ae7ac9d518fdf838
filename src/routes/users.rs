use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    auth::AuthedUser,
    dto::users::{UpsertUserRequest, UpsertUserResponse},
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Profile management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/users", post(upsert_user))
}

/// Store or refresh the caller's email for later match records.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    params(("Authorization" = String, Header, description = "Bearer credential checked against the identity service")),
    request_body = UpsertUserRequest,
    responses((status = 200, description = "Profile stored", body = UpsertUserResponse))
)]
pub async fn upsert_user(
    State(state): State<SharedState>,
    user: AuthedUser,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<Json<UpsertUserResponse>, AppError> {
    payload.validate()?;
    user_service::upsert_profile(&state, &user.id, &payload.email).await?;
    Ok(Json(UpsertUserResponse { success: true }))
}
