use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body registering or refreshing the caller's profile.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertUserRequest {
    /// Email to show to opponents.
    #[validate(email)]
    pub email: String,
}

/// Acknowledgement of a profile upsert.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpsertUserResponse {
    pub success: bool,
}
