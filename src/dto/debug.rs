use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::WaitingEntity, dto::format_system_time};

/// One waiting-pool entry as exposed by the debug surface.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitingEntryView {
    /// User sitting in the pool.
    pub user_id: String,
    /// RFC 3339 timestamp of when the user joined.
    pub joined_at: String,
}

impl From<WaitingEntity> for WaitingEntryView {
    fn from(entity: WaitingEntity) -> Self {
        Self {
            user_id: entity.user_id,
            joined_at: format_system_time(entity.joined_at),
        }
    }
}

/// Response listing the current waiting pool.
#[derive(Debug, Serialize, ToSchema)]
pub struct WaitingListResponse {
    pub waiting: Vec<WaitingEntryView>,
}

/// Response after wiping the waiting pool.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearWaitingResponse {
    /// Number of waiting entries removed.
    pub deleted_count: u64,
}
