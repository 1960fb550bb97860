use rollbook_models::User;
use serde::Serialize;
use utoipa::ToSchema;

/// Result of matching an identity to a user record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub user: User,
    /// `true` when this call linked a pre-existing record by email.
    pub linked: bool,
}
