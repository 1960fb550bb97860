use rollbook_models::StudentCode;
use serde::Serialize;
use utoipa::ToSchema;

/// The code the next registered student would receive.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextCodeResponse {
    pub student_code: StudentCode,
}
