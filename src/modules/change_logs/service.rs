use rollbook_core::{AppError, PaginationMeta};
use rollbook_db::RegistryError;
use rollbook_models::NewChangeLog;
use rollbook_models::change_logs::{ChangeLogFilterParams, PaginatedChangeLogsResponse};
use tracing::{instrument, warn};

use crate::state::AppState;

pub struct ChangeLogService;

impl ChangeLogService {
    /// Appends an audit entry. A failed write is logged and otherwise
    /// ignored so it never undoes the change it describes.
    pub async fn record(state: &AppState, entry: NewChangeLog) {
        let action = entry.action;
        let entity_id = entry.entity_id;
        if let Err(e) = state.change_logs.record(entry).await {
            warn!(%action, %entity_id, error = %e, "Failed to write change log entry");
        }
    }

    #[instrument(skip(state))]
    pub async fn list(
        state: &AppState,
        filters: ChangeLogFilterParams,
    ) -> Result<PaginatedChangeLogsResponse, AppError> {
        let pagination = filters.pagination();

        let (data, total) = state
            .change_logs
            .list(filters.entity_id, pagination.limit(), pagination.offset())
            .await
            .map_err(RegistryError::into_app_error)?;

        Ok(PaginatedChangeLogsResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }
}
