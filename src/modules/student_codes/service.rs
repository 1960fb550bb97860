use anyhow::anyhow;
use rollbook_core::AppError;
use rollbook_db::{RegistryError, UniqueField, apply_reassignments};
use rollbook_models::{
    ChangeAction, GapReport, NewChangeLog, ReassignmentReport, UserId, allocate_next, find_gaps,
    reassign_all,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::metrics::{track_student_code_conflict, track_student_codes_reassigned};
use crate::modules::change_logs::service::ChangeLogService;
use crate::modules::student_codes::model::NextCodeResponse;
use crate::state::AppState;

/// Maps a registry error from a code-allocating write, counting lost races.
pub(crate) fn allocation_error(err: RegistryError) -> AppError {
    if err.is_conflict_on(UniqueField::StudentCode) {
        track_student_code_conflict();
        warn!("Student code allocation lost to a concurrent registration");
        return AppError::conflict(anyhow!(
            "Student code was taken by a concurrent registration, please retry"
        ));
    }
    err.into_app_error()
}

pub struct StudentCodeService;

impl StudentCodeService {
    /// Previews the next allocation without writing anything.
    #[instrument(skip(state))]
    pub async fn next_code(state: &AppState) -> Result<NextCodeResponse, AppError> {
        let codes = state
            .users
            .student_codes()
            .await
            .map_err(RegistryError::into_app_error)?;

        Ok(NextCodeResponse {
            student_code: allocate_next(&codes),
        })
    }

    #[instrument(skip(state))]
    pub async fn gaps(state: &AppState) -> Result<GapReport, AppError> {
        let codes = state
            .users
            .student_codes()
            .await
            .map_err(RegistryError::into_app_error)?;

        Ok(find_gaps(&codes))
    }

    /// Renumbers every student gaplessly in registration order.
    #[instrument(skip(state))]
    pub async fn reassign(
        state: &AppState,
        actor_id: Option<UserId>,
    ) -> Result<ReassignmentReport, AppError> {
        let students = state
            .users
            .students_by_creation()
            .await
            .map_err(RegistryError::into_app_error)?;

        let plan = reassign_all(&students);
        let report = apply_reassignments(state.users.as_ref(), &plan).await;

        for entry in &report.updated {
            ChangeLogService::record(
                state,
                NewChangeLog::new(actor_id, entry.id, ChangeAction::CodeReassigned).with_details(
                    json!({ "oldCode": entry.old_code, "newCode": entry.new_code }),
                ),
            )
            .await;
        }

        track_student_codes_reassigned(report.updated.len(), report.complete);
        info!(
            total = report.total_students,
            changed = report.changed,
            updated = report.updated.len(),
            complete = report.complete,
            "Student code reassignment finished"
        );

        Ok(report)
    }
}
