use anyhow::anyhow;
use rollbook_core::{AppError, PaginationMeta};
use rollbook_db::{RegistryError, assign_student_code, insert_with_student_code};
use rollbook_models::users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserFilterParams,
};
use rollbook_models::{ChangeAction, NewChangeLog, NewUser, User, UserChanges, UserId};
use serde_json::json;
use tracing::{info, instrument};

use crate::metrics::{track_student_code_allocated, track_user_created};
use crate::modules::change_logs::service::ChangeLogService;
use crate::modules::student_codes::service::allocation_error;
use crate::state::AppState;

pub struct UserService;

impl UserService {
    /// Inserts a new record, allocating a student code when the role needs
    /// one, and writes the matching audit entries.
    #[instrument(skip(state, user), fields(role = %user.role))]
    pub async fn create(
        state: &AppState,
        actor_id: Option<UserId>,
        user: NewUser,
    ) -> Result<User, AppError> {
        let created = insert_with_student_code(
            state.users.as_ref(),
            user,
            state.code_config.max_conflict_retries,
        )
        .await
        .map_err(allocation_error)?;

        track_user_created(created.role.as_str());
        ChangeLogService::record(
            state,
            NewChangeLog::new(actor_id, created.id, ChangeAction::UserCreated)
                .with_details(json!({ "role": created.role, "email": created.email })),
        )
        .await;

        if let Some(code) = &created.student_code {
            track_student_code_allocated();
            ChangeLogService::record(
                state,
                NewChangeLog::new(actor_id, created.id, ChangeAction::CodeAssigned)
                    .with_details(json!({ "studentCode": code })),
            )
            .await;
        }

        info!(user_id = %created.id, student_code = ?created.student_code, "User created");
        Ok(created)
    }

    #[instrument(skip(state, dto))]
    pub async fn create_user(
        state: &AppState,
        actor_id: UserId,
        dto: CreateUserDto,
    ) -> Result<User, AppError> {
        let user = NewUser {
            auth_uid: dto.auth_uid,
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            role: dto.role,
            student_code: None,
        };
        Self::create(state, Some(actor_id), user).await
    }

    #[instrument(skip(state))]
    pub async fn get_users(
        state: &AppState,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let pagination = filters.pagination();

        let (data, total) = state
            .users
            .list_users(filters.role, pagination.limit(), pagination.offset())
            .await
            .map_err(RegistryError::into_app_error)?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }

    #[instrument(skip(state))]
    pub async fn get_user(state: &AppState, id: UserId) -> Result<User, AppError> {
        state
            .users
            .find_user(id)
            .await
            .map_err(RegistryError::into_app_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    /// Applies field changes. Moving into the student role allocates a code;
    /// moving out of it frees the code.
    #[instrument(skip(state, dto))]
    pub async fn update_user(
        state: &AppState,
        actor_id: UserId,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(state, id).await?;

        let role_change = dto.role.filter(|role| *role != existing.role);
        let leaves_students = role_change.is_some_and(|r| !r.holds_student_code())
            && existing.role.holds_student_code();
        let joins_students = role_change.is_some_and(|r| r.holds_student_code());

        if joins_students && existing.auth_uid.is_none() {
            return Err(AppError::conflict(anyhow!(
                "User must link an identity before becoming a student"
            )));
        }

        let changes = UserChanges {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            role: role_change,
            student_code: leaves_students.then_some(None),
        };

        if changes.is_empty() {
            return Ok(existing);
        }

        let mut updated = state
            .users
            .update_user(id, changes)
            .await
            .map_err(RegistryError::into_app_error)?;

        ChangeLogService::record(
            state,
            NewChangeLog::new(Some(actor_id), id, ChangeAction::UserUpdated).with_details(json!({
                "role": updated.role,
                "previousRole": existing.role,
                "releasedCode": if leaves_students { existing.student_code.clone() } else { None },
            })),
        )
        .await;

        if joins_students && updated.student_code.is_none() {
            let code = assign_student_code(
                state.users.as_ref(),
                id,
                state.code_config.max_conflict_retries,
            )
            .await
            .map_err(allocation_error)?;

            track_student_code_allocated();
            ChangeLogService::record(
                state,
                NewChangeLog::new(Some(actor_id), id, ChangeAction::CodeAssigned)
                    .with_details(json!({ "studentCode": code })),
            )
            .await;

            updated = Self::get_user(state, id).await?;
        }

        Ok(updated)
    }

    /// Deletes a record; its student code becomes free for reuse.
    #[instrument(skip(state))]
    pub async fn delete_user(
        state: &AppState,
        actor_id: UserId,
        id: UserId,
    ) -> Result<(), AppError> {
        if actor_id == id {
            return Err(AppError::bad_request(anyhow!(
                "You cannot delete your own account"
            )));
        }

        let existing = Self::get_user(state, id).await?;

        let deleted = state
            .users
            .delete_user(id)
            .await
            .map_err(RegistryError::into_app_error)?;
        if !deleted {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        ChangeLogService::record(
            state,
            NewChangeLog::new(Some(actor_id), id, ChangeAction::UserDeleted).with_details(json!({
                "email": existing.email,
                "releasedCode": existing.student_code,
            })),
        )
        .await;

        Ok(())
    }
}
