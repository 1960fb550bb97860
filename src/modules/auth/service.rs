//! Identity linking.
//!
//! The identity provider proves who is calling; the registry says what they
//! are. A user record is matched to an identity by provider UID, or, for
//! records created before identities existed, once by email.

use anyhow::anyhow;
use rollbook_auth::IdentityClaims;
use rollbook_core::AppError;
use rollbook_db::RegistryError;
use rollbook_models::users::RegisterUserDto;
use rollbook_models::{ChangeAction, Email, NewChangeLog, NewUser, Role, User};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::metrics::track_identity_linked;
use crate::modules::auth::model::SyncResponse;
use crate::modules::change_logs::service::ChangeLogService;
use crate::modules::users::service::UserService;
use crate::state::AppState;

pub struct AuthService;

impl AuthService {
    /// Creates the record for the caller's own identity.
    ///
    /// Only `student` (default) and `teacher` may be chosen. Admins are
    /// provisioned by another admin or the CLI.
    #[instrument(skip(state, identity, dto), fields(uid = %identity.sub))]
    pub async fn register(
        state: &AppState,
        identity: &IdentityClaims,
        dto: RegisterUserDto,
    ) -> Result<User, AppError> {
        let role = dto.role.unwrap_or(Role::Student);
        if role == Role::Admin {
            return Err(AppError::forbidden(anyhow!(
                "Admin accounts cannot be self-registered"
            )));
        }

        let email = match (dto.email, identity.email.as_deref()) {
            (Some(email), _) => email,
            (None, Some(raw)) => Email::new(raw).map_err(AppError::unprocessable)?,
            (None, None) => {
                return Err(AppError::unprocessable(anyhow!("email is required")));
            }
        };

        let existing = state
            .users
            .find_by_auth_uid(&identity.sub)
            .await
            .map_err(RegistryError::into_app_error)?;
        if existing.is_some() {
            return Err(AppError::conflict(anyhow!(
                "This identity is already registered"
            )));
        }

        let user = NewUser {
            auth_uid: identity.sub.clone(),
            first_name: dto.first_name,
            last_name: dto.last_name,
            email,
            role,
            student_code: None,
        };

        UserService::create(state, None, user).await
    }

    /// Finds the record for the caller's identity, linking a legacy record
    /// by email when no record carries the UID yet.
    #[instrument(skip(state, identity), fields(uid = %identity.sub))]
    pub async fn sync(state: &AppState, identity: &IdentityClaims) -> Result<SyncResponse, AppError> {
        if let Some(user) = state
            .users
            .find_by_auth_uid(&identity.sub)
            .await
            .map_err(RegistryError::into_app_error)?
        {
            return Ok(SyncResponse {
                user,
                linked: false,
            });
        }

        let not_registered =
            || AppError::not_found(anyhow!("No user record for this identity; register first"));

        let email = identity.email.as_deref().ok_or_else(not_registered)?;
        let candidate = state
            .users
            .find_by_email(email)
            .await
            .map_err(RegistryError::into_app_error)?
            .ok_or_else(not_registered)?;

        if candidate.auth_uid.is_some() {
            warn!(user_id = %candidate.id, "Email already linked to another identity");
            return Err(AppError::conflict(anyhow!(
                "This email is linked to a different identity"
            )));
        }

        let user = state
            .users
            .link_auth_uid(candidate.id, &identity.sub)
            .await
            .map_err(RegistryError::into_app_error)?;

        track_identity_linked();
        ChangeLogService::record(
            state,
            NewChangeLog::new(Some(user.id), user.id, ChangeAction::IdentityLinked)
                .with_details(json!({ "email": user.email })),
        )
        .await;
        info!(user_id = %user.id, "Linked identity to existing user record");

        Ok(SyncResponse { user, linked: true })
    }
}
