use anyhow::anyhow;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rollbook_auth::{IdentityClaims, verify_identity_token};
use rollbook_core::AppError;
use rollbook_models::{User, UserId};

use crate::state::AppState;

/// A verified identity-provider token. The identity may or may not be linked
/// to a user record yet.
#[derive(Debug, Clone)]
pub struct IdentityUser(pub IdentityClaims);

impl IdentityUser {
    pub fn uid(&self) -> &str {
        &self.0.sub
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}

impl FromRequestParts<AppState> for IdentityUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized(anyhow!("Missing bearer token")))?;

        let claims = verify_identity_token(bearer.token(), &state.identity_config)?;

        Ok(IdentityUser(claims))
    }
}

/// The user record linked to the caller's identity.
///
/// Rejects with 403 when the identity is valid but not linked; the client is
/// expected to call `/api/auth/sync` or `/api/auth/register` first.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by an upstream guard.
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let identity = IdentityUser::from_request_parts(parts, state).await?;

        let user = state
            .users
            .find_by_auth_uid(identity.uid())
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| {
                AppError::forbidden(anyhow!("Identity is not linked to a user record"))
            })?;

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
