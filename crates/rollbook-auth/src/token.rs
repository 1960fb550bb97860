//! ID token verification.
//!
//! Tokens are HS256 JWTs signed with the secret shared with the identity
//! provider. Issuer and audience must match the configured values.
//!
//! [`issue_identity_token`] mints tokens with the same key. The provider
//! normally does that; the CLI and the test suites use it to act as one.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use rollbook_config::IdentityConfig;
use rollbook_core::AppError;

use crate::claims::IdentityClaims;

/// Verifies signature, expiry, issuer and audience, and returns the claims.
pub fn verify_identity_token(
    token: &str,
    config: &IdentityConfig,
) -> Result<IdentityClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);

    decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired identity token")))
}

/// Signs an ID token for `uid` valid for the configured lifetime.
pub fn issue_identity_token(
    uid: &str,
    email: Option<&str>,
    name: Option<&str>,
    config: &IdentityConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;

    let claims = IdentityClaims {
        sub: uid.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        exp: now + config.token_ttl.max(0) as usize,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to sign identity token: {}", e)))
}
