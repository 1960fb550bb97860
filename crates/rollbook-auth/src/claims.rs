//! Claims carried by identity-provider ID tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims of an ID token issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityClaims {
    /// Provider UID of the signed-in identity
    pub sub: String,
    /// Email the provider verified for this identity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, if the provider knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

