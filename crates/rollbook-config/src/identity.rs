//! Identity-provider token configuration.
//!
//! Users authenticate against an external identity provider, which issues
//! signed ID tokens. The API only verifies those tokens; it never sees
//! passwords.
//!
//! # Environment Variables
//!
//! - `IDENTITY_JWT_SECRET`: HMAC secret shared with the provider
//! - `IDENTITY_ISSUER`: expected `iss` claim (default: `rollbook-identity`)
//! - `IDENTITY_AUDIENCE`: expected `aud` claim (default: `rollbook-dashboard`)
//! - `IDENTITY_TOKEN_TTL`: lifetime in seconds of tokens minted by the CLI (default: 3600)

use std::env;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: i64,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("IDENTITY_JWT_SECRET")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            issuer: env::var("IDENTITY_ISSUER").unwrap_or_else(|_| "rollbook-identity".to_string()),
            audience: env::var("IDENTITY_AUDIENCE")
                .unwrap_or_else(|_| "rollbook-dashboard".to_string()),
            token_ttl: env::var("IDENTITY_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}
