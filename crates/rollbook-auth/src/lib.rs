//! # Rollbook Auth
//!
//! Verification of ID tokens issued by the external identity provider.
//!
//! - [`claims`]: the [`IdentityClaims`] carried by a token
//! - [`token`]: verification and, for tooling, issuance
//!
//! # Example
//!
//! ```ignore
//! use rollbook_auth::verify_identity_token;
//! use rollbook_config::IdentityConfig;
//!
//! let config = IdentityConfig::from_env();
//! let claims = verify_identity_token(&bearer, &config)?;
//! println!("Provider UID: {}", claims.sub);
//! ```

pub mod claims;
pub mod token;

pub use claims::IdentityClaims;
pub use token::{issue_identity_token, verify_identity_token};
