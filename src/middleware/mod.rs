//! Request extractors and guards.
//!
//! - [`auth`]: [`IdentityUser`](auth::IdentityUser) for any valid identity
//!   token, [`CurrentUser`](auth::CurrentUser) for a linked user record
//! - [`role`]: route layers restricting access by role
//!
//! # Authentication Flow
//!
//! 1. The dashboard signs the user in with the identity provider
//! 2. It sends `Authorization: Bearer <id token>` on every request
//! 3. `IdentityUser` verifies the token; `CurrentUser` also loads the record
//!    whose `authUid` matches the token subject

pub mod auth;
pub mod role;
