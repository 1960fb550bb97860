//! # Rollbook API
//!
//! Backend for a school administration dashboard, built with Axum on top of
//! a pluggable user registry (PostgreSQL or in-memory).
//!
//! ## Overview
//!
//! - **Identity linking**: users sign in with an external identity provider;
//!   the API verifies its ID tokens and ties each identity to one user record
//! - **Student codes**: every student carries a unique `SU-NNN` code, handed
//!   out first-fit so numbers freed by deleted students are reused
//! - **Code maintenance**: gap reports and gapless renumbering for admins
//! - **Audit trail**: every user and code change is recorded
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── rollbook-core/     # AppError, pagination
//! ├── rollbook-config/   # Environment configuration
//! ├── rollbook-models/   # Domain types and the pure code allocator
//! ├── rollbook-db/       # Registry trait, Postgres and memory backends
//! ├── rollbook-auth/     # Identity token verification
//! └── rollbook-cli/      # Admin CLI
//! src/
//! ├── middleware/        # Identity extractors and role guards
//! └── modules/
//!     ├── auth/          # register, sync, me
//!     ├── users/         # user administration
//!     ├── student_codes/ # next, gaps, reassign
//!     └── change_logs/   # audit trail
//! ```
//!
//! Each feature module follows the same layout: `controller.rs` (handlers),
//! `service.rs` (business logic), `router.rs`, and optionally `model.rs`.
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

pub use rollbook_auth;
pub use rollbook_config;
pub use rollbook_core;
pub use rollbook_db;
pub use rollbook_models;
