//! # Rollbook CLI
//!
//! Administrative operations and development seeding, shared by the
//! `rollbook-cli` binary.
//!
//! ## Usage
//!
//! ```ignore
//! use rollbook_cli::seeder::seed_users;
//! use rollbook_models::Role;
//!
//! let registry = rollbook_db::Registry::memory();
//! let students = seed_users(&registry, Role::Student, 25, 1).await?;
//! ```

pub mod admin;
pub mod seeder;
