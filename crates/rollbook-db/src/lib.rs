//! # Rollbook DB
//!
//! User registry backends and the student-code workflows built on them.
//!
//! The service layer only sees the [`UserRegistry`] and [`ChangeLogStore`]
//! traits. Two backends implement both:
//!
//! - [`PgRegistry`]: PostgreSQL through SQLx, migrations in `migrations/`
//! - [`MemoryRegistry`]: process-local maps, for development and tests
//!
//! # Example
//!
//! ```ignore
//! use rollbook_config::RegistryConfig;
//! use rollbook_db::connect_registry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = connect_registry(&RegistryConfig::from_env()).await?;
//!     let codes = registry.users.student_codes().await?;
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod memory;
pub mod postgres;
pub mod registry;

use std::sync::Arc;

use anyhow::Context;
use rollbook_config::{RegistryBackend, RegistryConfig};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use codes::{apply_reassignments, assign_student_code, insert_with_student_code};
pub use memory::MemoryRegistry;
pub use postgres::PgRegistry;
pub use registry::{ChangeLogStore, RegistryError, UniqueField, UserRegistry};
pub use sqlx::PgPool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Opens a PostgreSQL pool and brings the schema up to date.
pub async fn init_db_pool(config: &RegistryConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set for the postgres registry")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Both store handles, backed by the same registry.
#[derive(Clone)]
pub struct Registry {
    pub users: Arc<dyn UserRegistry>,
    pub change_logs: Arc<dyn ChangeLogStore>,
}

impl Registry {
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryRegistry::new()))
    }

    /// Wraps an existing memory registry, keeping the caller's handle usable
    /// for seeding.
    pub fn from_memory(registry: Arc<MemoryRegistry>) -> Self {
        Self {
            users: registry.clone(),
            change_logs: registry,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let registry = Arc::new(PgRegistry::new(pool));
        Self {
            users: registry.clone(),
            change_logs: registry,
        }
    }
}

/// Builds the backend named by `config`.
pub async fn connect_registry(config: &RegistryConfig) -> anyhow::Result<Registry> {
    info!(backend = %config.backend, "Opening user registry");
    match config.backend {
        RegistryBackend::Memory => Ok(Registry::memory()),
        RegistryBackend::Postgres => Ok(Registry::postgres(init_db_pool(config).await?)),
    }
}
