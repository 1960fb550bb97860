//! User registry backend selection and student-code allocation settings.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Which storage backend holds user records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistryBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for RegistryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" | "in-memory" => Ok(Self::Memory),
            other => Err(format!("unknown registry backend '{}'", other)),
        }
    }
}

impl fmt::Display for RegistryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    /// Required when `backend` is Postgres.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl RegistryConfig {
    /// Reads `REGISTRY_BACKEND`, `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
    ///
    /// An unrecognised backend name falls back to Postgres.
    pub fn from_env() -> Self {
        Self {
            backend: env::var("REGISTRY_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            database_url: env::var("DATABASE_URL").ok(),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Settings for student-code allocation on record creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentCodeConfig {
    /// Extra attempts after a duplicate-code rejection from the store.
    pub max_conflict_retries: u32,
}

impl Default for StudentCodeConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 1,
        }
    }
}

impl StudentCodeConfig {
    pub fn from_env() -> Self {
        Self {
            max_conflict_retries: env::var("STUDENT_CODE_CONFLICT_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("postgres".parse::<RegistryBackend>(), Ok(RegistryBackend::Postgres));
        assert_eq!(" Memory ".parse::<RegistryBackend>(), Ok(RegistryBackend::Memory));
        assert!("mongo".parse::<RegistryBackend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in [RegistryBackend::Postgres, RegistryBackend::Memory] {
            assert_eq!(backend.to_string().parse::<RegistryBackend>(), Ok(backend));
        }
    }

    #[test]
    fn test_student_code_default_retries_once() {
        assert_eq!(StudentCodeConfig::default().max_conflict_retries, 1);
    }
}
