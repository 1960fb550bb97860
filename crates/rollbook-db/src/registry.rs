//! Storage capabilities consumed by the service layer.
//!
//! [`UserRegistry`] is the single abstraction over wherever user records
//! live. The allocator needs only two of its operations, reading every
//! student's code and writing one record's code; the rest is the user CRUD
//! the HTTP layer exposes. Backends must enforce uniqueness of email,
//! identity UID and student code, and report violations as
//! [`RegistryError::Conflict`].

use std::fmt;

use async_trait::async_trait;
use rollbook_core::AppError;
use rollbook_models::{
    ChangeLog, NewChangeLog, NewUser, Role, StudentCode, StudentCodeEntry, User, UserChanges,
    UserId, ValueTypeError,
};
use thiserror::Error;

/// A field the registry keeps unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Email,
    AuthUid,
    StudentCode,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::AuthUid => write!(f, "identity"),
            Self::StudentCode => write!(f, "student code"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a user with this {0} already exists")]
    Conflict(UniqueField),

    #[error("user not found")]
    NotFound,

    /// Codes only go to records that carry an identity UID.
    #[error("user is not linked to an identity yet")]
    Unlinked,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<ValueTypeError> for RegistryError {
    fn from(err: ValueTypeError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

impl RegistryError {
    pub fn is_conflict_on(&self, field: UniqueField) -> bool {
        matches!(self, Self::Conflict(f) if *f == field)
    }

    /// Maps the error onto the HTTP status the API reports for it.
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::Conflict(_) | Self::Unlinked => AppError::conflict(self),
            Self::NotFound => AppError::not_found(self),
            Self::Storage(_) | Self::Corrupt(_) => AppError::database(self),
        }
    }
}

/// The user store.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, RegistryError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RegistryError>;

    async fn find_by_auth_uid(&self, auth_uid: &str) -> Result<Option<User>, RegistryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistryError>;

    /// Returns one page of users, newest first, and the total matching count.
    async fn list_users(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RegistryError>;

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, RegistryError>;

    /// Returns `false` when no record had this id.
    async fn delete_user(&self, id: UserId) -> Result<bool, RegistryError>;

    /// Sets the identity UID on a record that has none.
    async fn link_auth_uid(&self, id: UserId, auth_uid: &str) -> Result<User, RegistryError>;

    /// Every non-null code held by a student, in no particular order.
    async fn student_codes(&self) -> Result<Vec<String>, RegistryError>;

    /// Every student, oldest registration first.
    async fn students_by_creation(&self) -> Result<Vec<StudentCodeEntry>, RegistryError>;

    async fn set_student_code(
        &self,
        id: UserId,
        code: Option<StudentCode>,
    ) -> Result<(), RegistryError>;
}

/// The audit trail store.
#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    async fn record(&self, entry: NewChangeLog) -> Result<ChangeLog, RegistryError>;

    /// Returns one page of entries, newest first, and the total matching count.
    async fn list(
        &self,
        entity_id: Option<UserId>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ChangeLog>, i64), RegistryError>;
}
