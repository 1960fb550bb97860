//! PostgreSQL registry backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rollbook_models::{
    ChangeAction, ChangeLog, ChangeLogId, Email, NewChangeLog, NewUser, Role, StudentCode,
    StudentCodeEntry, User, UserChanges, UserId,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::registry::{ChangeLogStore, RegistryError, UniqueField, UserRegistry};

const USER_COLUMNS: &str =
    "id, auth_uid, first_name, last_name, email, role, student_code, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: UserId,
    auth_uid: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    student_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RegistryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            auth_uid: row.auth_uid,
            first_name: row.first_name,
            last_name: row.last_name,
            email: Email::new(&row.email)?,
            role: row.role.parse::<Role>().map_err(RegistryError::Corrupt)?,
            student_code: row.student_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChangeLogRow {
    id: ChangeLogId,
    actor_id: Option<UserId>,
    entity_id: UserId,
    action: String,
    details: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChangeLogRow> for ChangeLog {
    type Error = RegistryError;

    fn try_from(row: ChangeLogRow) -> Result<Self, Self::Error> {
        Ok(ChangeLog {
            id: row.id,
            actor_id: row.actor_id,
            entity_id: row.entity_id,
            action: row
                .action
                .parse::<ChangeAction>()
                .map_err(RegistryError::Corrupt)?,
            details: row.details,
            created_at: row.created_at,
        })
    }
}

/// Translates unique-constraint violations into [`RegistryError::Conflict`].
fn map_write_error(err: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("users_email_key") => Some(UniqueField::Email),
                Some("users_auth_uid_key") => Some(UniqueField::AuthUid),
                Some("users_student_code_key") => Some(UniqueField::StudentCode),
                _ => None,
            };
            if let Some(field) = field {
                return RegistryError::Conflict(field);
            }
        }
    }
    RegistryError::Storage(err)
}

#[derive(Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserRegistry for PgRegistry {
    async fn insert_user(&self, user: NewUser) -> Result<User, RegistryError> {
        let sql = format!(
            "INSERT INTO users (auth_uid, first_name, last_name, email, role, student_code) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.auth_uid)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.email.as_str())
            .bind(user.role.as_str())
            .bind(user.student_code.map(|c| c.to_string()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.try_into()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RegistryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_auth_uid(&self, auth_uid: &str) -> Result<Option<User>, RegistryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE auth_uid = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(auth_uid)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RegistryError> {
        let role = role.map(Role::as_str);

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR role = $1)")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR role = $1) \
             ORDER BY created_at DESC, id \
             LIMIT $2 OFFSET $3"
        );
        let users = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, RegistryError> {
        let (set_code, code) = match changes.student_code {
            Some(code) => (true, code.map(|c| c.to_string())),
            None => (false, None),
        };

        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                role = COALESCE($5, role), \
                student_code = CASE WHEN $6 THEN $7 ELSE student_code END, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.email.as_ref().map(Email::as_str))
            .bind(changes.role.map(Role::as_str))
            .bind(set_code)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(RegistryError::NotFound)?;

        row.try_into()
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RegistryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_auth_uid(&self, id: UserId, auth_uid: &str) -> Result<User, RegistryError> {
        let sql = format!(
            "UPDATE users SET auth_uid = $2, updated_at = NOW() \
             WHERE id = $1 AND auth_uid IS NULL \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(auth_uid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        match row {
            Some(row) => row.try_into(),
            // Either missing or already linked to some identity.
            None => match self.find_user(id).await? {
                Some(_) => Err(RegistryError::Conflict(UniqueField::AuthUid)),
                None => Err(RegistryError::NotFound),
            },
        }
    }

    async fn student_codes(&self) -> Result<Vec<String>, RegistryError> {
        let codes = sqlx::query_scalar::<_, String>(
            "SELECT student_code FROM users WHERE role = 'student' AND student_code IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(codes)
    }

    async fn students_by_creation(&self) -> Result<Vec<StudentCodeEntry>, RegistryError> {
        let students = sqlx::query_as::<_, StudentCodeEntry>(
            "SELECT id, student_code, created_at, auth_uid IS NOT NULL AS linked FROM users \
             WHERE role = 'student' ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn set_student_code(
        &self,
        id: UserId,
        code: Option<StudentCode>,
    ) -> Result<(), RegistryError> {
        let result =
            sqlx::query("UPDATE users SET student_code = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(code.map(|c| c.to_string()))
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeLogStore for PgRegistry {
    async fn record(&self, entry: NewChangeLog) -> Result<ChangeLog, RegistryError> {
        let row = sqlx::query_as::<_, ChangeLogRow>(
            "INSERT INTO change_logs (actor_id, entity_id, action, details) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, actor_id, entity_id, action, details, created_at",
        )
        .bind(entry.actor_id)
        .bind(entry.entity_id)
        .bind(entry.action.as_str())
        .bind(entry.details)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(
        &self,
        entity_id: Option<UserId>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ChangeLog>, i64), RegistryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM change_logs WHERE ($1::uuid IS NULL OR entity_id = $1)",
        )
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await?;

        let logs = sqlx::query_as::<_, ChangeLogRow>(
            "SELECT id, actor_id, entity_id, action, details, created_at FROM change_logs \
             WHERE ($1::uuid IS NULL OR entity_id = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(entity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ChangeLog::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok((logs, total))
    }
}
