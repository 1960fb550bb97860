//! In-process registry backend.
//!
//! Holds every record behind a [`tokio::sync::RwLock`] and enforces the same
//! uniqueness rules as the PostgreSQL schema. Used for local development
//! (`REGISTRY_BACKEND=memory`) and by the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rollbook_models::{
    ChangeLog, ChangeLogId, NewChangeLog, NewUser, Role, StudentCode, StudentCodeEntry, User,
    UserChanges, UserId,
};
use tokio::sync::RwLock;

use crate::registry::{ChangeLogStore, RegistryError, UniqueField, UserRegistry};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    change_logs: Vec<ChangeLog>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Strictly increasing timestamps, so creation order is never a tie.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }

    /// Reports the first violated field in a fixed order: email, identity,
    /// then student code. The answer never depends on map iteration order.
    fn check_unique(
        &self,
        except: Option<UserId>,
        email: Option<&str>,
        auth_uid: Option<&str>,
        student_code: Option<&str>,
    ) -> Result<(), RegistryError> {
        let others = || self.users.values().filter(move |u| Some(u.id) != except);

        if let Some(email) = email {
            if others().any(|u| u.email.as_str() == email) {
                return Err(RegistryError::Conflict(UniqueField::Email));
            }
        }
        if let Some(auth_uid) = auth_uid {
            if others().any(|u| u.auth_uid.as_deref() == Some(auth_uid)) {
                return Err(RegistryError::Conflict(UniqueField::AuthUid));
            }
        }
        if let Some(code) = student_code {
            if others().any(|u| u.student_code.as_deref() == Some(code)) {
                return Err(RegistryError::Conflict(UniqueField::StudentCode));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRegistry {
    inner: RwLock<Inner>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully formed record as is, keeping its id, timestamps and
    /// a possibly missing identity UID. Used to load records that predate
    /// identity linking.
    pub async fn import_user(&self, user: User) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        inner.check_unique(
            Some(user.id),
            Some(user.email.as_str()),
            user.auth_uid.as_deref(),
            user.student_code.as_deref(),
        )?;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserRegistry for MemoryRegistry {
    async fn insert_user(&self, user: NewUser) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        let code = user.student_code.map(|c| c.to_string());
        inner.check_unique(
            None,
            Some(user.email.as_str()),
            Some(&user.auth_uid),
            code.as_deref(),
        )?;

        let now = inner.next_timestamp();
        let record = User {
            id: UserId::new(),
            auth_uid: Some(user.auth_uid),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            student_code: code,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RegistryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_auth_uid(&self, auth_uid: &str) -> Result<Option<User>, RegistryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.auth_uid.as_deref() == Some(auth_uid))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistryError> {
        let email = email.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RegistryError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = users.len() as i64;
        Ok((paginate(users, limit, offset), total))
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&id) {
            return Err(RegistryError::NotFound);
        }

        let code = match &changes.student_code {
            Some(Some(code)) => Some(code.to_string()),
            _ => None,
        };
        inner.check_unique(
            Some(id),
            changes.email.as_ref().map(|e| e.as_str()),
            None,
            code.as_deref(),
        )?;

        let now = inner.next_timestamp();
        let user = inner.users.get_mut(&id).ok_or(RegistryError::NotFound)?;
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(student_code) = changes.student_code {
            user.student_code = student_code.map(|c| c.to_string());
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RegistryError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn link_auth_uid(&self, id: UserId, auth_uid: &str) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        match inner.users.get(&id) {
            None => return Err(RegistryError::NotFound),
            Some(user) if user.auth_uid.is_some() => {
                return Err(RegistryError::Conflict(UniqueField::AuthUid));
            }
            Some(_) => {}
        }
        inner.check_unique(Some(id), None, Some(auth_uid), None)?;

        let now = inner.next_timestamp();
        let user = inner.users.get_mut(&id).ok_or(RegistryError::NotFound)?;
        user.auth_uid = Some(auth_uid.to_string());
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn student_codes(&self) -> Result<Vec<String>, RegistryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| u.role == Role::Student)
            .filter_map(|u| u.student_code.clone())
            .collect())
    }

    async fn students_by_creation(&self) -> Result<Vec<StudentCodeEntry>, RegistryError> {
        let inner = self.inner.read().await;
        let mut students: Vec<StudentCodeEntry> = inner
            .users
            .values()
            .filter(|u| u.role == Role::Student)
            .map(|u| StudentCodeEntry {
                id: u.id,
                student_code: u.student_code.clone(),
                created_at: u.created_at,
                linked: u.auth_uid.is_some(),
            })
            .collect();
        students.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn set_student_code(
        &self,
        id: UserId,
        code: Option<StudentCode>,
    ) -> Result<(), RegistryError> {
        self.update_user(
            id,
            UserChanges {
                student_code: Some(code),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl ChangeLogStore for MemoryRegistry {
    async fn record(&self, entry: NewChangeLog) -> Result<ChangeLog, RegistryError> {
        let mut inner = self.inner.write().await;
        let created_at = inner.next_timestamp();
        let log = ChangeLog {
            id: ChangeLogId::new(),
            actor_id: entry.actor_id,
            entity_id: entry.entity_id,
            action: entry.action,
            details: entry.details,
            created_at,
        };
        inner.change_logs.push(log.clone());
        Ok(log)
    }

    async fn list(
        &self,
        entity_id: Option<UserId>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ChangeLog>, i64), RegistryError> {
        let inner = self.inner.read().await;
        let logs: Vec<ChangeLog> = inner
            .change_logs
            .iter()
            .rev()
            .filter(|log| entity_id.is_none_or(|id| log.entity_id == id))
            .cloned()
            .collect();

        let total = logs.len() as i64;
        Ok((paginate(logs, limit, offset), total))
    }
}
