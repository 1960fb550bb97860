//! Audit trail entries.
//!
//! Every write that touches a user record or its student code leaves a
//! [`ChangeLog`] entry naming who did it and what changed.

use chrono::{DateTime, Utc};
use rollbook_core::pagination::deserialize_optional_i64;
use rollbook_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::ids::{ChangeLogId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    UserCreated,
    UserUpdated,
    UserDeleted,
    CodeAssigned,
    CodeReassigned,
    IdentityLinked,
}

impl ChangeAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserCreated => "user_created",
            Self::UserUpdated => "user_updated",
            Self::UserDeleted => "user_deleted",
            Self::CodeAssigned => "code_assigned",
            Self::CodeReassigned => "code_reassigned",
            Self::IdentityLinked => "identity_linked",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::UserCreated,
            Self::UserUpdated,
            Self::UserDeleted,
            Self::CodeAssigned,
            Self::CodeReassigned,
            Self::IdentityLinked,
        ]
        .into_iter()
        .find(|action| action.as_str() == s)
        .ok_or_else(|| format!("unknown change action '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog {
    pub id: ChangeLogId,
    /// `None` for changes made by the CLI or by the system itself.
    pub actor_id: Option<UserId>,
    pub entity_id: UserId,
    pub action: ChangeAction,
    #[schema(value_type = Object)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeLog {
    pub actor_id: Option<UserId>,
    pub entity_id: UserId,
    pub action: ChangeAction,
    pub details: Value,
}

impl NewChangeLog {
    pub fn new(actor_id: Option<UserId>, entity_id: UserId, action: ChangeAction) -> Self {
        Self {
            actor_id,
            entity_id,
            action,
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChangeLogFilterParams {
    /// Only entries about this user
    pub entity_id: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl ChangeLogFilterParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedChangeLogsResponse {
    pub data: Vec<ChangeLog>,
    pub meta: PaginationMeta,
}
