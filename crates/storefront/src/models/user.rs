//! Customer account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use uniformly_core::{Email, UserId};

use super::nullable;

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Always lowercase.
    pub email: Email,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Body of `PUT /users?id=N`. Only these fields are writable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
}
