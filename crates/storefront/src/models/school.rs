//! School directory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use uniformly_core::SchoolId;

use super::{non_blank, nullable};

/// A school in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub city: String,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /schools`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSchool {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl NewSchool {
    /// Trim the required fields, returning `None` if either is blank.
    #[must_use]
    pub fn validated(self) -> Option<Self> {
        Some(Self {
            name: Some(non_blank(self.name)?),
            city: Some(non_blank(self.city)?),
            logo_url: non_blank(self.logo_url),
            cover_url: non_blank(self.cover_url),
        })
    }
}

/// Body of `PUT /schools?id=N`. Only these fields are writable.
///
/// `logoUrl`/`coverUrl` may be set to `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchoolUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_url: Option<Option<String>>,
}

impl SchoolUpdate {
    /// Trim provided fields. Returns `None` if `name` or `city` is present
    /// but blank, since both columns are required.
    #[must_use]
    pub fn validated(self) -> Option<Self> {
        let name = match self.name {
            Some(name) => Some(non_blank(Some(name))?),
            None => None,
        };
        let city = match self.city {
            Some(city) => Some(non_blank(Some(city))?),
            None => None,
        };
        Some(Self {
            name,
            city,
            logo_url: self.logo_url.map(non_blank),
            cover_url: self.cover_url.map(non_blank),
        })
    }
}
