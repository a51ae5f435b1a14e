//! School directory repository.

use sqlx::PgPool;

use uniformly_core::SchoolId;

use super::{Page, RepositoryError};
use crate::models::{NewSchool, School, SchoolUpdate};

const SCHOOL_COLUMNS: &str = "id, name, city, logo_url, cover_url, created_at";

/// Repository for school database operations.
pub struct SchoolRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SchoolRepository<'a> {
    /// Create a new school repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List schools alphabetically, optionally filtered by a case-insensitive
    /// substring of the name or city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Vec<School>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let schools = sqlx::query_as::<_, School>(&format!(
            r"
            SELECT {SCHOOL_COLUMNS}
            FROM schools
            WHERE $1::text IS NULL OR name ILIKE $1 OR city ILIKE $1
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(schools)
    }

    /// Get a school by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: SchoolId) -> Result<Option<School>, RepositoryError> {
        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(school)
    }

    /// Whether a school with this exact name and city exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, name: &str, city: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM schools WHERE name = $1 AND city = $2)",
        )
        .bind(name)
        .bind(city)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a validated school.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, school: &NewSchool) -> Result<School, RepositoryError> {
        let created = sqlx::query_as::<_, School>(&format!(
            r"
            INSERT INTO schools (name, city, logo_url, cover_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {SCHOOL_COLUMNS}
            "
        ))
        .bind(&school.name)
        .bind(&school.city)
        .bind(&school.logo_url)
        .bind(&school.cover_url)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Apply an allow-listed partial update in one statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no school has this ID.
    pub async fn update(
        &self,
        id: SchoolId,
        update: &SchoolUpdate,
    ) -> Result<School, RepositoryError> {
        let updated = sqlx::query_as::<_, School>(&format!(
            r"
            UPDATE schools SET
                name = COALESCE($2, name),
                city = COALESCE($3, city),
                logo_url = CASE WHEN $4 THEN $5 ELSE logo_url END,
                cover_url = CASE WHEN $6 THEN $7 ELSE cover_url END
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.city)
        .bind(update.logo_url.is_some())
        .bind(update.logo_url.clone().flatten())
        .bind(update.cover_url.is_some())
        .bind(update.cover_url.clone().flatten())
        .fetch_optional(self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    /// Delete a school and its catalog products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no school has this ID, or
    /// `RepositoryError::Conflict` if one of its products appears in an order.
    pub async fn delete(&self, id: SchoolId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "school has products that appear in orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
