//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, Role, User, UserPatch};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// Rejects duplicate email or name before writing anything, so a failed
    /// registration never leaves a partial record behind.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        if self.email_exists(&user.email).await? {
            return Err(DbError::Duplicate(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        if self.name_exists(&user.name).await? {
            return Err(DbError::Duplicate(format!(
                "Name '{}' is already taken",
                user.name
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, avatar, points, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.role.as_i64())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            avatar: user.avatar,
            points: 0,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, avatar, points, role, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, avatar, points, role, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Check whether an email is already registered
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    /// Check whether a display name is already taken
    pub async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, avatar, points, role, created_at, updated_at
            FROM users
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a typed partial update and return the merged record
    ///
    /// Returns `Ok(None)` when no user with the given id exists. Changing the
    /// email or name to one held by another user is a duplicate error.
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DbError> {
        let Some(existing) = self.get_user_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(new_email) = &patch.email
            && *new_email != existing.email
            && self.email_exists(new_email).await?
        {
            return Err(DbError::Duplicate(format!(
                "Email '{}' is already registered",
                new_email
            )));
        }
        if let Some(new_name) = &patch.name
            && *new_name != existing.name
            && self.name_exists(new_name).await?
        {
            return Err(DbError::Duplicate(format!(
                "Name '{}' is already taken",
                new_name
            )));
        }

        let name = patch.name.unwrap_or(existing.name);
        let email = patch.email.unwrap_or(existing.email);
        let password_hash = patch.password_hash.unwrap_or(existing.password_hash);
        let avatar = patch.avatar.unwrap_or(existing.avatar);
        let points = patch.points.unwrap_or(existing.points);
        let role = patch.role.unwrap_or(existing.role);

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = ?, avatar = ?, points = ?, role = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&avatar)
        .bind(points)
        .bind(role.as_i64())
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(User {
            id,
            name,
            email,
            password_hash,
            avatar,
            points,
            role,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
