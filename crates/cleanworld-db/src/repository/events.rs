//! Clean-up event operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Event, EventPatch, NewEvent, UserSummary};
use crate::repository::Database;

/// Status a newly created event starts in
const EVENT_STATUS_SCHEDULED: &str = "scheduled";

impl Database {
    // ==================== Event Operations ====================

    /// Insert a new event
    pub async fn insert_event(&self, event: NewEvent) -> Result<Event, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO events (title, description, datetime, status, reward_points, zone_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.datetime.to_rfc3339())
        .bind(EVENT_STATUS_SCHEDULED)
        .bind(event.reward_points)
        .bind(event.zone_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Event {
            id,
            title: event.title,
            description: event.description,
            datetime: event.datetime,
            status: EVENT_STATUS_SCHEDULED.to_string(),
            reward_points: event.reward_points,
            zone_id: event.zone_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an event by ID
    pub async fn get_event(&self, id: i64) -> Result<Option<Event>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, description, datetime, status, reward_points, zone_id, created_at, updated_at
            FROM events
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Event::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all events
    pub async fn list_events(&self) -> Result<Vec<Event>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, datetime, status, reward_points, zone_id, created_at, updated_at
            FROM events
            ORDER BY datetime
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Event::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a typed partial update and return the merged record
    pub async fn update_event(&self, id: i64, patch: EventPatch) -> Result<Option<Event>, DbError> {
        let Some(existing) = self.get_event(id).await? else {
            return Ok(None);
        };

        let title = patch.title.unwrap_or(existing.title);
        let description = patch.description.unwrap_or(existing.description);
        let datetime = patch.datetime.unwrap_or(existing.datetime);
        let status = patch.status.unwrap_or(existing.status);
        let reward_points = patch.reward_points.unwrap_or(existing.reward_points);

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, datetime = ?, status = ?, reward_points = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(datetime.to_rfc3339())
        .bind(&status)
        .bind(reward_points)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(Event {
            id,
            title,
            description,
            datetime,
            status,
            reward_points,
            zone_id: existing.zone_id,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete an event and its attendee rows
    pub async fn delete_event(&self, id: i64) -> Result<bool, DbError> {
        sqlx::query("DELETE FROM event_attendees WHERE event_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Attendee Operations ====================

    /// Add a user to an event's attendee set
    pub async fn add_attendee(&self, event_id: i64, user_id: i64) -> Result<(), DbError> {
        let already = sqlx::query(
            "SELECT COUNT(*) as count FROM event_attendees WHERE event_id = ? AND user_id = ?",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = already.get("count");
        if count > 0 {
            return Err(DbError::Duplicate(format!(
                "User {} already attends event {}",
                user_id, event_id
            )));
        }

        sqlx::query(
            "INSERT INTO event_attendees (event_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a user from an event's attendee set
    pub async fn remove_attendee(&self, event_id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            "DELETE FROM event_attendees WHERE event_id = ? AND user_id = ?",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List attendees of an event (summary fields only, never credentials)
    pub async fn list_attendees(&self, event_id: i64) -> Result<Vec<UserSummary>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.name, u.avatar, u.points
            FROM users u
            JOIN event_attendees a ON a.user_id = u.id
            WHERE a.event_id = ?
            ORDER BY a.joined_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| UserSummary::try_from(row).map_err(DbError::from))
            .collect()
    }
}
