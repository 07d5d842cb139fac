//! Zone operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewZone, Zone, ZonePatch};
use crate::repository::Database;

/// Status a newly reported zone starts in
const ZONE_STATUS_REPORTED: &str = "reported";

impl Database {
    // ==================== Zone Operations ====================

    /// Insert a new zone
    pub async fn insert_zone(&self, zone: NewZone) -> Result<Zone, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO zones (latitude, longitude, title, description, img_url, severity, status, reported_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(zone.latitude)
        .bind(zone.longitude)
        .bind(&zone.title)
        .bind(&zone.description)
        .bind(&zone.img_url)
        .bind(zone.severity)
        .bind(ZONE_STATUS_REPORTED)
        .bind(zone.reported_by)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Zone {
            id,
            latitude: zone.latitude,
            longitude: zone.longitude,
            title: zone.title,
            description: zone.description,
            img_url: zone.img_url,
            after_img_url: None,
            severity: zone.severity,
            status: ZONE_STATUS_REPORTED.to_string(),
            reported_by: zone.reported_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a zone by ID
    pub async fn get_zone(&self, id: i64) -> Result<Option<Zone>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, latitude, longitude, title, description, img_url, after_img_url,
                   severity, status, reported_by, created_at, updated_at
            FROM zones
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Zone::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all zones
    pub async fn list_zones(&self) -> Result<Vec<Zone>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, latitude, longitude, title, description, img_url, after_img_url,
                   severity, status, reported_by, created_at, updated_at
            FROM zones
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Zone::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a typed partial update and return the merged record
    pub async fn update_zone(&self, id: i64, patch: ZonePatch) -> Result<Option<Zone>, DbError> {
        let Some(existing) = self.get_zone(id).await? else {
            return Ok(None);
        };

        let title = patch.title.unwrap_or(existing.title);
        let description = patch.description.unwrap_or(existing.description);
        let img_url = patch.img_url.unwrap_or(existing.img_url);
        let after_img_url = patch.after_img_url.unwrap_or(existing.after_img_url);
        let severity = patch.severity.unwrap_or(existing.severity);
        let status = patch.status.unwrap_or(existing.status);

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE zones
            SET title = ?, description = ?, img_url = ?, after_img_url = ?, severity = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(&img_url)
        .bind(&after_img_url)
        .bind(severity)
        .bind(&status)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(Zone {
            id,
            latitude: existing.latitude,
            longitude: existing.longitude,
            title,
            description,
            img_url,
            after_img_url,
            severity,
            status,
            reported_by: existing.reported_by,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a zone
    pub async fn delete_zone(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM zones WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
