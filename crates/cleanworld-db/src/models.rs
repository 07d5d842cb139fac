//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from raw values
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRole(s) => write!(f, "Invalid role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role tier
///
/// Stored as an integer on the user row (0/1/2). The variants form a total
/// order (`Guest < User < Admin`), but authorization rules check membership
/// in explicit role sets rather than comparing against a threshold, since
/// some rules require a non-contiguous set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Integer form used in the `users.role` column
    pub fn as_i64(&self) -> i64 {
        match self {
            Role::Guest => 0,
            Role::User => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_i64(value: i64) -> Option<Role> {
        match value {
            0 => Some(Role::Guest),
            1 => Some(Role::User),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub points: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendee summary exposed on event responses (no credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub points: i64,
}

/// New user (for insertion); the password must already be hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub role: Role,
}

/// Typed partial update for a user
///
/// Each field is optional; `None` leaves the stored value untouched.
/// Password values arrive here already hashed by the caller.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<Option<String>>,
    pub points: Option<i64>,
    pub role: Option<Role>,
}

/// Reported map zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub img_url: Option<String>,
    pub after_img_url: Option<String>,
    pub severity: i64,
    pub status: String,
    /// User who reported the zone, if known
    pub reported_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New zone (for insertion)
#[derive(Debug, Clone)]
pub struct NewZone {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub img_url: Option<String>,
    pub severity: i64,
    pub reported_by: Option<i64>,
}

/// Typed partial update for a zone
#[derive(Debug, Clone, Default)]
pub struct ZonePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub img_url: Option<Option<String>>,
    pub after_img_url: Option<Option<String>>,
    pub severity: Option<i64>,
    pub status: Option<String>,
}

/// Clean-up event tied to a zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub datetime: DateTime<Utc>,
    pub status: String,
    pub reward_points: i64,
    pub zone_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New event (for insertion)
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub datetime: DateTime<Utc>,
    pub reward_points: i64,
    pub zone_id: i64,
}

/// Typed partial update for an event
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub datetime: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub reward_points: Option<i64>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_int: i64 = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            avatar: row.try_get("avatar")?,
            points: row.try_get("points")?,
            role: Role::from_i64(role_int).unwrap_or(Role::Guest),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for UserSummary {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(UserSummary {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            avatar: row.try_get("avatar")?,
            points: row.try_get("points")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Zone {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Zone {
            id: row.try_get("id")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            img_url: row.try_get("img_url")?,
            after_img_url: row.try_get("after_img_url")?,
            severity: row.try_get("severity")?,
            status: row.try_get("status")?,
            reported_by: row.try_get("reported_by")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Event {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            datetime: parse_datetime_or_now(&row.try_get::<String, _>("datetime")?),
            status: row.try_get("status")?,
            reward_points: row.try_get("reward_points")?,
            zone_id: row.try_get("zone_id")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}
