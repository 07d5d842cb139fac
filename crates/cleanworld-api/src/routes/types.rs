//! Request/Response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Distinguishes an absent field (outer `None`) from an explicit `null`
/// (`Some(None)`), so a partial update can clear a nullable column.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub token: String,
}

// ==================== User Types ====================

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Existence check query (?email=... / ?name=...)
#[derive(Deserialize)]
pub struct CheckEmailQuery {
    pub email: String,
}

#[derive(Deserialize)]
pub struct CheckUserQuery {
    pub name: String,
}

/// Existence check response
#[derive(Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Full user replacement (admin)
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    /// Plaintext; re-hashed before storage
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub points: i64,
    pub role: String,
}

/// Typed partial user update.
///
/// Unknown keys are rejected rather than silently dropped, so a typo'd
/// field name fails loudly instead of leaving the record unchanged.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PatchUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

// ==================== Zone Types ====================

/// Create zone request
#[derive(Deserialize)]
pub struct CreateZoneRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    pub severity: i64,
}

/// Typed partial zone update
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PatchZoneRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub img_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub after_img_url: Option<Option<String>>,
    #[serde(default)]
    pub severity: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

// ==================== Event Types ====================

/// Create event request
#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub datetime: DateTime<Utc>,
    pub reward_points: i64,
    pub zone_id: i64,
}

/// Typed partial event update
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PatchEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reward_points: Option<i64>,
}
