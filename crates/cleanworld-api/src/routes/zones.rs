//! Reported zone routes
//!
//! Reads are open to any authenticated principal; mutations are
//! admin-only via the route policy.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use cleanworld_db::{NewZone, Zone, ZonePatch};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

use super::types::{CreateZoneRequest, PatchZoneRequest};

/// GET /zones
async fn list_zones(State(state): State<AppState>) -> Result<Json<Vec<Zone>>, ApiError> {
    let zones = state.db.list_zones().await?;
    Ok(Json(zones))
}

/// GET /zones/{id}
async fn get_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Zone>, ApiError> {
    let zone = state
        .db
        .get_zone(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Zone: {}", id)))?;

    Ok(Json(zone))
}

/// POST /zones
async fn create_zone(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<(StatusCode, Json<Zone>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    debug!("Creating zone: {}", request.title);

    let zone = state
        .db
        .insert_zone(NewZone {
            latitude: request.latitude,
            longitude: request.longitude,
            title: request.title,
            description: request.description,
            img_url: request.img_url,
            severity: request.severity,
            reported_by: Some(principal.user_id),
        })
        .await?;

    info!("Created zone {} ({})", zone.id, zone.title);

    Ok((StatusCode::CREATED, Json(zone)))
}

/// PATCH /zones/{id}
async fn patch_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PatchZoneRequest>,
) -> Result<Json<Zone>, ApiError> {
    debug!("Patching zone: {}", id);

    let patch = ZonePatch {
        title: request.title,
        description: request.description,
        img_url: request.img_url,
        after_img_url: request.after_img_url,
        severity: request.severity,
        status: request.status,
    };

    let zone = state
        .db
        .update_zone(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Zone: {}", id)))?;

    info!("Updated zone {}", zone.id);

    Ok(Json(zone))
}

/// DELETE /zones/{id}
async fn delete_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.db.delete_zone(id).await?;

    if deleted {
        info!("Deleted zone {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Zone: {}", id)))
    }
}

/// Create zone routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/zones", get(list_zones).post(create_zone))
        .route(
            "/zones/{id}",
            get(get_zone).patch(patch_zone).delete(delete_zone),
        )
}
