//! Clean-up event and attendance routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use cleanworld_db::{Event, EventPatch, NewEvent, UserSummary};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

use super::types::{CreateEventRequest, PatchEventRequest};

/// GET /events
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.db.list_events().await?;
    Ok(Json(events))
}

/// GET /events/{id}
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .db
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event: {}", id)))?;

    Ok(Json(event))
}

/// POST /events
async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    // Events must hang off an existing zone
    state
        .db
        .get_zone(request.zone_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown zone: {}", request.zone_id)))?;

    debug!("Creating event: {}", request.title);

    let event = state
        .db
        .insert_event(NewEvent {
            title: request.title,
            description: request.description,
            datetime: request.datetime,
            reward_points: request.reward_points,
            zone_id: request.zone_id,
        })
        .await?;

    info!("Created event {} ({})", event.id, event.title);

    Ok((StatusCode::CREATED, Json(event)))
}

/// PATCH /events/{id}
async fn patch_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PatchEventRequest>,
) -> Result<Json<Event>, ApiError> {
    debug!("Patching event: {}", id);

    let patch = EventPatch {
        title: request.title,
        description: request.description,
        datetime: request.datetime,
        status: request.status,
        reward_points: request.reward_points,
    };

    let event = state
        .db
        .update_event(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event: {}", id)))?;

    info!("Updated event {}", event.id);

    Ok(Json(event))
}

/// DELETE /events/{id}
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.db.delete_event(id).await?;

    if deleted {
        info!("Deleted event {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Event: {}", id)))
    }
}

// ==================== Attendance Routes ====================

/// GET /events/{id}/attendees
async fn list_attendees(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    state
        .db
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event: {}", id)))?;

    let attendees = state.db.list_attendees(id).await?;
    Ok(Json(attendees))
}

/// POST /events/{id}/attendees (join as the calling principal)
async fn join_event(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event: {}", id)))?;

    state.db.add_attendee(id, principal.user_id).await?;

    info!("User {} joined event {}", principal.user_id, id);

    Ok(StatusCode::CREATED)
}

/// DELETE /events/{id}/attendees/{user_id} (self or admin)
async fn leave_event(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    if !principal.can_act_on_user(user_id) {
        return Err(ApiError::Forbidden);
    }

    let removed = state.db.remove_attendee(id, user_id).await?;

    if removed {
        info!("User {} left event {}", user_id, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Attendance: event {} user {}",
            id, user_id
        )))
    }
}

/// Create event routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(patch_event).delete(delete_event),
        )
        .route(
            "/events/{id}/attendees",
            get(list_attendees).post(join_event),
        )
        .route("/events/{id}/attendees/{user_id}", delete(leave_event))
}
