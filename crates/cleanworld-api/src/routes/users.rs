//! User account and session routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use cleanworld_auth::{hash_password, verify_password};
use cleanworld_db::{NewUser, Role, User, UserPatch};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

use super::types::{
    CheckEmailQuery, CheckUserQuery, ExistsResponse, LoginRequest, LoginResponse,
    PatchUserRequest, RegisterRequest, UpdateUserRequest,
};

// ==================== Input Validation ====================

/// Maximum allowed display name length
const MAX_NAME_LENGTH: usize = 64;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn parse_role(value: &str) -> Result<Role, ApiError> {
    Role::from_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", value)))
}

/// Well-formed digest that never matches any password; verified on login
/// when the email is unknown so both failure paths cost the same.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

// ==================== Session Routes ====================

/// POST /users/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for {}", request.email);

    let user_result = state.db.get_user_by_email(&request.email).await?;

    // Always run a verification so an unknown email costs the same as a
    // wrong password
    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(ApiError::Auth(cleanworld_auth::AuthError::InvalidCredentials)),
    };

    let token = state.auth.tokens.issue(&user.email)?;

    info!("User {} logged in", user.email);

    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        token,
    }))
}

/// POST /users (open registration)
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    debug!("Registering user: {}", request.email);

    let password_hash = hash_password(&request.password)?;

    // Self-registered accounts start at the lowest tier; promotion is an
    // administrative action
    let user = state
        .db
        .insert_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
            avatar: request.avatar,
            role: Role::Guest,
        })
        .await?;

    info!("Registered user: {}", user.email);

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/check-email?email=...
async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state.db.email_exists(&query.email).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// GET /users/check-user?name=...
async fn check_user(
    State(state): State<AppState>,
    Query(query): Query<CheckUserQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state.db.name_exists(&query.name).await?;
    Ok(Json(ExistsResponse { exists }))
}

// ==================== User Routes ====================

/// GET /users (admin via route policy)
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users))
}

/// GET /users/{id} (self or admin)
async fn get_user(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    if !principal.can_act_on_user(id) {
        return Err(ApiError::Forbidden);
    }

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user))
}

/// PATCH /users/edit/{id} (self or admin; role/points changes admin only)
async fn patch_user(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PatchUserRequest>,
) -> Result<Json<User>, ApiError> {
    if !principal.can_act_on_user(id) {
        return Err(ApiError::Forbidden);
    }
    if (request.role.is_some() || request.points.is_some()) && !principal.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    if let Some(name) = &request.name {
        validate_name(name)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let role = request.role.as_deref().map(parse_role).transpose()?;

    debug!("Patching user: {}", id);

    let patch = UserPatch {
        name: request.name,
        email: request.email,
        password_hash,
        avatar: request.avatar,
        points: request.points,
        role,
    };

    let user = state
        .db
        .update_user(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", user.email);

    Ok(Json(user))
}

/// PUT /users/{id} (admin via route policy; full replacement)
async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let role = parse_role(&request.role)?;
    let password_hash = hash_password(&request.password)?;

    debug!("Replacing user: {}", id);

    let patch = UserPatch {
        name: Some(request.name),
        email: Some(request.email),
        password_hash: Some(password_hash),
        avatar: Some(request.avatar),
        points: Some(request.points),
        role: Some(role),
    };

    let user = state
        .db
        .update_user(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Replaced user: {}", user.email);

    Ok(Json(user))
}

/// DELETE /users/{id} (admin via route policy)
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.db.delete_user(id).await?;

    if deleted {
        info!("Deleted user: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/login", post(login))
        .route("/users", post(register).get(list_users))
        .route("/users/check-email", get(check_email))
        .route("/users/check-user", get(check_user))
        .route("/users/edit/{id}", patch(patch_user))
        .route(
            "/users/{id}",
            get(get_user).put(replace_user).delete(delete_user),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_digest_is_wellformed_and_never_matches() {
        // The digest must parse (a malformed one would turn unknown-email
        // logins into 500s) and must fail verification for any input
        assert!(!verify_password("password123", DUMMY_HASH).unwrap());
        assert!(!verify_password("", DUMMY_HASH).unwrap());
    }
}
