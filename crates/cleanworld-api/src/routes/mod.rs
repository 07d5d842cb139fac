//! API routes

mod events;
mod health;
mod types;
mod users;
mod zones;

use axum::{Router, middleware};
use cleanworld_auth::{authenticate, authorize};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Create the main router.
///
/// The authentication filter is the outermost layer so every request has
/// its identity resolved (or left anonymous) before the authorization
/// layer consults the route policy.
pub fn create_router(state: AppState) -> Router {
    let auth = state.auth.clone();

    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(zones::routes())
        .merge(events::routes())
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth.clone(), authorize))
        .layer(middleware::from_fn_with_state(auth, authenticate))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use cleanworld_auth::{AuthState, Policy, TokenService, hash_password};
    use cleanworld_db::{Database, NewUser, Role};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let tokens = TokenService::new("test-secret-key", 3600);
        let auth = AuthState::new(tokens, db.clone(), Policy::cleanworld());
        let state = AppState::new(db, auth);

        (create_router(state.clone()), state)
    }

    async fn seed_user(state: &AppState, name: &str, email: &str, role: Role) -> (i64, String) {
        let user = state
            .db
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password("password123").unwrap(),
                avatar: None,
                role,
            })
            .await
            .unwrap();

        let token = state.auth.tokens.issue(&user.email).unwrap();
        (user.id, token)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _state) = test_app().await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_anonymous_request_is_unauthorized() {
        let (app, _state) = test_app().await;

        let response = app.oneshot(get("/zones")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_falls_back_to_anonymous() {
        let (app, _state) = test_app().await;

        let response = app
            .oneshot(get_with_token("/zones", "not-a-real-token"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_issues_working_token() {
        let (app, state) = test_app().await;
        seed_user(&state, "ana", "ana@example.com", Role::Guest).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/users/login",
                None,
                json!({"email": "ana@example.com", "password": "password123"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["email"], "ana@example.com");
        let token = body["token"].as_str().unwrap().to_string();

        // The issued token opens authenticated routes
        let response = app.oneshot(get_with_token("/zones", &token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let (app, state) = test_app().await;
        seed_user(&state, "ana", "ana@example.com", Role::Guest).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/users/login",
                None,
                json!({"email": "ana@example.com", "password": "wrong-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(json_request(
                "POST",
                "/users/login",
                None,
                json!({"email": "nobody@example.com", "password": "password123"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_registration_and_duplicate_email_conflict() {
        let (app, _state) = test_app().await;

        let body = json!({
            "name": "ana",
            "email": "ana@example.com",
            "password": "password123"
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/users", None, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["role"], "guest");
        // Credentials never leave the server
        assert!(created.get("password_hash").is_none());

        let response = app
            .oneshot(json_request("POST", "/users", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_mutations_require_admin() {
        let (app, state) = test_app().await;
        let (_id, guest_token) = seed_user(&state, "ana", "ana@example.com", Role::Guest).await;
        let (_id, admin_token) = seed_user(&state, "root", "root@example.com", Role::Admin).await;

        let zone = json!({
            "latitude": 37.55,
            "longitude": 126.99,
            "title": "Riverside litter",
            "severity": 3
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/zones", Some(&guest_token), zone.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(json_request("POST", "/zones", Some(&admin_token), zone))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["status"], "reported");
    }

    #[tokio::test]
    async fn test_get_user_is_self_or_admin() {
        let (app, state) = test_app().await;
        let (ana_id, ana_token) = seed_user(&state, "ana", "ana@example.com", Role::User).await;
        let (bob_id, _bob_token) = seed_user(&state, "bob", "bob@example.com", Role::User).await;
        let (_id, admin_token) = seed_user(&state, "root", "root@example.com", Role::Admin).await;

        // Own record: allowed
        let response = app
            .clone()
            .oneshot(get_with_token(&format!("/users/{}", ana_id), &ana_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Someone else's record: forbidden
        let response = app
            .clone()
            .oneshot(get_with_token(&format!("/users/{}", bob_id), &ana_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Admin can read anyone
        let response = app
            .oneshot(get_with_token(&format!("/users/{}", bob_id), &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_patch_role_requires_admin() {
        let (app, state) = test_app().await;
        let (ana_id, ana_token) = seed_user(&state, "ana", "ana@example.com", Role::User).await;
        let (_id, admin_token) = seed_user(&state, "root", "root@example.com", Role::Admin).await;

        // Self-edit of plain fields is fine
        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/users/edit/{}", ana_id),
                Some(&ana_token),
                json!({"name": "ana-renamed"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Self-promotion is not
        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/users/edit/{}", ana_id),
                Some(&ana_token),
                json!({"role": "admin"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Admins promote
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/users/edit/{}", ana_id),
                Some(&admin_token),
                json!({"role": "admin"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_patch_distinguishes_null_from_absent() {
        let (app, state) = test_app().await;
        let (_id, admin_token) = seed_user(&state, "root", "root@example.com", Role::Admin).await;

        let zone = state
            .db
            .insert_zone(cleanworld_db::NewZone {
                latitude: 37.55,
                longitude: 126.99,
                title: "Riverside litter".to_string(),
                description: Some("Plastic bags along the bank".to_string()),
                img_url: None,
                severity: 3,
                reported_by: None,
            })
            .await
            .unwrap();

        // A patch that omits the field leaves it untouched
        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/zones/{}", zone.id),
                Some(&admin_token),
                json!({"title": "Riverbank"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["description"], "Plastic bags along the bank");

        // An explicit null clears it
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/zones/{}", zone.id),
                Some(&admin_token),
                json!({"description": null}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["description"].is_null());
    }

    #[tokio::test]
    async fn test_patch_rejects_unknown_fields() {
        let (app, state) = test_app().await;
        let (ana_id, ana_token) = seed_user(&state, "ana", "ana@example.com", Role::User).await;

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/users/edit/{}", ana_id),
                Some(&ana_token),
                json!({"nmae": "typo"}),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_event_attendance_flow() {
        let (app, state) = test_app().await;
        let (ana_id, ana_token) = seed_user(&state, "ana", "ana@example.com", Role::User).await;
        let (_bob_id, bob_token) = seed_user(&state, "bob", "bob@example.com", Role::User).await;
        let (_id, admin_token) = seed_user(&state, "root", "root@example.com", Role::Admin).await;

        let zone = state
            .db
            .insert_zone(cleanworld_db::NewZone {
                latitude: 37.55,
                longitude: 126.99,
                title: "Riverside litter".to_string(),
                description: None,
                img_url: None,
                severity: 3,
                reported_by: None,
            })
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/events",
                Some(&admin_token),
                json!({
                    "title": "Saturday cleanup",
                    "datetime": "2026-09-05T10:00:00Z",
                    "reward_points": 50,
                    "zone_id": zone.id
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let event = body_json(response).await;
        let event_id = event["id"].as_i64().unwrap();

        // Ana joins as herself
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/events/{}/attendees", event_id),
                Some(&ana_token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Joining twice conflicts
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/events/{}/attendees", event_id),
                Some(&ana_token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(get_with_token(
                &format!("/events/{}/attendees", event_id),
                &bob_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let attendees = body_json(response).await;
        assert_eq!(attendees.as_array().unwrap().len(), 1);

        // Bob cannot remove Ana's attendance
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/events/{}/attendees/{}", event_id, ana_id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", bob_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // But an admin can
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/events/{}/attendees/{}", event_id, ana_id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
