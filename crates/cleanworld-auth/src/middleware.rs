//! Authentication filter and authorization layer
//!
//! Two middlewares applied in sequence. `authenticate` runs first and
//! never rejects: it turns a valid bearer token into a `Principal` in the
//! request extensions and otherwise lets the request through anonymously.
//! `authorize` then evaluates the route policy against whatever identity
//! (or absence of one) the filter produced.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use cleanworld_db::Database;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::policy::Policy;
use crate::principal::Principal;
use crate::token::TokenService;

/// Shared state for the auth middlewares
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub db: Database,
    pub policy: Arc<Policy>,
}

impl AuthState {
    pub fn new(tokens: TokenService, db: Database, policy: Policy) -> Self {
        Self {
            tokens: Arc::new(tokens),
            db,
            policy: Arc::new(policy),
        }
    }
}

/// Resolve the request's identity from its bearer token, if any.
///
/// Fails open to anonymous on every path: missing header, malformed
/// header, invalid token, unknown subject. The sub-reason is logged and
/// the request continues without a `Principal`; rejection is the
/// authorization layer's job, not this filter's.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = bearer {
        match state.tokens.validate(&token) {
            Ok(subject) => match state.db.get_user_by_email(&subject).await {
                Ok(Some(user)) => {
                    debug!(user_id = user.id, "Authenticated request for {}", subject);
                    request.extensions_mut().insert(Principal::from_user(&user));
                }
                Ok(None) => {
                    // Valid signature but the account no longer exists
                    warn!("Token subject not found: {}", subject);
                }
                Err(e) => {
                    warn!("User lookup failed during authentication: {}", e);
                }
            },
            Err(e) => {
                debug!("Rejected bearer token: {}", e);
            }
        }
    }

    next.run(request).await
}

/// Enforce the route policy against the resolved identity
pub async fn authorize(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = request.extensions().get::<Principal>();

    state
        .policy
        .check(request.method(), request.uri().path(), principal)?;

    Ok(next.run(request).await)
}
