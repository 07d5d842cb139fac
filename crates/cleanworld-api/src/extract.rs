//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cleanworld_auth::Principal;

use crate::error::ApiError;

/// Extractor for the authenticated principal (required).
///
/// Reads the `Principal` the authentication filter placed in the request
/// extensions. Handlers behind an `Authenticated` or role rule can rely
/// on it being present; using it on a public route turns that route into
/// an authenticated one.
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
