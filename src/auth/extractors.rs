use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;

use super::session::{find_cookie, SessionKeys};
use crate::{error::AppError, state::AppState};

/// The authenticated caller, resolved from the session cookie or a bearer
/// token. Every protected handler takes one of these.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api = parts.uri.path().starts_with("/api/");
        let rejected = AppError::Unauthenticated { api };
        let keys = SessionKeys::from_ref(state);

        let from_cookie = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| find_cookie(h, &keys.cookie_name));
        let from_bearer = || {
            parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
        };
        let Some(token) = from_cookie.or_else(from_bearer) else {
            return Err(rejected);
        };

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired session");
                return Err(rejected);
            }
        };

        // The account may have been deleted since the session was issued.
        match state.store.find_user_by_id(claims.sub).await? {
            Some(user) => Ok(CurrentUser {
                id: user.id,
                username: user.username,
            }),
            None => {
                warn!(user_id = claims.sub, "session for missing user");
                Err(rejected)
            }
        }
    }
}
