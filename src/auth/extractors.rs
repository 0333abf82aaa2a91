use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::services::verify_session;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::User,
};

/// The authenticated caller, resolved fresh from the store on every request.
pub struct CurrentUser(pub User);

/// `Authorization: Bearer <token>`; the scheme is matched in either case.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Missing token, bad token, expired token and vanished user all reject the same way.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    verify_session(state, token).await
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(state, &parts.headers).await.map(CurrentUser)
    }
}
