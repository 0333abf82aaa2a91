use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MessageResponse, PasswordRequest, ProfilePatch, ProfileResponse, ProfileView},
    services::{apply_profile_patch, change_password, delete_account},
};
use crate::{
    auth::{dto::check_password, extractors::CurrentUser},
    error::AppResult,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).patch(update_profile).delete(delete_profile),
        )
        .route("/password", put(update_password))
}

#[instrument(skip(user))]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        message: "Profile fetched successfully",
        data: ProfileView::from(&user),
    })
}

#[instrument(skip(state, user, patch))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> AppResult<Json<ProfileResponse>> {
    let user = apply_profile_patch(&state, &user, &patch).await?;
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        data: ProfileView::from(&user),
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    check_password(&payload.password)?;
    change_password(&state, &user, &payload.password).await?;
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

#[instrument(skip(state, user))]
pub async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    delete_account(&state, &user).await?;
    Ok(Json(MessageResponse {
        message: "Profile deleted successfully",
    }))
}
