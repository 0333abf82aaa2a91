use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, SignupRequest},
        services::{authenticate, create_account},
    },
    error::AppResult,
    state::AppState,
    users::dto::ProfileView,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.validate()?;
    let (user, token) =
        create_account(&state, &payload.email, &payload.password, &payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created successfully",
            data: ProfileView::from(&user),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;
    let (user, token) = authenticate(&state, &payload.email, &payload.password).await?;
    Ok(Json(AuthResponse {
        message: "Logged in successfully",
        data: ProfileView::from(&user),
        token,
    }))
}
