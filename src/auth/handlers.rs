use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    extractors::AuthUser,
    services,
};
use crate::{
    error::{AppError, AppResult},
    extract::Json,
    state::AppState,
    validation::{is_valid_email, validate_email, validate_password, validate_person_name},
    views::UserView,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_string();
    validate_person_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let response = services::register(&state, &payload.name, &payload.email, &payload.password)
        .await
        .map_err(AppError::conflict_as_bad_request)?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(AppError::validation("Invalid email format"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }

    let response = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<UserView>> {
    services::current_user(&state, caller.id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            warn!(user_id = %caller.id, "token for missing user");
            AppError::NotFound("User not found".into())
        })
}
