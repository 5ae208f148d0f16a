use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo_types::Role;
use super::services;
use crate::{
    auth::{
        extractors::AuthUser,
        policy::{ensure_self_or_admin, require_role},
    },
    error::{AppError, AppResult},
    extract::{Json, Path},
    state::AppState,
    validation::{validate_email, validate_password, validate_person_name},
    views::UserView,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/user", get(list_users).post(create_user))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/user/:id",
        get(get_user).put(update_user).delete(delete_user),
    )
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with ID {id} not found"))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<UserView>>> {
    require_role(&caller, Role::Admin)?;
    Ok(Json(services::list_all(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserView>> {
    require_role(&caller, Role::User)?;
    ensure_self_or_admin(&caller, id)?;
    services::get_by_id(&state, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserView>> {
    require_role(&caller, Role::User)?;
    payload.email = payload.email.trim().to_string();
    validate_person_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let view = services::create(&state, &payload.name, &payload.email, &payload.password)
        .await
        .map_err(AppError::conflict_as_bad_request)?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserView>> {
    require_role(&caller, Role::User)?;
    ensure_self_or_admin(&caller, id)?;
    payload.email = payload.email.trim().to_string();
    validate_person_name(&payload.name)?;
    validate_email(&payload.email)?;
    let password = payload.password.as_deref().filter(|p| !p.is_empty());
    if let Some(p) = password {
        validate_password(p)?;
    }

    let view = services::update(&state, id, &payload.name, &payload.email, password).await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_role(&caller, Role::User)?;
    ensure_self_or_admin(&caller, id)?;
    if services::delete(&state, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!(user_id = %id, "delete of missing user");
        Err(not_found(id))
    }
}
