use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{CategoryQuery, CategoryRequest};
use super::repo_types::{CategoryFilter, CategorySort};
use super::services;
use crate::{
    auth::{extractors::AuthUser, policy::require_role},
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    pagination::{PageRequest, SortOrder},
    state::AppState,
    users::repo_types::Role,
    validation::{validate_category_name, validate_description},
    views::CategoryView,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/category", get(list_categories))
        .route("/category/:id", get(get_category))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/category", axum::routing::post(create_category))
        .route(
            "/category/:id",
            axum::routing::put(update_category).delete(delete_category),
        )
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Category with ID {id} not found"))
}

fn validate(payload: &CategoryRequest) -> AppResult<()> {
    validate_category_name(&payload.name)?;
    validate_description(&payload.description)
}

impl CategoryQuery {
    fn into_parts(self) -> AppResult<(CategoryFilter, PageRequest)> {
        let page = PageRequest::new(self.page, self.page_size)?;
        let filter = CategoryFilter {
            search: self
                .search_term
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort: CategorySort::parse(self.sort_by.as_deref()),
            order: SortOrder::parse_or(self.sort_order.as_deref(), SortOrder::Asc),
        };
        Ok((filter, page))
    }
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<CategoryQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&caller, Role::User)?;
    let (filter, page) = query.into_parts()?;
    let result = services::list(&state, &filter, page).await?;
    Ok((result.headers(), Json(result)))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CategoryView>> {
    require_role(&caller, Role::User)?;
    services::get_by_id(&state, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&caller, Role::User)?;
    validate(&payload)?;

    let view = services::add(&state, payload.name.trim(), &payload.description).await?;
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/category/{}", view.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(view)))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<StatusCode> {
    require_role(&caller, Role::User)?;
    validate(&payload)?;

    if services::update(&state, id, payload.name.trim(), &payload.description).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_role(&caller, Role::User)?;
    if services::delete(&state, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!(category_id = %id, "delete of missing category");
        Err(not_found(id))
    }
}
