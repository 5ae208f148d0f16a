use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{ExpenseQuery, ExpenseRequest};
use super::repo_types::{ExpenseFilter, ExpenseInput, ExpenseSort};
use super::services::{self, UpdateOutcome};
use crate::{
    auth::{extractors::AuthUser, policy::require_role},
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    pagination::{PageRequest, SortOrder},
    state::AppState,
    users::repo_types::Role,
    validation::{validate_amount, validate_receiver},
    views::ExpenseView,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/expense", get(list_expenses))
        .route("/expense/:id", get(get_expense))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/expense", post(create_expense))
        .route("/expense/:id", put(update_expense).delete(delete_expense))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Expense with ID {id} not found"))
}

fn invalid_references() -> AppError {
    AppError::validation("UserId or CategoryId is invalid")
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ExpenseQuery {
    fn into_parts(self) -> AppResult<(ExpenseFilter, PageRequest)> {
        let page = PageRequest::new(self.page, self.page_size)?;
        let filter = ExpenseFilter {
            search: non_empty(self.search_term),
            category_id: self.category_id,
            user_id: self.user_id,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            start_date: self.start_date,
            end_date: self.end_date,
            receiver: non_empty(self.receiver),
            sort: ExpenseSort::parse(self.sort_by.as_deref()),
            order: SortOrder::parse_or(self.sort_order.as_deref(), SortOrder::Desc),
        };
        Ok((filter, page))
    }
}

impl ExpenseRequest {
    fn into_input(self) -> AppResult<ExpenseInput> {
        validate_amount(self.amount)?;
        validate_receiver(&self.receiver)?;
        Ok(ExpenseInput {
            amount: self.amount,
            payment_date: self.payment_date,
            receiver: self.receiver.trim().to_string(),
            user_id: self.user_id,
            category_id: self.category_id,
        })
    }
}

#[instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ExpenseQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&caller, Role::User)?;
    let (filter, page) = query.into_parts()?;
    let result = services::list(&state, &filter, page).await?;
    Ok((result.headers(), Json(result)))
}

#[instrument(skip(state))]
pub async fn get_expense(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ExpenseView>> {
    require_role(&caller, Role::User)?;
    services::get_by_id(&state, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip(state, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<ExpenseRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&caller, Role::User)?;
    let input = payload.into_input()?;

    let Some(view) = services::add(&state, &input).await? else {
        return Err(invalid_references());
    };
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/expense/{}", view.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(view)))
}

#[instrument(skip(state, payload))]
pub async fn update_expense(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseRequest>,
) -> AppResult<StatusCode> {
    require_role(&caller, Role::User)?;
    let input = payload.into_input()?;

    match services::update(&state, id, &input).await? {
        UpdateOutcome::Updated => Ok(StatusCode::NO_CONTENT),
        UpdateOutcome::NotFound => Err(not_found(id)),
        UpdateOutcome::InvalidReferences => Err(invalid_references()),
    }
}

#[instrument(skip(state))]
pub async fn delete_expense(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_role(&caller, Role::User)?;
    if services::delete(&state, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!(expense_id = %id, "delete of missing expense");
        Err(not_found(id))
    }
}
