use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::CategoryFilter;
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::pagination::{PageRequest, PagedResult};
use crate::state::AppState;
use crate::views::CategoryView;

fn still_referenced() -> AppError {
    AppError::Conflict("cannot delete category with associated expenses".into())
}

pub async fn list(
    state: &AppState,
    filter: &CategoryFilter,
    page: PageRequest,
) -> AppResult<PagedResult<CategoryView>> {
    let (categories, total) = state.categories.list(filter, page).await?;
    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let expenses = state.expenses.list_for_categories(&ids).await?;
    Ok(PagedResult::new(
        CategoryView::project_all(categories, expenses),
        page,
        total,
    ))
}

pub async fn get_by_id(state: &AppState, id: Uuid) -> AppResult<Option<CategoryView>> {
    let Some(category) = state.categories.find_by_id(id).await? else {
        return Ok(None);
    };
    let expenses = state.expenses.list_for_categories(&[id]).await?;
    Ok(Some(CategoryView::project(category, expenses)))
}

pub async fn add(state: &AppState, name: &str, description: &str) -> AppResult<CategoryView> {
    let category = state.categories.create(name, description).await?;
    info!(category_id = %category.id, "category created");
    Ok(CategoryView::project(category, Vec::new()))
}

pub async fn update(state: &AppState, id: Uuid, name: &str, description: &str) -> AppResult<bool> {
    let updated = state.categories.update(id, name, description).await?;
    if updated {
        info!(category_id = %id, "category updated");
    }
    Ok(updated)
}

/// Refuses while any expense still points at the category.
pub async fn delete(state: &AppState, id: Uuid) -> AppResult<bool> {
    if !state.categories.exists(id).await? {
        return Ok(false);
    }
    if state.categories.has_expenses(id).await? {
        warn!(category_id = %id, "category delete blocked by expenses");
        return Err(still_referenced());
    }

    match state.categories.delete(id).await {
        Ok(deleted) => {
            if deleted {
                info!(category_id = %id, "category deleted");
            }
            Ok(deleted)
        }
        Err(e) if is_foreign_key_violation(&e) => Err(still_referenced()),
        Err(e) => Err(e.into()),
    }
}
