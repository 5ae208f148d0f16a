use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{ExpenseFilter, ExpenseInput};
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::pagination::{PageRequest, PagedResult};
use crate::state::AppState;
use crate::views::{ExpenseView, Nesting};

/// Result of overwriting an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    InvalidReferences,
}

async fn references_exist(state: &AppState, input: &ExpenseInput) -> AppResult<bool> {
    Ok(state.users.exists(input.user_id).await?
        && state.categories.exists(input.category_id).await?)
}

/// Rejects inverted ranges before they reach the store.
fn check_ranges(filter: &ExpenseFilter) -> AppResult<()> {
    if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount) {
        if min > max {
            return Err(AppError::validation(
                "minAmount must be less than or equal to maxAmount",
            ));
        }
    }
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(AppError::validation(
                "startDate must be earlier than or equal to endDate",
            ));
        }
    }
    Ok(())
}

pub async fn list(
    state: &AppState,
    filter: &ExpenseFilter,
    page: PageRequest,
) -> AppResult<PagedResult<ExpenseView>> {
    check_ranges(filter)?;
    let (rows, total) = state.expenses.list(filter, page).await?;
    Ok(PagedResult::new(rows, page, total)
        .map(|d| ExpenseView::from_details(d, Nesting::CategoryAndUser)))
}

pub async fn get_by_id(state: &AppState, id: Uuid) -> AppResult<Option<ExpenseView>> {
    Ok(state
        .expenses
        .find_by_id(id)
        .await?
        .map(|d| ExpenseView::from_details(d, Nesting::CategoryAndUser)))
}

/// `None` when the user or category does not exist; nothing is written then.
pub async fn add(state: &AppState, input: &ExpenseInput) -> AppResult<Option<ExpenseView>> {
    if !references_exist(state, input).await? {
        warn!(user_id = %input.user_id, category_id = %input.category_id, "expense references missing rows");
        return Ok(None);
    }

    let expense = match state.expenses.create(input).await {
        Ok(e) => e,
        Err(e) if is_foreign_key_violation(&e) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    info!(expense_id = %expense.id, "expense created");

    match state.expenses.find_by_id(expense.id).await? {
        Some(details) => Ok(Some(ExpenseView::from_details(
            details,
            Nesting::CategoryAndUser,
        ))),
        None => Ok(Some(ExpenseView::project(expense, None, None))),
    }
}

/// Overwrites every mutable field once the expense and its new keys check out.
pub async fn update(state: &AppState, id: Uuid, input: &ExpenseInput) -> AppResult<UpdateOutcome> {
    if state.expenses.find_by_id(id).await?.is_none() {
        return Ok(UpdateOutcome::NotFound);
    }
    if !references_exist(state, input).await? {
        warn!(expense_id = %id, "expense update references missing rows");
        return Ok(UpdateOutcome::InvalidReferences);
    }

    match state.expenses.update(id, input).await {
        Ok(true) => {
            info!(expense_id = %id, "expense updated");
            Ok(UpdateOutcome::Updated)
        }
        Ok(false) => Ok(UpdateOutcome::NotFound),
        Err(e) if is_foreign_key_violation(&e) => Ok(UpdateOutcome::InvalidReferences),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete(state: &AppState, id: Uuid) -> AppResult<bool> {
    let deleted = state.expenses.delete(id).await?;
    if deleted {
        info!(expense_id = %id, "expense deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::services as categories;
    use crate::expenses::repo_types::ExpenseSort;
    use crate::pagination::SortOrder;
    use crate::users::services as users;
    use time::macros::datetime;
    use time::OffsetDateTime;

    struct Fixture {
        state: AppState,
        ana: Uuid,
        bob: Uuid,
        food: Uuid,
        rent: Uuid,
    }

    async fn fixture() -> Fixture {
        let state = AppState::fake();
        let ana = users::create(&state, "Ana", "ana@example.com", "secret1").await.unwrap().id;
        let bob = users::create(&state, "Bob", "bob@example.com", "secret1").await.unwrap().id;
        let food = categories::add(&state, "Food", "").await.unwrap().id;
        let rent = categories::add(&state, "Rent", "").await.unwrap().id;
        Fixture { state, ana, bob, food, rent }
    }

    fn input(amount: f64, day: OffsetDateTime, receiver: &str, user_id: Uuid, category_id: Uuid) -> ExpenseInput {
        ExpenseInput {
            amount,
            payment_date: day,
            receiver: receiver.into(),
            user_id,
            category_id,
        }
    }

    async fn total(state: &AppState) -> i64 {
        list(state, &ExpenseFilter::default(), PageRequest::new(Some(1), Some(100)).unwrap())
            .await
            .unwrap()
            .pagination
            .total_count
    }

    #[tokio::test]
    async fn add_with_missing_references_writes_nothing() {
        let f = fixture().await;
        let day = datetime!(2025-06-01 09:00 UTC);

        let missing_user = input(5.0, day, "Shop", Uuid::new_v4(), f.food);
        assert!(add(&f.state, &missing_user).await.unwrap().is_none());
        let missing_category = input(5.0, day, "Shop", f.ana, Uuid::new_v4());
        assert!(add(&f.state, &missing_category).await.unwrap().is_none());
        assert_eq!(total(&f.state).await, 0);

        let view = add(&f.state, &input(5.0, day, "Shop", f.ana, f.food))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.category.unwrap().name, "Food");
        assert_eq!(view.user.unwrap().email, "ana@example.com");
        assert_eq!(total(&f.state).await, 1);
    }

    #[tokio::test]
    async fn filters_are_conjunctive_and_inclusive() {
        let f = fixture().await;
        let d1 = datetime!(2025-01-01 00:00 UTC);
        let d2 = datetime!(2025-02-01 00:00 UTC);
        let d3 = datetime!(2025-03-01 00:00 UTC);
        for i in [
            input(10.0, d1, "Cafe Luna", f.ana, f.food),
            input(20.0, d2, "Bakery", f.ana, f.food),
            input(30.0, d3, "Landlord", f.ana, f.rent),
            input(20.0, d2, "cafe sol", f.bob, f.food),
        ] {
            add(&f.state, &i).await.unwrap().unwrap();
        }
        let page = PageRequest::default();

        let by_amount = ExpenseFilter {
            min_amount: Some(20.0),
            max_amount: Some(20.0),
            ..ExpenseFilter::default()
        };
        assert_eq!(list(&f.state, &by_amount, page).await.unwrap().data.len(), 2);

        let by_date_and_user = ExpenseFilter {
            start_date: Some(d1),
            end_date: Some(d2),
            user_id: Some(f.ana),
            ..ExpenseFilter::default()
        };
        let rows = list(&f.state, &by_date_and_user, page).await.unwrap().data;
        let receivers: Vec<_> = rows.iter().map(|e| e.receiver.as_str()).collect();
        assert_eq!(receivers, ["Bakery", "Cafe Luna"]);

        let by_receiver = ExpenseFilter {
            receiver: Some("CAFE".into()),
            category_id: Some(f.food),
            ..ExpenseFilter::default()
        };
        assert_eq!(list(&f.state, &by_receiver, page).await.unwrap().data.len(), 2);

        let search_user_name = ExpenseFilter {
            search: Some("bob".into()),
            ..ExpenseFilter::default()
        };
        let rows = list(&f.state, &search_user_name, page).await.unwrap().data;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, f.bob);

        let search_category = ExpenseFilter {
            search: Some("ren".into()),
            ..ExpenseFilter::default()
        };
        assert_eq!(list(&f.state, &search_category, page).await.unwrap().data.len(), 1);
    }

    #[tokio::test]
    async fn inverted_ranges_are_rejected() {
        let f = fixture().await;
        let amounts = ExpenseFilter {
            min_amount: Some(50.0),
            max_amount: Some(10.0),
            ..ExpenseFilter::default()
        };
        assert!(matches!(
            list(&f.state, &amounts, PageRequest::default()).await,
            Err(AppError::Validation(_))
        ));
        let dates = ExpenseFilter {
            start_date: Some(datetime!(2025-02-01 00:00 UTC)),
            end_date: Some(datetime!(2025-01-01 00:00 UTC)),
            ..ExpenseFilter::default()
        };
        assert!(matches!(
            list(&f.state, &dates, PageRequest::default()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn default_sort_is_payment_date_desc_and_paging_is_complete() {
        let f = fixture().await;
        for day in 1..=9u8 {
            let when = datetime!(2025-05-01 00:00 UTC).replace_day(day).unwrap();
            add(&f.state, &input(day as f64, when, "Shop", f.ana, f.food))
                .await
                .unwrap();
        }

        let fallback = ExpenseFilter {
            sort: ExpenseSort::parse(Some("nonsense")),
            order: SortOrder::parse_or(None, SortOrder::Desc),
            ..ExpenseFilter::default()
        };
        let mut seen = Vec::new();
        let first = list(&f.state, &fallback, PageRequest::new(Some(1), Some(4)).unwrap())
            .await
            .unwrap();
        assert_eq!(first.pagination.total_pages, 3);
        for p in 1..=3 {
            let page = list(&f.state, &fallback, PageRequest::new(Some(p), Some(4)).unwrap())
                .await
                .unwrap();
            seen.extend(page.data.into_iter().map(|e| e.amount));
        }
        assert_eq!(seen, [9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    }

    #[tokio::test]
    async fn sort_by_amount_ascending() {
        let f = fixture().await;
        let day = datetime!(2025-06-01 00:00 UTC);
        for amount in [3.5, 1.0, 2.25] {
            add(&f.state, &input(amount, day, "Shop", f.ana, f.food)).await.unwrap();
        }
        let filter = ExpenseFilter {
            sort: ExpenseSort::Amount,
            order: SortOrder::Asc,
            ..ExpenseFilter::default()
        };
        let amounts: Vec<f64> = list(&f.state, &filter, PageRequest::default())
            .await
            .unwrap()
            .data
            .iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, [1.0, 2.25, 3.5]);
    }

    #[tokio::test]
    async fn update_distinguishes_missing_expense_from_bad_keys() {
        let f = fixture().await;
        let day = datetime!(2025-06-01 00:00 UTC);
        let created = add(&f.state, &input(5.0, day, "Shop", f.ana, f.food))
            .await
            .unwrap()
            .unwrap();

        let moved = input(7.5, day, "Market", f.bob, f.rent);
        assert_eq!(
            update(&f.state, Uuid::new_v4(), &moved).await.unwrap(),
            UpdateOutcome::NotFound
        );
        let broken = input(7.5, day, "Market", f.bob, Uuid::new_v4());
        assert_eq!(
            update(&f.state, created.id, &broken).await.unwrap(),
            UpdateOutcome::InvalidReferences
        );
        assert_eq!(
            update(&f.state, created.id, &moved).await.unwrap(),
            UpdateOutcome::Updated
        );

        let after = get_by_id(&f.state, created.id).await.unwrap().unwrap();
        assert_eq!(after.amount, 7.5);
        assert_eq!(after.receiver, "Market");
        assert_eq!(after.user_id, f.bob);
        assert_eq!(after.category_id, f.rent);
        assert_eq!(after.category.unwrap().name, "Rent");
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_expenses() {
        let f = fixture().await;
        let day = datetime!(2025-06-01 00:00 UTC);
        let e = add(&f.state, &input(5.0, day, "Shop", f.ana, f.food))
            .await
            .unwrap()
            .unwrap();
        assert!(users::delete(&f.state, f.ana).await.unwrap());
        assert!(get_by_id(&f.state, e.id).await.unwrap().is_none());
        assert!(!delete(&f.state, e.id).await.unwrap());
    }
}
