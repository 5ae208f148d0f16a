use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Expense, ExpenseDetails, ExpenseFilter, ExpenseInput};
use crate::pagination::{like_pattern, PageRequest};

const DETAILS_SELECT: &str = r#"
    SELECT e.id, e.amount, e.payment_date, e.receiver, e.user_id, e.category_id,
           e.created_at, e.modified_at,
           c.name AS category_name, c.description AS category_description,
           u.name AS user_name, u.email AS user_email
      FROM expenses e
      JOIN categories c ON c.id = e.category_id
      JOIN users u ON u.id = e.user_id
"#;

const EXPENSE_COLUMNS: &str =
    "id, amount, payment_date, receiver, user_id, category_id, created_at, modified_at";

#[async_trait]
pub trait ExpenseRepo: Send + Sync {
    /// One page of matching expenses plus the total match count.
    async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<ExpenseDetails>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExpenseDetails>>;
    async fn create(&self, input: &ExpenseInput) -> anyhow::Result<Expense>;
    async fn update(&self, id: Uuid, input: &ExpenseInput) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Expenses owned by any of `user_ids`, newest payment first.
    async fn list_for_users(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<ExpenseDetails>>;
    /// Expenses filed under any of `category_ids`, newest payment first.
    async fn list_for_categories(&self, category_ids: &[Uuid]) -> anyhow::Result<Vec<Expense>>;
}

#[derive(Clone)]
pub struct PgExpenseRepo {
    db: PgPool,
}

impl PgExpenseRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub(crate) fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ExpenseFilter) {
    let mut started = false;

    if let Some(term) = filter.search.as_deref() {
        let pattern = like_pattern(term);
        clause(qb, &mut started);
        qb.push("(e.receiver ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category_id) = filter.category_id {
        clause(qb, &mut started);
        qb.push("e.category_id = ").push_bind(category_id);
    }
    if let Some(user_id) = filter.user_id {
        clause(qb, &mut started);
        qb.push("e.user_id = ").push_bind(user_id);
    }
    if let Some(min) = filter.min_amount {
        clause(qb, &mut started);
        qb.push("e.amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        clause(qb, &mut started);
        qb.push("e.amount <= ").push_bind(max);
    }
    if let Some(start) = filter.start_date {
        clause(qb, &mut started);
        qb.push("e.payment_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        clause(qb, &mut started);
        qb.push("e.payment_date <= ").push_bind(end);
    }
    if let Some(receiver) = filter.receiver.as_deref() {
        clause(qb, &mut started);
        qb.push("e.receiver ILIKE ").push_bind(like_pattern(receiver));
    }
}

fn clause(qb: &mut QueryBuilder<'_, Postgres>, started: &mut bool) {
    qb.push(if *started { " AND " } else { " WHERE " });
    *started = true;
}

pub(crate) fn push_order(qb: &mut QueryBuilder<'_, Postgres>, filter: &ExpenseFilter) {
    let dir = filter.order.as_sql();
    qb.push(format!(" ORDER BY {} {dir}, e.id {dir}", filter.sort.column()));
}

#[async_trait]
impl ExpenseRepo for PgExpenseRepo {
    async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<ExpenseDetails>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*)
              FROM expenses e
              JOIN categories c ON c.id = e.category_id
              JOIN users u ON u.id = e.user_id
            "#,
        );
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut qb = QueryBuilder::<Postgres>::new(DETAILS_SELECT);
        push_filter(&mut qb, filter);
        push_order(&mut qb, filter);
        qb.push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb
            .build_query_as::<ExpenseDetails>()
            .fetch_all(&self.db)
            .await?;

        Ok((rows, total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExpenseDetails>> {
        let row = sqlx::query_as::<_, ExpenseDetails>(&format!("{DETAILS_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn create(&self, input: &ExpenseInput) -> anyhow::Result<Expense> {
        let row = sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (id, amount, payment_date, receiver, user_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(&input.receiver)
        .bind(input.user_id)
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: &ExpenseInput) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE expenses
               SET amount = $2, payment_date = $3, receiver = $4,
                   user_id = $5, category_id = $6, modified_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(&input.receiver)
        .bind(input.user_id)
        .bind(input.category_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_users(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<ExpenseDetails>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ExpenseDetails>(&format!(
            "{DETAILS_SELECT} WHERE e.user_id = ANY($1) ORDER BY e.payment_date DESC, e.id DESC"
        ))
        .bind(user_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_for_categories(&self, category_ids: &[Uuid]) -> anyhow::Result<Vec<Expense>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
              FROM expenses
             WHERE category_id = ANY($1)
             ORDER BY payment_date DESC, id DESC
            "#
        ))
        .bind(category_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
