use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Category, CategoryFilter};
use crate::pagination::{like_pattern, PageRequest};

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// One page of matching categories plus the total match count.
    async fn list(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Category>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>>;
    async fn exists(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn create(&self, name: &str, description: &str) -> anyhow::Result<Category>;
    /// Touches only the category row.
    async fn update(&self, id: Uuid, name: &str, description: &str) -> anyhow::Result<bool>;
    async fn has_expenses(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgCategoryRepo {
    db: PgPool,
}

impl PgCategoryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub(crate) fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CategoryFilter) {
    if let Some(term) = filter.search.as_deref() {
        let pattern = like_pattern(term);
        qb.push(" WHERE (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub(crate) fn push_order(qb: &mut QueryBuilder<'_, Postgres>, filter: &CategoryFilter) {
    let dir = filter.order.as_sql();
    qb.push(format!(
        " ORDER BY {} {dir}, id {dir}",
        filter.sort.column()
    ));
}

#[async_trait]
impl CategoryRepo for PgCategoryRepo {
    async fn list(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Category>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, name, description, created_at, modified_at FROM categories",
        );
        push_filter(&mut qb, filter);
        push_order(&mut qb, filter);
        qb.push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb.build_query_as::<Category>().fetch_all(&self.db).await?;

        Ok((rows, total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, modified_at
              FROM categories
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn create(&self, name: &str, description: &str) -> anyhow::Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, modified_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, name: &str, description: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE categories
               SET name = $2, description = $3, modified_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_expenses(&self, id: Uuid) -> anyhow::Result<bool> {
        let used: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM expenses WHERE category_id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(used)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
