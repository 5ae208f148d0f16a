//! In-memory repositories with the same filtering, ordering and key rules as
//! the Postgres ones. Backs `AppState::fake()`.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo::CategoryRepo;
use crate::categories::repo_types::{Category, CategoryFilter, CategorySort};
use crate::expenses::repo::ExpenseRepo;
use crate::expenses::repo_types::{Expense, ExpenseDetails, ExpenseFilter, ExpenseInput, ExpenseSort};
use crate::pagination::{PageRequest, SortOrder};
use crate::users::repo::UserRepo;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

impl Tables {
    fn details(&self, e: &Expense) -> Option<ExpenseDetails> {
        let c = self.categories.iter().find(|c| c.id == e.category_id)?;
        let u = self.users.iter().find(|u| u.id == e.user_id)?;
        Some(ExpenseDetails {
            expense: e.clone(),
            category_name: c.name.clone(),
            category_description: c.description.clone(),
            user_name: u.name.clone(),
            user_email: u.email.clone(),
        })
    }

    fn check_keys(&self, input: &ExpenseInput) -> anyhow::Result<()> {
        if !self.users.iter().any(|u| u.id == input.user_id)
            || !self.categories.iter().any(|c| c.id == input.category_id)
        {
            anyhow::bail!("foreign key violation on expenses");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn window<T>(rows: Vec<T>, page: PageRequest) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.lock().users.iter().any(|u| u.email == email))
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.lock().users.iter().any(|u| u.id == id))
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == new.email) {
            anyhow::bail!("duplicate email");
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            created_at: now,
            modified_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.id != id && u.email == changes.email) {
            anyhow::bail!("duplicate email");
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.name = changes.name;
        user.email = changes.email;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.modified_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        t.expenses.retain(|e| e.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn list(
        &self,
        filter: &CategoryFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Category>, i64)> {
        let t = self.lock();
        let mut rows: Vec<Category> = t
            .categories
            .iter()
            .filter(|c| match filter.search.as_deref() {
                Some(term) => contains_ci(&c.name, term) || contains_ci(&c.description, term),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let key = match filter.sort {
                CategorySort::Name => a.name.cmp(&b.name),
                CategorySort::Description => a.description.cmp(&b.description),
            };
            directed(key.then(a.id.cmp(&b.id)), filter.order)
        });
        let total = rows.len() as i64;
        Ok((window(rows, page), total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.lock().categories.iter().any(|c| c.id == id))
    }

    async fn create(&self, name: &str, description: &str) -> anyhow::Result<Category> {
        let now = OffsetDateTime::now_utc();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            modified_at: now,
        };
        self.lock().categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: Uuid, name: &str, description: &str) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let Some(category) = t.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        category.name = name.to_string();
        category.description = description.to_string();
        category.modified_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn has_expenses(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.lock().expenses.iter().any(|e| e.category_id == id))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.lock();
        if t.expenses.iter().any(|e| e.category_id == id) {
            anyhow::bail!("foreign key violation on expenses");
        }
        let before = t.categories.len();
        t.categories.retain(|c| c.id != id);
        Ok(t.categories.len() < before)
    }
}

#[async_trait]
impl ExpenseRepo for MemoryStore {
    async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<ExpenseDetails>, i64)> {
        let t = self.lock();
        let mut rows: Vec<ExpenseDetails> = t
            .expenses
            .iter()
            .filter_map(|e| t.details(e))
            .filter(|d| {
                let e = &d.expense;
                filter.search.as_deref().map_or(true, |term| {
                    contains_ci(&e.receiver, term)
                        || contains_ci(&d.category_name, term)
                        || contains_ci(&d.user_name, term)
                }) && filter.category_id.map_or(true, |id| e.category_id == id)
                    && filter.user_id.map_or(true, |id| e.user_id == id)
                    && filter.min_amount.map_or(true, |min| e.amount >= min)
                    && filter.max_amount.map_or(true, |max| e.amount <= max)
                    && filter.start_date.map_or(true, |start| e.payment_date >= start)
                    && filter.end_date.map_or(true, |end| e.payment_date <= end)
                    && filter
                        .receiver
                        .as_deref()
                        .map_or(true, |r| contains_ci(&e.receiver, r))
            })
            .collect();
        rows.sort_by(|a, b| {
            let key = match filter.sort {
                ExpenseSort::Amount => a.expense.amount.total_cmp(&b.expense.amount),
                ExpenseSort::PaymentDate => a.expense.payment_date.cmp(&b.expense.payment_date),
                ExpenseSort::Receiver => a.expense.receiver.cmp(&b.expense.receiver),
                ExpenseSort::Category => a.category_name.cmp(&b.category_name),
                ExpenseSort::User => a.user_name.cmp(&b.user_name),
            };
            directed(key.then(a.expense.id.cmp(&b.expense.id)), filter.order)
        });
        let total = rows.len() as i64;
        Ok((window(rows, page), total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExpenseDetails>> {
        let t = self.lock();
        Ok(t.expenses.iter().find(|e| e.id == id).and_then(|e| t.details(e)))
    }

    async fn create(&self, input: &ExpenseInput) -> anyhow::Result<Expense> {
        let mut t = self.lock();
        t.check_keys(input)?;
        let now = OffsetDateTime::now_utc();
        let expense = Expense {
            id: Uuid::new_v4(),
            amount: input.amount,
            payment_date: input.payment_date,
            receiver: input.receiver.clone(),
            user_id: input.user_id,
            category_id: input.category_id,
            created_at: now,
            modified_at: now,
        };
        t.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn update(&self, id: Uuid, input: &ExpenseInput) -> anyhow::Result<bool> {
        let mut t = self.lock();
        t.check_keys(input)?;
        let Some(expense) = t.expenses.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        expense.amount = input.amount;
        expense.payment_date = input.payment_date;
        expense.receiver = input.receiver.clone();
        expense.user_id = input.user_id;
        expense.category_id = input.category_id;
        expense.modified_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let before = t.expenses.len();
        t.expenses.retain(|e| e.id != id);
        Ok(t.expenses.len() < before)
    }

    async fn list_for_users(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<ExpenseDetails>> {
        let t = self.lock();
        let mut rows: Vec<ExpenseDetails> = t
            .expenses
            .iter()
            .filter(|e| user_ids.contains(&e.user_id))
            .filter_map(|e| t.details(e))
            .collect();
        rows.sort_by(|a, b| {
            b.expense
                .payment_date
                .cmp(&a.expense.payment_date)
                .then(b.expense.id.cmp(&a.expense.id))
        });
        Ok(rows)
    }

    async fn list_for_categories(&self, category_ids: &[Uuid]) -> anyhow::Result<Vec<Expense>> {
        let t = self.lock();
        let mut rows: Vec<Expense> = t
            .expenses
            .iter()
            .filter(|e| category_ids.contains(&e.category_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
