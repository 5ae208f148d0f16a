//! Outward-facing shapes of users, categories and expenses.
//!
//! Every service builds its responses through the `project` functions here,
//! so a row is shaped the same way no matter which endpoint returns it.

use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo_types::Category;
use crate::expenses::repo_types::{Expense, ExpenseDetails};
use crate::users::repo_types::{Role, User};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: Uuid,
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub payment_date: OffsetDateTime,
    pub receiver: String,
    pub user_id: Uuid,
    pub category_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

/// Which related rows an expense view embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Category,
    CategoryAndUser,
}

impl ExpenseView {
    pub fn project(expense: Expense, category: Option<CategorySummary>, user: Option<UserSummary>) -> Self {
        Self {
            id: expense.id,
            amount: expense.amount,
            payment_date: expense.payment_date,
            receiver: expense.receiver,
            user_id: expense.user_id,
            category_id: expense.category_id,
            category,
            user,
            created_at: expense.created_at,
            modified_at: expense.modified_at,
        }
    }

    pub fn from_details(details: ExpenseDetails, nesting: Nesting) -> Self {
        let category = Some(CategorySummary {
            id: details.expense.category_id,
            name: details.category_name,
            description: details.category_description,
        });
        let user = match nesting {
            Nesting::CategoryAndUser => Some(UserSummary {
                id: details.expense.user_id,
                name: details.user_name,
                email: details.user_email,
            }),
            Nesting::Category => None,
        };
        Self::project(details.expense, category, user)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub expenses: Vec<ExpenseView>,
}

impl CategoryView {
    pub fn project(category: Category, expenses: Vec<Expense>) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            modified_at: category.modified_at,
            expenses: expenses
                .into_iter()
                .map(|e| ExpenseView::project(e, None, None))
                .collect(),
        }
    }

    /// Projects many categories, distributing `expenses` by category id.
    pub fn project_all(categories: Vec<Category>, expenses: Vec<Expense>) -> Vec<Self> {
        let mut by_category: HashMap<Uuid, Vec<Expense>> = HashMap::new();
        for e in expenses {
            by_category.entry(e.category_id).or_default().push(e);
        }
        categories
            .into_iter()
            .map(|c| {
                let owned = by_category.remove(&c.id).unwrap_or_default();
                Self::project(c, owned)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub expenses: Vec<ExpenseView>,
}

impl UserView {
    /// The password hash is dropped here and never leaves the service layer.
    pub fn project(user: User, expenses: Vec<ExpenseDetails>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            modified_at: user.modified_at,
            expenses: expenses
                .into_iter()
                .map(|d| ExpenseView::from_details(d, Nesting::Category))
                .collect(),
        }
    }

    pub fn project_all(users: Vec<User>, expenses: Vec<ExpenseDetails>) -> Vec<Self> {
        let mut by_user: HashMap<Uuid, Vec<ExpenseDetails>> = HashMap::new();
        for d in expenses {
            by_user.entry(d.expense.user_id).or_default().push(d);
        }
        users
            .into_iter()
            .map(|u| {
                let owned = by_user.remove(&u.id).unwrap_or_default();
                Self::project(u, owned)
            })
            .collect()
    }
}
