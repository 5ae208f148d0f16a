use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::SortOrder;

#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub amount: f64,
    pub payment_date: OffsetDateTime,
    pub receiver: String,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

/// An expense joined with its category and owner.
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseDetails {
    #[sqlx(flatten)]
    pub expense: Expense,
    pub category_name: String,
    pub category_description: String,
    pub user_name: String,
    pub user_email: String,
}

/// Mutable fields of an expense, shared by insert and update.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub amount: f64,
    pub payment_date: OffsetDateTime,
    pub receiver: String,
    pub user_id: Uuid,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseSort {
    Amount,
    PaymentDate,
    Receiver,
    Category,
    User,
}

impl ExpenseSort {
    /// Unknown or missing keys fall back to payment date.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("amount") => ExpenseSort::Amount,
            Some("receiver") => ExpenseSort::Receiver,
            Some("category") => ExpenseSort::Category,
            Some("user") => ExpenseSort::User,
            _ => ExpenseSort::PaymentDate,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            ExpenseSort::Amount => "e.amount",
            ExpenseSort::PaymentDate => "e.payment_date",
            ExpenseSort::Receiver => "e.receiver",
            ExpenseSort::Category => "c.name",
            ExpenseSort::User => "u.name",
        }
    }
}

/// Conjunctive filters for the expense listing. Ranges are inclusive.
#[derive(Debug, Clone)]
pub struct ExpenseFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub receiver: Option<String>,
    pub sort: ExpenseSort,
    pub order: SortOrder,
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            user_id: None,
            min_amount: None,
            max_amount: None,
            start_date: None,
            end_date: None,
            receiver: None,
            sort: ExpenseSort::PaymentDate,
            order: SortOrder::Desc,
        }
    }
}
