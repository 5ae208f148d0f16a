use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::SortOrder;

#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySort {
    Name,
    Description,
}

impl CategorySort {
    /// Unknown or missing keys fall back to name.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("description") => CategorySort::Description,
            _ => CategorySort::Name,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            CategorySort::Name => "name",
            CategorySort::Description => "description",
        }
    }
}

/// Search and ordering for the category listing.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub search: Option<String>,
    pub sort: CategorySort,
    pub order: SortOrder,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            search: None,
            sort: CategorySort::Name,
            order: SortOrder::Asc,
        }
    }
}
