use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::orders::OrderStatus;

const MAX_PAGE: i64 = 100_000;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn normalize(&self) -> (i64, i64, i64) {
        self.normalize_with(20)
    }

    /// `(page, per_page, offset)` with `default_per_page` when none was given.
    pub fn normalize_with(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    Newest,
    Rating,
}

// Paging fields are inlined rather than flattened: query-string numbers do
// not survive `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<Uuid>,
    pub q: Option<String>,
    pub sort: Option<ProductSort>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{MAX_PAGE, Pagination};

    #[test]
    fn normalize_clamps_page_and_page_size() {
        assert_eq!(Pagination::default().normalize_with(12), (1, 12, 0));
        assert_eq!(Pagination::new(3, 10).normalize_with(12), (3, 10, 20));
        assert_eq!(Pagination::new(0, 500).normalize(), (1, 100, 0));
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let (page, per_page, offset) = Pagination::new(i64::MAX, 12).normalize_with(12);
        assert_eq!(page, MAX_PAGE);
        assert_eq!(per_page, 12);
        assert_eq!(offset, (MAX_PAGE - 1) * 12);
    }
}
