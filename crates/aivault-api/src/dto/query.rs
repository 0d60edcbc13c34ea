use aivault_db::Pagination;
use serde::Deserialize;
use utoipa::IntoParams;

/// `?limit=&offset=` on list endpoints. Out of range values fall back to
/// the defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page size, 10 by default and at most 100
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PaginationQuery> for Pagination {
    fn from(query: PaginationQuery) -> Self {
        Self::new(query.limit, query.offset)
    }
}
