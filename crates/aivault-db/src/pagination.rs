pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Limit/offset window for list queries.
///
/// Out of range values fall back to the defaults instead of being rejected,
/// so `?limit=0` or `?limit=-5` behave like an absent limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        let offset = offset.filter(|offset| *offset >= 0).unwrap_or(0);

        Self { limit, offset }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            Pagination::default(),
            Pagination {
                limit: 10,
                offset: 0
            }
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        assert_eq!(Pagination::new(Some(0), Some(-3)), Pagination::default());
        assert_eq!(Pagination::new(Some(-1), None).limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_limit_is_capped() {
        let page = Pagination::new(Some(5_000), Some(40));
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.offset, 40);
    }
}
