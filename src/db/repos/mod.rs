use chrono::{DateTime, Utc};

mod prompts;

pub use prompts::*;

/// Offset pagination parameters.
///
/// Range checks (`skip >= 0`, `limit` within bounds) are the caller's job;
/// repositories apply the values as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Number of matching records to skip.
    pub skip: i64,
    /// Maximum number of records to return.
    pub limit: i64,
}

impl PageParams {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PageResult<T> {
    /// The items returned for this page.
    pub items: Vec<T>,
    /// Number of records matching the query before pagination.
    pub total: i64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    /// A result with no matches.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Truncate a timestamp to millisecond precision.
///
/// Creation times are ordered as stored text in SQLite, so they are written
/// with a fixed precision that reads back unchanged.
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_millis() {
        let dt = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let truncated = truncate_to_millis(dt);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(truncated.timestamp(), dt.timestamp());
    }

    #[test]
    fn test_empty_page_result() {
        let result: PageResult<u32> = PageResult::empty();
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
    }
}
