//! # Cursor Pagination
//!
//! Every list operation pages reverse-chronologically with an opaque
//! cursor: the creation timestamp of the first row excluded from the
//! current page, rendered as RFC 3339 with nanosecond precision. A store
//! fetches `limit + 1` rows; [`paginate`] peels the extra row off into the
//! next cursor.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

/// Page size applied when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Hard ceiling on a single page.
pub const MAX_PAGE_SIZE: usize = 100;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`, substituting the
/// default for zero.
pub fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    }
}

/// An opaque pagination cursor.
///
/// Wraps the creation timestamp of the first row excluded from the page it
/// was returned with. Pages are filtered as `created_at <= cursor`, so
/// re-submitting the cursor continues exactly where the page ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(DateTime<Utc>);

impl PageCursor {
    /// Wrap a timestamp as a cursor.
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    /// The timestamp this cursor points at.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

impl std::str::FromStr for PageCursor {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s)
            .map(|ts| Self(ts.with_timezone(&Utc)))
            .map_err(|_| UnknownVariant::new("cursor", s))
    }
}

/// One page of a list result.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The rows of this page, at most `limit` of them.
    pub items: Vec<T>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<PageCursor>,
}

/// Reduce up to `limit + 1` fetched rows into a page.
///
/// If the store returned more than `limit` rows, the extra row marks the
/// next page: its creation timestamp becomes the cursor and it is dropped
/// from the page itself.
pub fn paginate<T>(
    mut rows: Vec<T>,
    limit: usize,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Page<T> {
    let next_cursor = if rows.len() > limit {
        let cursor = PageCursor::new(created_at(&rows[limit]));
        rows.truncate(limit);
        Some(cursor)
    } else {
        None
    };
    Page {
        items: rows,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn ts(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n, 500 + n as u32).unwrap()
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(0), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(25), 25);
        assert_eq!(clamp_limit(MAX_PAGE_SIZE), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(MAX_PAGE_SIZE + 1), MAX_PAGE_SIZE);
    }

    #[test]
    fn cursor_roundtrips_with_nanosecond_precision() {
        let cursor = PageCursor::new(ts(3));
        let parsed = PageCursor::from_str(&cursor.to_string()).unwrap();
        assert_eq!(parsed, cursor);
        assert_eq!(parsed.timestamp(), ts(3));
    }

    #[test]
    fn cursor_rejects_garbage() {
        assert!(PageCursor::from_str("yesterday").is_err());
        assert!(PageCursor::from_str("").is_err());
    }

    #[test]
    fn short_result_has_no_next_cursor() {
        let rows: Vec<i64> = (0..5).collect();
        let page = paginate(rows, 10, |n| ts(*n));
        assert_eq!(page.items.len(), 5);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn exactly_limit_rows_has_no_next_cursor() {
        let rows: Vec<i64> = (0..10).collect();
        let page = paginate(rows, 10, |n| ts(*n));
        assert_eq!(page.items.len(), 10);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn extra_row_becomes_the_cursor() {
        // Eleven rows at limit 10: page carries ten, the eleventh row's
        // timestamp becomes the cursor.
        let rows: Vec<i64> = (0..11).collect();
        let page = paginate(rows, 10, |n| ts(*n));
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.next_cursor.unwrap().timestamp(), ts(10));
    }
}
