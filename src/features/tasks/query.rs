//! Listing parameters: pagination, sorting and filters for a user's task list
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use crate::core::model::{Task, TaskStatus};
use chrono::{DateTime, Utc};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A resolved page request with inclusive row offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Offset of the first row
    pub from: u32,
    /// Offset of the last row (inclusive)
    pub to: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        build_pagination(None, None)
    }
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// Turn raw `page` / `limit` query values into a safe page window.
///
/// Missing, zero or garbage values fall back to page 1 and 10 rows; the page
/// size is clamped to `1..=100`.
pub fn build_pagination(page: Option<&str>, limit: Option<&str>) -> Pagination {
    let page = match page.and_then(parse_leading_int) {
        Some(p) if p != 0 => p.clamp(1, u32::MAX as i64) as u32,
        _ => 1,
    };
    let limit = match limit.and_then(parse_leading_int) {
        Some(l) if l != 0 => l.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        _ => DEFAULT_PAGE_SIZE,
    };

    let from = (page - 1).saturating_mul(limit);
    Pagination {
        page,
        limit,
        from,
        to: from.saturating_add(limit - 1),
    }
}

/// Columns a task list may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    DueDate,
    Status,
    CreatedAt,
    Title,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::DueDate => "due_date",
            SortField::Status => "status",
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Map user-supplied sort parameters onto the allowed columns.
///
/// Unknown fields sort by due date; anything other than `desc` sorts ascending.
pub fn sanitize_sort(sort_by: Option<&str>, sort_order: Option<&str>) -> SortSpec {
    let field = match sort_by {
        Some("status") => SortField::Status,
        Some("created_at") => SortField::CreatedAt,
        Some("title") => SortField::Title,
        _ => SortField::DueDate,
    };
    let order = match sort_order {
        Some("desc") => SortOrder::Desc,
        _ => SortOrder::Asc,
    };
    SortSpec { field, order }
}

/// Filters and paging for listing one user's tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

/// One page of tasks plus paging metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl TaskPage {
    pub fn new(tasks: Vec<Task>, pagination: &Pagination, total: u64) -> Self {
        let has_more = (pagination.page as u64) * (pagination.limit as u64) < total;
        Self {
            tasks,
            page: pagination.page,
            limit: pagination.limit,
            total,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = build_pagination(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10, from: 0, to: 9 });
        assert_eq!(Pagination::default(), p);
    }

    #[test]
    fn test_pagination_offsets() {
        let p = build_pagination(Some("3"), Some("20"));
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 20);
        assert_eq!(p.from, 40);
        assert_eq!(p.to, 59);
    }

    #[test]
    fn test_pagination_clamps_bad_input() {
        assert_eq!(build_pagination(Some("-4"), None).page, 1);
        assert_eq!(build_pagination(Some("abc"), None).page, 1);
        assert_eq!(build_pagination(Some("2nd"), None).page, 2);
        assert_eq!(build_pagination(None, Some("500")).limit, 100);
        assert_eq!(build_pagination(None, Some("0")).limit, 10);
        assert_eq!(build_pagination(None, Some("-7")).limit, 1);
    }

    #[test]
    fn test_sanitize_sort() {
        assert_eq!(sanitize_sort(None, None), SortSpec::default());
        let spec = sanitize_sort(Some("title"), Some("desc"));
        assert_eq!(spec.field.column(), "title");
        assert_eq!(spec.order.as_str(), "desc");

        let spec = sanitize_sort(Some("owner; drop table"), Some("DESC"));
        assert_eq!(spec.field, SortField::DueDate);
        assert_eq!(spec.order, SortOrder::Asc);
    }

    #[test]
    fn test_task_page_has_more() {
        let p = build_pagination(Some("2"), Some("10"));
        assert!(TaskPage::new(vec![], &p, 21).has_more);
        assert!(!TaskPage::new(vec![], &p, 20).has_more);
    }
}
