/// Task filter
///
/// Narrows the task list by any combination of status, executor, label and
/// "only tasks I authored", then paginates. Every parameter left out imposes
/// no constraint; the ones given combine with AND.
///
/// Query strings come from HTML-style forms, so empty values (`status=`) mean
/// "not set" and the `self_tasks` checkbox accepts `on`, `true`, `1` or `yes`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::filter::{list_tasks, TaskFilter, TaskFilterParams};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let params = TaskFilterParams {
///     status: Some(2),
///     self_tasks: true,
///     ..Default::default()
/// };
///
/// let filter = TaskFilter::new(&params, Some(1));
/// let page = list_tasks(&pool, &filter, params.page_request(), 20).await?;
/// println!("{} of {} tasks", page.items.len(), page.total);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::task::{attach_labels, TaskDetail, DETAIL_SELECT};

/// Tasks per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Raw filter parameters as received in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskFilterParams {
    /// Status ID to match exactly
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<i64>,

    /// Executor user ID to match exactly
    #[serde(default, deserialize_with = "empty_as_none")]
    pub executor: Option<i64>,

    /// Label ID the task must carry
    #[serde(default, deserialize_with = "empty_as_none")]
    pub label: Option<i64>,

    /// Only tasks authored by the acting principal
    #[serde(default, deserialize_with = "checkbox")]
    pub self_tasks: bool,

    /// Page number, or `last`
    #[serde(default)]
    pub page: Option<String>,

    /// Ordering override (`id`, `-id`, `name`, `-name`, `created_at`, `-created_at`)
    #[serde(default)]
    pub ordering: Option<String>,
}

impl TaskFilterParams {
    /// Parses the `page` parameter; anything unparseable means the first page
    pub fn page_request(&self) -> PageRequest {
        match self.page.as_deref().map(str::trim) {
            Some("last") => PageRequest::Last,
            Some(raw) => raw.parse().map(PageRequest::Number).unwrap_or_default(),
            None => PageRequest::default(),
        }
    }
}

/// Requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page number (clamped into range)
    Number(i64),

    /// The last page
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

/// Sort order of the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrdering {
    #[default]
    IdAsc,
    IdDesc,
    NameAsc,
    NameDesc,
    CreatedAsc,
    CreatedDesc,
}

impl TaskOrdering {
    /// Parses an ordering parameter; unknown values keep the default
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("-id") => TaskOrdering::IdDesc,
            Some("name") => TaskOrdering::NameAsc,
            Some("-name") => TaskOrdering::NameDesc,
            Some("created_at") => TaskOrdering::CreatedAsc,
            Some("-created_at") => TaskOrdering::CreatedDesc,
            _ => TaskOrdering::IdAsc,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            TaskOrdering::IdAsc => " ORDER BY t.id ASC",
            TaskOrdering::IdDesc => " ORDER BY t.id DESC",
            TaskOrdering::NameAsc => " ORDER BY t.name ASC, t.id ASC",
            TaskOrdering::NameDesc => " ORDER BY t.name DESC, t.id ASC",
            TaskOrdering::CreatedAsc => " ORDER BY t.created_at ASC, t.id ASC",
            TaskOrdering::CreatedDesc => " ORDER BY t.created_at DESC, t.id ASC",
        }
    }
}

/// Resolved predicates for one list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<i64>,
    pub executor: Option<i64>,
    pub label: Option<i64>,

    /// Set when `self_tasks` was requested: `Some(user)` for a principal,
    /// `Some(None)` when there is no principal to match
    pub author: Option<Option<i64>>,

    pub ordering: TaskOrdering,
}

impl TaskFilter {
    /// Resolves raw parameters against the acting principal
    pub fn new(params: &TaskFilterParams, principal_id: Option<i64>) -> Self {
        Self {
            status: params.status,
            executor: params.executor,
            label: params.label,
            author: params.self_tasks.then_some(principal_id),
            ordering: TaskOrdering::parse(params.ordering.as_deref()),
        }
    }

    /// Appends `WHERE ...` for every active predicate
    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(status) = self.status {
            qb.push(" AND t.status_id = ").push_bind(status);
        }

        if let Some(executor) = self.executor {
            qb.push(" AND t.executor_id = ").push_bind(executor);
        }

        if let Some(label) = self.label {
            qb.push(" AND EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = ")
                .push_bind(label)
                .push(")");
        }

        match self.author {
            Some(Some(author)) => {
                qb.push(" AND t.author_id = ").push_bind(author);
            }
            Some(None) => {
                qb.push(" AND FALSE");
            }
            None => {}
        }
    }

    fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        self.push_predicates(&mut qb);
        qb
    }

    fn select_query(&self, limit: i64, offset: i64) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(DETAIL_SELECT);
        self.push_predicates(&mut qb);
        qb.push(self.ordering.sql());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        qb
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// 1-based page number actually served
    pub page: i64,

    /// Total number of pages (at least 1)
    pub num_pages: i64,

    /// Total number of matching records
    pub total: i64,

    pub page_size: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Maps a page request onto a valid page number
///
/// # Returns
///
/// `(page, num_pages)`; an empty result still has one (empty) page
pub fn resolve_page(request: PageRequest, total: i64, page_size: i64) -> (i64, i64) {
    let page_size = page_size.max(1);
    let num_pages = ((total.max(0) + page_size - 1) / page_size).max(1);

    let page = match request {
        PageRequest::Number(n) => n.clamp(1, num_pages),
        PageRequest::Last => num_pages,
    };

    (page, num_pages)
}

/// Runs the filter and returns the requested page of tasks
pub async fn list_tasks(
    pool: &PgPool,
    filter: &TaskFilter,
    request: PageRequest,
    page_size: i64,
) -> Result<Page<TaskDetail>, sqlx::Error> {
    let page_size = page_size.max(1);

    let total: i64 = filter
        .count_query()
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let (page, num_pages) = resolve_page(request, total, page_size);

    let mut items: Vec<TaskDetail> = filter
        .select_query(page_size, (page - 1) * page_size)
        .build_query_as()
        .fetch_all(pool)
        .await?;

    attach_labels(pool, &mut items).await?;

    tracing::debug!(total, page, num_pages, ?filter, "Task filter evaluated");

    Ok(Page {
        items,
        page,
        num_pages,
        total,
        page_size,
        has_next: page < num_pages,
        has_previous: page > 1,
    })
}

/// Treats a missing or blank value as `None`
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", value))),
    }
}

/// HTML checkbox semantics
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    Ok(matches!(
        raw.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> TaskFilterParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_empty_values_impose_no_constraint() {
        let p = params(serde_json::json!({"status": "", "executor": " ", "label": ""}));
        assert_eq!(p, TaskFilterParams::default());

        let filter = TaskFilter::new(&p, Some(1));
        let mut qb = filter.count_query();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tasks t WHERE TRUE");
        let _ = qb.build();
    }

    #[test]
    fn test_numeric_strings_parse() {
        let p = params(serde_json::json!({"status": "2", "executor": "3", "label": "4"}));
        assert_eq!(p.status, Some(2));
        assert_eq!(p.executor, Some(3));
        assert_eq!(p.label, Some(4));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let result: Result<TaskFilterParams, _> =
            serde_json::from_value(serde_json::json!({"status": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_checkbox_values() {
        for on in ["on", "true", "1", "yes", "ON"] {
            assert!(params(serde_json::json!({"self_tasks": on})).self_tasks, "{}", on);
        }
        for off in ["", "off", "false", "0"] {
            assert!(!params(serde_json::json!({"self_tasks": off})).self_tasks, "{}", off);
        }
        assert!(!params(serde_json::json!({})).self_tasks);
    }

    #[test]
    fn test_all_predicates_combine_with_and() {
        let p = TaskFilterParams {
            status: Some(1),
            executor: Some(2),
            label: Some(3),
            self_tasks: true,
            ..Default::default()
        };
        let filter = TaskFilter::new(&p, Some(7));
        let qb = filter.select_query(20, 0);
        let sql = qb.sql();

        assert!(sql.contains("WHERE TRUE AND t.status_id = $1"));
        assert!(sql.contains("AND t.executor_id = $2"));
        assert!(sql.contains("tl.label_id = $3)"));
        assert!(sql.contains("AND t.author_id = $4"));
        assert!(sql.contains("ORDER BY t.id ASC LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn test_self_tasks_without_principal_matches_nothing() {
        let p = TaskFilterParams {
            self_tasks: true,
            ..Default::default()
        };
        let filter = TaskFilter::new(&p, None);
        assert_eq!(filter.author, Some(None));
        assert!(filter.count_query().sql().ends_with("AND FALSE"));
    }

    #[test]
    fn test_self_tasks_off_ignores_principal() {
        let filter = TaskFilter::new(&TaskFilterParams::default(), Some(7));
        assert_eq!(filter.author, None);
    }

    #[test]
    fn test_ordering_override() {
        assert_eq!(TaskOrdering::parse(None), TaskOrdering::IdAsc);
        assert_eq!(TaskOrdering::parse(Some("-created_at")), TaskOrdering::CreatedDesc);
        assert_eq!(TaskOrdering::parse(Some("; DROP TABLE tasks")), TaskOrdering::IdAsc);

        let p = TaskFilterParams {
            ordering: Some("-name".to_string()),
            ..Default::default()
        };
        let filter = TaskFilter::new(&p, None);
        assert!(filter.select_query(20, 0).sql().contains("ORDER BY t.name DESC"));
    }

    #[test]
    fn test_page_request_parsing() {
        let page = |raw: Option<&str>| TaskFilterParams {
            page: raw.map(String::from),
            ..Default::default()
        }
        .page_request();

        assert_eq!(page(None), PageRequest::Number(1));
        assert_eq!(page(Some("3")), PageRequest::Number(3));
        assert_eq!(page(Some("last")), PageRequest::Last);
        assert_eq!(page(Some("garbage")), PageRequest::Number(1));
    }

    #[test]
    fn test_resolve_page_clamps() {
        // 45 tasks at 20 per page = 3 pages
        assert_eq!(resolve_page(PageRequest::Number(1), 45, 20), (1, 3));
        assert_eq!(resolve_page(PageRequest::Number(3), 45, 20), (3, 3));
        assert_eq!(resolve_page(PageRequest::Number(99), 45, 20), (3, 3));
        assert_eq!(resolve_page(PageRequest::Number(-4), 45, 20), (1, 3));
        assert_eq!(resolve_page(PageRequest::Last, 45, 20), (3, 3));
        assert_eq!(resolve_page(PageRequest::Number(1), 40, 20), (1, 2));
    }

    #[test]
    fn test_resolve_page_empty_result() {
        assert_eq!(resolve_page(PageRequest::Number(5), 0, 20), (1, 1));
        assert_eq!(resolve_page(PageRequest::Last, 0, 20), (1, 1));
    }
}
