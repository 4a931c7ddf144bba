//! Flat-file server log query endpoint.
//!
//! Reads an append-only log of `LEVEL YYYY-MM-DD HH:MM:SS MESSAGE...` lines.
//! A line that does not match this shape keeps the raw text as its message
//! with empty level and timestamp; since date filtering needs a timestamp,
//! such entries drop out of the returned set. Dates filter by calendar day,
//! inclusive on both ends. Pages are 1-based with a bounded page size.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use crate::api::ApiState;
use shared_types::{LogEntry, LogPage};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_PAGE_SIZE: usize = 100;

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

fn default_sort() -> String {
    "desc".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,

    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,

    #[serde(default = "default_sort")]
    pub sort: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated form of `LogsQuery`.
#[derive(Debug)]
pub struct LogFilter {
    pub page: usize,
    pub page_size: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort: SortOrder,
}

impl LogFilter {
    pub fn from_query(query: &LogsQuery) -> Result<Self, String> {
        if query.page < 1 {
            return Err("'page' must be >= 1".to_string());
        }
        if query.page_size < 1 || query.page_size > MAX_PAGE_SIZE {
            return Err(format!("'page_size' must be between 1 and {MAX_PAGE_SIZE}"));
        }

        let sort = match query.sort.as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => return Err(format!("'sort' must be 'asc' or 'desc', got '{other}'")),
        };

        let parse_date = |label: &str, value: &Option<String>| -> Result<Option<NaiveDate>, String> {
            match value {
                None => Ok(None),
                Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map(Some)
                    .map_err(|_| format!("'{label}' must be YYYY-MM-DD, got '{raw}'")),
            }
        };

        Ok(Self {
            page: query.page,
            page_size: query.page_size,
            start_date: parse_date("start_date", &query.start_date)?,
            end_date: parse_date("end_date", &query.end_date)?,
            sort,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedLine {
    level: String,
    timestamp: Option<NaiveDateTime>,
    message: String,
}

/// Parse one `LEVEL YYYY-MM-DD HH:MM:SS MESSAGE...` line. Any line failing
/// that shape is retained with empty level/timestamp and the whole raw line
/// as its message.
fn parse_log_line(line: &str) -> ParsedLine {
    let parts: Vec<&str> = line.splitn(4, ' ').collect();
    if parts.len() >= 3 {
        let candidate = format!("{} {}", parts[1], parts[2]);
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(&candidate, TIMESTAMP_FORMAT) {
            return ParsedLine {
                level: parts[0].to_string(),
                timestamp: Some(timestamp),
                message: parts.get(3).copied().unwrap_or("").to_string(),
            };
        }
    }

    ParsedLine {
        level: String::new(),
        timestamp: None,
        message: line.to_string(),
    }
}

/// Filter, sort, and paginate raw log content.
pub fn query_log_content(content: &str, filter: &LogFilter) -> LogPage {
    let mut entries: Vec<ParsedLine> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_log_line)
        .collect();

    if let Some(start) = filter.start_date {
        entries.retain(|entry| entry.timestamp.is_some_and(|ts| ts.date() >= start));
    }
    if let Some(end) = filter.end_date {
        entries.retain(|entry| entry.timestamp.is_some_and(|ts| ts.date() <= end));
    }

    // Downstream ordering needs a timestamp; unparseable entries drop out.
    entries.retain(|entry| entry.timestamp.is_some());

    entries.sort_by_key(|entry| entry.timestamp);
    if filter.sort == SortOrder::Desc {
        entries.reverse();
    }

    let total = entries.len();
    let start = (filter.page - 1).saturating_mul(filter.page_size);
    let logs: Vec<LogEntry> = entries
        .into_iter()
        .skip(start)
        .take(filter.page_size)
        .map(|entry| LogEntry {
            level: entry.level,
            timestamp: entry
                .timestamp
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            message: entry.message,
        })
        .collect();

    LogPage {
        total,
        page: filter.page,
        page_size: filter.page_size,
        logs,
    }
}

/// `GET /logs`
pub async fn get_logs(
    State(state): State<ApiState>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let filter = match LogFilter::from_query(&query) {
        Ok(filter) => filter,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };

    let path: &Path = &state.app_state.config().log_file;
    if !path.exists() {
        return (
            StatusCode::OK,
            Json(LogPage {
                total: 0,
                page: filter.page,
                page_size: filter.page_size,
                logs: Vec::new(),
            }),
        )
            .into_response();
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read log file");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to read log file" })),
            )
                .into_response();
        }
    };

    (StatusCode::OK, Json(query_log_content(&content, &filter))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(page: usize, page_size: usize, sort: SortOrder) -> LogFilter {
        LogFilter {
            page,
            page_size,
            start_date: None,
            end_date: None,
            sort,
        }
    }

    fn sample_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("INFO 2024-03-01 10:{:02}:00 message {i}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_well_formed_line() {
        let parsed = parse_log_line("ERROR 2024-03-01 10:15:30 connection refused by peer");
        assert_eq!(parsed.level, "ERROR");
        assert_eq!(
            parsed.timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 15, 30)
        );
        assert_eq!(parsed.message, "connection refused by peer");
    }

    #[test]
    fn test_parse_line_without_message_body() {
        let parsed = parse_log_line("INFO 2024-03-01 10:15:30");
        assert_eq!(parsed.level, "INFO");
        assert!(parsed.timestamp.is_some());
        assert_eq!(parsed.message, "");
    }

    #[test]
    fn test_malformed_line_keeps_raw_text() {
        let parsed = parse_log_line("a stray python traceback line");
        assert_eq!(parsed.level, "");
        assert_eq!(parsed.timestamp, None);
        assert_eq!(parsed.message, "a stray python traceback line");
    }

    #[test]
    fn test_malformed_lines_are_excluded_from_results() {
        let content = "INFO 2024-03-01 10:00:00 ok\nnot a log line\nINFO 2024-03-01 11:00:00 also ok";
        let page = query_log_content(content, &filter(1, 10, SortOrder::Asc));
        assert_eq!(page.total, 2);
        assert!(page.logs.iter().all(|entry| !entry.timestamp.is_empty()));
    }

    #[test]
    fn test_pagination_round_trip_25_lines() {
        let content = sample_lines(25);

        let first = query_log_content(&content, &filter(1, 10, SortOrder::Asc));
        assert_eq!(first.total, 25);
        assert_eq!(first.logs.len(), 10);
        assert_eq!(first.logs[0].message, "message 0");
        assert_eq!(first.logs[9].message, "message 9");

        let third = query_log_content(&content, &filter(3, 10, SortOrder::Asc));
        assert_eq!(third.total, 25);
        assert_eq!(third.logs.len(), 5);
        assert_eq!(third.logs[0].message, "message 20");
        assert_eq!(third.logs[4].message, "message 24");
    }

    #[test]
    fn test_sort_descending_returns_latest_first() {
        let content = sample_lines(3);
        let page = query_log_content(&content, &filter(1, 10, SortOrder::Desc));
        assert_eq!(page.logs[0].message, "message 2");
        assert_eq!(page.logs[2].message, "message 0");
    }

    #[test]
    fn test_date_filter_is_inclusive_by_calendar_day() {
        let content = "\
INFO 2024-02-28 23:59:59 before\n\
INFO 2024-03-01 00:00:00 on start\n\
INFO 2024-03-02 12:00:00 inside\n\
INFO 2024-03-03 23:59:59 on end\n\
INFO 2024-03-04 00:00:00 after";
        let log_filter = LogFilter {
            page: 1,
            page_size: 10,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 3),
            sort: SortOrder::Asc,
        };
        let page = query_log_content(content, &log_filter);
        let messages: Vec<&str> = page.logs.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["on start", "inside", "on end"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_page_beyond_end_is_empty_but_keeps_total() {
        let content = sample_lines(5);
        let page = query_log_content(&content, &filter(4, 10, SortOrder::Asc));
        assert_eq!(page.total, 5);
        assert!(page.logs.is_empty());
    }

    #[test]
    fn test_filter_validation() {
        let base = LogsQuery {
            page: 0,
            page_size: 20,
            start_date: None,
            end_date: None,
            sort: "desc".to_string(),
        };
        assert!(LogFilter::from_query(&base).is_err());

        let bad_size = LogsQuery {
            page: 1,
            page_size: 101,
            start_date: None,
            end_date: None,
            sort: "desc".to_string(),
        };
        assert!(LogFilter::from_query(&bad_size).is_err());

        let bad_sort = LogsQuery {
            page: 1,
            page_size: 20,
            start_date: None,
            end_date: None,
            sort: "upwards".to_string(),
        };
        assert!(LogFilter::from_query(&bad_sort).is_err());

        let bad_date = LogsQuery {
            page: 1,
            page_size: 20,
            start_date: Some("03/01/2024".to_string()),
            end_date: None,
            sort: "asc".to_string(),
        };
        assert!(LogFilter::from_query(&bad_date).is_err());
    }
}
