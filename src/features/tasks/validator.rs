//! Task payload validation
//!
//! Shape checks for create (`partial = false`) and update (`partial = true`)
//! payloads. Every problem is collected, not just the first.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use crate::core::model::TaskStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const INVALID_STATUS: &str = "Invalid task status.";
pub const INVALID_DUE_DATE: &str = "Invalid due date.";
pub const INVALID_DURATION: &str = "Duration must be a non-negative number of minutes.";

/// Validated column values ready to be written to the `tasks` table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Interval text, e.g. `"90 minutes"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub data: TaskChanges,
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_duration_minutes(value: &Value) -> Option<f64> {
    let minutes = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (minutes.is_finite() && minutes >= 0.0).then_some(minutes)
}

/// Validate a task payload.
///
/// With `partial` set, `title` and `status` are only checked when present.
pub fn validate_task_payload(payload: &Value, partial: bool) -> TaskValidation {
    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);
    let mut errors = Vec::new();
    let mut data = TaskChanges::default();

    if !partial || fields.contains_key("title") {
        match non_empty_string(fields.get("title")) {
            Some(title) => data.title = Some(title),
            None => errors.push(TITLE_REQUIRED.to_string()),
        }
    }

    if let Some(description) = fields.get("description") {
        data.description = Some(
            description
                .as_str()
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        );
    }

    if !partial || fields.contains_key("status") {
        let status = fields
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| TaskStatus::ALL.into_iter().find(|st| st.as_str() == s));
        match status {
            Some(status) => data.status = Some(status),
            None => errors.push(INVALID_STATUS.to_string()),
        }
    }

    if let Some(due) = fields.get("due_date") {
        match due.as_str().and_then(parse_due_date) {
            Some(due) => data.due_date = Some(due),
            None => errors.push(INVALID_DUE_DATE.to_string()),
        }
    }

    if let Some(duration) = fields.get("duration") {
        match parse_duration_minutes(duration) {
            Some(minutes) => data.duration = Some(format!("{minutes} minutes")),
            None => errors.push(INVALID_DURATION.to_string()),
        }
    }

    TaskValidation {
        valid: errors.is_empty(),
        errors,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::duration::normalize_duration;
    use serde_json::json;

    #[test]
    fn test_empty_title_is_rejected() {
        let result = validate_task_payload(&json!({"title": "", "status": "todo"}), false);
        assert!(!result.valid);
        assert!(result.errors.contains(&TITLE_REQUIRED.to_string()));
    }

    #[test]
    fn test_valid_payload() {
        let result = validate_task_payload(
            &json!({"title": "  Report ", "status": "todo", "due_date": "2030-01-01"}),
            false,
        );
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.data.title.as_deref(), Some("Report"));
        assert_eq!(result.data.status, Some(TaskStatus::Pending));
        assert_eq!(
            result.data.due_date.unwrap().to_rfc3339(),
            "2030-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_collects_every_error() {
        let result = validate_task_payload(
            &json!({"status": "archived", "due_date": "tomorrow", "duration": -5}),
            false,
        );
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![TITLE_REQUIRED, INVALID_STATUS, INVALID_DUE_DATE, INVALID_DURATION]
        );
    }

    #[test]
    fn test_partial_update_skips_missing_required_fields() {
        let result = validate_task_payload(&json!({"description": 12}), true);
        assert!(result.valid);
        assert_eq!(result.data.description.as_deref(), Some(""));
        assert_eq!(result.data.title, None);
        assert_eq!(result.data.status, None);

        let result = validate_task_payload(&json!({"title": "   "}), true);
        assert!(!result.valid);
    }

    #[test]
    fn test_duration_is_stored_as_interval_text() {
        let result = validate_task_payload(&json!({"duration": "90"}), true);
        assert_eq!(result.data.duration.as_deref(), Some("90 minutes"));
        assert_eq!(normalize_duration(result.data.duration.as_deref().unwrap()), Some(90));

        let result = validate_task_payload(&json!({"duration": 12.5}), true);
        assert_eq!(result.data.duration.as_deref(), Some("12.5 minutes"));
    }

    #[test]
    fn test_rfc3339_due_date_is_normalised_to_utc() {
        let result = validate_task_payload(&json!({"due_date": "2030-01-01T10:00:00+02:00"}), true);
        assert_eq!(
            result.data.due_date.unwrap().to_rfc3339(),
            "2030-01-01T08:00:00+00:00"
        );
    }

    #[test]
    fn test_changes_serialise_only_present_fields() {
        let changes = TaskChanges {
            title: Some("Report".into()),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"title": "Report", "status": "in_progress"})
        );
        assert!(TaskChanges::default().is_empty());
    }
}
