//! Domain model: tasks and per-user notification preferences
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Accept numeric task ids and normalise durations on read
//! - 1.0.0: Initial task and preference types

use crate::core::duration::deserialize_duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started yet
    #[serde(rename = "todo", alias = "pending")]
    Pending,
    /// Being worked on
    #[serde(rename = "in_progress", alias = "in-progress")]
    InProgress,
    /// Terminal; never reminded about
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    /// Every status value accepted on input
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire representation used by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "todo" | "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// A single task as stored in the `tasks` table.
///
/// Queries may select a subset of columns, so everything except the id,
/// owner, title and status is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "due_date", default)]
    pub due: Option<DateTime<Utc>>,
    /// Whole minutes
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ids are uuids in practice, but bigint primary keys come back as JSON numbers
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "task id must be a string or number, got {other}"
        ))),
    }
}

/// Per-user notification preference (the `profiles` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreference {
    pub user_id: String,
    pub display_name: Option<String>,
    pub notifications_enabled: bool,
}

impl UserPreference {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            notifications_enabled: true,
        }
    }
}

/// Where and how to address a reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContact {
    pub email: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(TaskStatus::Pending).unwrap(), json!("todo"));
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in_progress"));
        assert_eq!(serde_json::to_value(TaskStatus::Done).unwrap(), json!("done"));

        let pending: TaskStatus = serde_json::from_value(json!("pending")).unwrap();
        assert_eq!(pending, TaskStatus::Pending);
        assert!(serde_json::from_value::<TaskStatus>(json!("archived")).is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("DONE".parse::<TaskStatus>().is_err());
        assert!(TaskStatus::Done.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_task_from_partial_row() {
        let task: Task = serde_json::from_value(json!({
            "id": "7f1c",
            "title": "Report",
            "due_date": "2030-01-01T05:00:00+00:00",
            "status": "todo",
            "user_id": "u1"
        }))
        .unwrap();

        assert_eq!(task.id, "7f1c");
        assert_eq!(task.owner, "u1");
        assert_eq!(task.due.unwrap().to_rfc3339(), "2030-01-01T05:00:00+00:00");
        assert_eq!(task.duration, None);
        assert_eq!(task.description, None);
    }

    #[test]
    fn test_task_normalises_duration_and_numeric_id() {
        let task: Task = serde_json::from_value(json!({
            "id": 42,
            "title": "Gym",
            "status": "in_progress",
            "user_id": "u2",
            "due_date": null,
            "duration": "01:30:00"
        }))
        .unwrap();

        assert_eq!(task.id, "42");
        assert_eq!(task.due, None);
        assert_eq!(task.duration, Some(90));
    }

    #[test]
    fn test_preference_defaults_to_enabled() {
        let pref = UserPreference::new("u1");
        assert!(pref.notifications_enabled);
        assert_eq!(pref.display_name, None);
    }
}
