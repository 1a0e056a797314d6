//! Upcoming-task fetch. Store trouble never fails a run: it just means no work.

use super::window::TimeWindow;
use crate::core::model::Task;
use crate::database::TaskStore;
use log::warn;

/// What the fetch produced, with the reason when it came back empty on error
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub tasks: Vec<Task>,
    pub error: Option<String>,
}

/// Fetch every non-done task due inside `window`.
///
/// Rows outside the window, without a due date, or already done are dropped
/// even if the store returned them.
pub async fn fetch_due_tasks(store: &dyn TaskStore, window: &TimeWindow) -> FetchOutcome {
    match store.fetch_upcoming_tasks(window.start, window.end).await {
        Ok(tasks) => FetchOutcome {
            tasks: tasks
                .into_iter()
                .filter(|task| !task.status.is_terminal())
                .filter(|task| task.due.map(|due| window.contains(due)).unwrap_or(false))
                .collect(),
            error: None,
        },
        Err(e) => {
            warn!("Failed to fetch tasks due for reminders, treating run as empty: {e}");
            FetchOutcome {
                tasks: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
