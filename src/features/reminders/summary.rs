//! Per-run bookkeeping of what happened to each owner's digest

use super::window::TimeWindow;
use log::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Transport not configured
    NotSent,
    OptedOut,
    Unresolved(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOutcome {
    pub owner: String,
    pub task_count: usize,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub window: TimeWindow,
    pub tasks_found: usize,
    pub fetch_error: Option<String>,
    /// In digest order
    pub outcomes: Vec<UserOutcome>,
}

impl RunSummary {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::Sent))
    }

    pub fn not_sent(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::NotSent))
    }

    /// Opted out or without a usable address
    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                DispatchOutcome::OptedOut | DispatchOutcome::Unresolved(_)
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::Failed(_)))
    }

    pub fn outcome_for(&self, owner: &str) -> Option<&DispatchOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.owner == owner)
            .map(|o| &o.outcome)
    }

    fn count(&self, pred: impl Fn(&DispatchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn log_summary(&self) {
        if let Some(e) = &self.fetch_error {
            warn!("Reminder run for {} found no work: {}", self.window, e);
            return;
        }

        info!(
            "Reminder run for {}: {} task(s), {} user(s), {} sent, {} not sent, {} skipped, {} failed",
            self.window,
            self.tasks_found,
            self.outcomes.len(),
            self.sent(),
            self.not_sent(),
            self.skipped(),
            self.failed()
        );
    }
}
