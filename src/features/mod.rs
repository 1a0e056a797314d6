//! # Features
//!
//! Each feature lives in its own module and carries its version in the
//! module header.

pub mod reminders;
pub mod tasks;

pub use reminders::{ReminderScheduler, RunSummary, TimeWindow};
pub use tasks::{validate_task_payload, TaskPage, TaskQuery};

/// Registry entry for a feature module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub toggleable: bool,
}

pub fn get_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            id: "reminders",
            name: "Reminders",
            version: "2.0.0",
            toggleable: true,
        },
        FeatureInfo {
            id: "tasks",
            name: "Tasks",
            version: "1.0.0",
            toggleable: false,
        },
    ]
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
