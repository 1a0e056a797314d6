//! # Reminders Feature
//!
//! Periodic email digests of tasks due within the reminder horizon, one per
//! user, honouring each user's notification opt-out.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Per-user email digests on a cron schedule with a single-run guard
//! - 1.0.0: Initial scheduled reminders

pub mod digest;
pub mod dispatcher;
pub mod fetcher;
pub mod resolver;
pub mod scheduler;
pub mod summary;
pub mod template;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use digest::{group_by_owner, DigestCandidate, ReminderDigest};
pub use dispatcher::Dispatcher;
pub use fetcher::{fetch_due_tasks, FetchOutcome};
pub use resolver::{display_name_for, Resolution, UserResolver, FALLBACK_DISPLAY_NAME};
pub use scheduler::{parse_schedule, run_until_shutdown, ReminderScheduler};
pub use summary::{DispatchOutcome, RunSummary, UserOutcome};
pub use template::{escape_html, DigestRenderer, REMINDER_SUBJECT};
pub use window::TimeWindow;
