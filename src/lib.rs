// Core layer - shared types, configuration and errors
pub mod core;

// Features layer - reminder pipeline and task helpers
pub mod features;

// Infrastructure - data store and identity provider
pub mod database;

// Infrastructure - outgoing email
pub mod mailer;

// Re-export core config
pub use core::Config;

// Re-export collaborator seams
pub use database::{IdentityProvider, SupabaseStore, TaskStore};
pub use mailer::{EmailTransport, OutgoingEmail, SmtpMailer};

// Re-export feature items
pub use features::{
    // Reminders
    ReminderScheduler, RunSummary, TimeWindow,
    // Tasks
    validate_task_payload, TaskPage, TaskQuery,
};
