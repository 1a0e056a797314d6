//! # Core Module
//!
//! Domain types, configuration, and error handling shared by the reminder
//! pipeline and the task helpers.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add typed collaborator errors
//! - 1.1.0: Add duration normalisation for stored task durations
//! - 1.0.0: Initial creation with config and model modules

pub mod config;
pub mod duration;
pub mod error;
pub mod model;

// Re-export commonly used items
pub use config::{Config, SmtpConfig, SupabaseConfig};
pub use duration::{normalize_duration, normalize_duration_value};
pub use error::{MailError, StoreError};
pub use model::{Task, TaskStatus, UserContact, UserPreference};
