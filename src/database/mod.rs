//! # Database Layer
//!
//! Collaborator interfaces for the managed data store and the identity
//! provider, plus the Supabase implementation used in production.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod supabase;

use crate::core::error::StoreResult;
use crate::core::model::{Task, UserPreference};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use supabase::SupabaseStore;

/// Read access the reminder pipeline needs from the data store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, across users, that are not done and fall due in `[from, to]`
    async fn fetch_upcoming_tasks(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>>;

    /// The preference record for one user, if they have one
    async fn get_preference(&self, user_id: &str) -> StoreResult<Option<UserPreference>>;
}

/// Contact lookup against the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user's email address, or `None` if the user has none (or does not exist)
    async fn get_user_email(&self, user_id: &str) -> StoreResult<Option<String>>;
}
