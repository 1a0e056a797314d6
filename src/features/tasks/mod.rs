//! # Tasks Feature
//!
//! Payload validation and list parameters for a user's own tasks.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod query;
pub mod validator;

pub use query::{
    build_pagination, sanitize_sort, Pagination, SortField, SortOrder, SortSpec, TaskPage,
    TaskQuery,
};
pub use validator::{validate_task_payload, TaskChanges, TaskValidation};
