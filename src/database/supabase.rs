//! Supabase REST client
//!
//! Talks to PostgREST (`/rest/v1`) for the `tasks` and `profiles` tables and to
//! the GoTrue admin API (`/auth/v1/admin`) for account data. Every request is
//! made with the service-role key, so callers are responsible for scoping
//! queries to the right user.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Task list, task writes, profile upserts and account deletion
//! - 1.0.0: Reminder queries (upcoming tasks, preference, user email)

use crate::core::config::SupabaseConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::model::{Task, UserPreference};
use crate::database::{IdentityProvider, TaskStore};
use crate::features::tasks::{TaskChanges, TaskPage, TaskQuery};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const REMINDER_TASK_COLUMNS: &str = "id,title,due_date,status,user_id";
const PROFILE_COLUMNS: &str = "username,notifications_enabled";
const DEFAULT_PROFILE_NAME: &str = "New user";
const MIN_DISPLAY_NAME_CHARS: usize = 3;

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    notifications_enabled: Option<bool>,
}

impl ProfileRow {
    fn into_preference(self, user_id: &str) -> UserPreference {
        UserPreference {
            user_id: user_id.to_string(),
            display_name: self.username.filter(|name| !name.trim().is_empty()),
            notifications_enabled: self.notifications_enabled.unwrap_or(true),
        }
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// Total row count from a PostgREST `Content-Range` header (`0-9/42`, `*/0`)
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Decode rows one at a time so a single malformed row only costs that row
fn decode_task_rows(rows: Vec<Value>) -> Vec<Task> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Task>(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Skipping malformed task row (id {id}): {e}");
                    None
                }
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("taskly-reminders/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(SupabaseStore {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_role_key.clone(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn admin_user_url(&self, user_id: &str) -> StoreResult<String> {
        if user_id.is_empty()
            || !user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::Invalid(format!("malformed user id '{user_id}'")));
        }
        Ok(format!("{}/auth/v1/admin/users/{}", self.base_url, user_id))
    }

    /// Attach credentials, send, and turn non-2xx answers into errors
    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("msg"))
                    .or_else(|| v.get("error_description"))
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// One page of a user's tasks with filters, sorting and an exact total
    pub async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> StoreResult<TaskPage> {
        let mut params: Vec<(&str, String)> =
            vec![("select", "*".to_string()), ("user_id", eq(user_id))];

        if let Some(status) = query.status {
            params.push(("status", eq(status.as_str())));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("title", format!("ilike.*{search}*")));
        }
        if let Some(from) = query.due_from {
            params.push(("due_date", format!("gte.{}", timestamp(from))));
        }
        if let Some(to) = query.due_to {
            params.push(("due_date", format!("lte.{}", timestamp(to))));
        }

        let pagination = &query.pagination;
        params.push((
            "order",
            format!("{}.{}", query.sort.field.column(), query.sort.order.as_str()),
        ));
        params.push(("offset", pagination.from.to_string()));
        params.push(("limit", pagination.limit.to_string()));

        let response = self
            .send(
                self.client
                    .get(self.rest_url("tasks"))
                    .query(&params)
                    .header("Prefer", "count=exact"),
            )
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let tasks: Vec<Task> = Self::read_json(response).await?;
        let total = total.unwrap_or(tasks.len() as u64);
        Ok(TaskPage::new(tasks, pagination, total))
    }

    pub async fn create_task(&self, user_id: &str, changes: &TaskChanges) -> StoreResult<Task> {
        if changes.title.is_none() || changes.status.is_none() {
            return Err(StoreError::Invalid(
                "a new task needs a title and a status".to_string(),
            ));
        }

        let now = timestamp(Utc::now());
        let mut body =
            serde_json::to_value(changes).map_err(|e| StoreError::Invalid(e.to_string()))?;
        if let Value::Object(map) = &mut body {
            map.insert("user_id".to_string(), json!(user_id));
            map.insert("created_at".to_string(), json!(now));
            map.insert("updated_at".to_string(), json!(now));
        }

        let response = self
            .send(
                self.client
                    .post(self.rest_url("tasks"))
                    .header("Prefer", "return=representation")
                    .json(&body),
            )
            .await?;

        let rows: Vec<Task> = Self::read_json(response).await?;
        let task = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;
        debug!("Created task {} for user {}", task.id, user_id);
        Ok(task)
    }

    /// Apply `changes` to one of the user's tasks. A task owned by someone else is `NotFound`.
    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        changes: &TaskChanges,
    ) -> StoreResult<Task> {
        if changes.is_empty() {
            return Err(StoreError::Invalid("no changes to apply".to_string()));
        }

        let mut body =
            serde_json::to_value(changes).map_err(|e| StoreError::Invalid(e.to_string()))?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(timestamp(Utc::now())));
        }

        let response = self
            .send(
                self.client
                    .patch(self.rest_url("tasks"))
                    .query(&[("id", eq(task_id)), ("user_id", eq(user_id))])
                    .header("Prefer", "return=representation")
                    .json(&body),
            )
            .await?;

        let rows: Vec<Task> = Self::read_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("task {task_id}")))
    }

    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> StoreResult<()> {
        self.send(
            self.client
                .delete(self.rest_url("tasks"))
                .query(&[("id", eq(task_id)), ("user_id", eq(user_id))]),
        )
        .await?;
        debug!("Deleted task {} for user {}", task_id, user_id);
        Ok(())
    }

    /// Return the user's profile, creating it from the email local part if missing
    pub async fn ensure_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> StoreResult<UserPreference> {
        if let Some(existing) = self.get_preference(user_id).await? {
            return Ok(existing);
        }

        let username = email
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(DEFAULT_PROFILE_NAME);

        let response = self
            .send(
                self.client
                    .post(self.rest_url("profiles"))
                    .query(&[("select", PROFILE_COLUMNS)])
                    .header("Prefer", "return=representation")
                    .json(&json!({ "user_id": user_id, "username": username })),
            )
            .await?;

        info!("Created profile for user {}", user_id);
        self.single_profile(response, user_id).await
    }

    pub async fn update_display_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> StoreResult<UserPreference> {
        let name = name.trim();
        if name.chars().count() < MIN_DISPLAY_NAME_CHARS {
            return Err(StoreError::Invalid(format!(
                "display name must be at least {MIN_DISPLAY_NAME_CHARS} characters"
            )));
        }
        self.upsert_profile(user_id, json!({ "user_id": user_id, "username": name }))
            .await
    }

    pub async fn set_notifications_enabled(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> StoreResult<UserPreference> {
        self.upsert_profile(
            user_id,
            json!({ "user_id": user_id, "notifications_enabled": enabled }),
        )
        .await
    }

    async fn upsert_profile(&self, user_id: &str, body: Value) -> StoreResult<UserPreference> {
        let response = self
            .send(
                self.client
                    .post(self.rest_url("profiles"))
                    .query(&[("on_conflict", "user_id"), ("select", PROFILE_COLUMNS)])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&body),
            )
            .await?;
        self.single_profile(response, user_id).await
    }

    async fn single_profile(&self, response: Response, user_id: &str) -> StoreResult<UserPreference> {
        let rows: Vec<ProfileRow> = Self::read_json(response).await?;
        rows.into_iter()
            .next()
            .map(|row| row.into_preference(user_id))
            .ok_or_else(|| StoreError::Decode("profile write returned no rows".to_string()))
    }

    /// Remove the user's tasks, then their profile, then the account itself
    pub async fn delete_account(&self, user_id: &str) -> StoreResult<()> {
        let admin_url = self.admin_user_url(user_id)?;

        self.send(
            self.client
                .delete(self.rest_url("tasks"))
                .query(&[("user_id", eq(user_id))]),
        )
        .await?;
        self.send(
            self.client
                .delete(self.rest_url("profiles"))
                .query(&[("user_id", eq(user_id))]),
        )
        .await?;

        match self.send(self.client.delete(admin_url)).await {
            Ok(_) | Err(StoreError::NotFound(_)) => {
                info!("Deleted account {}", user_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TaskStore for SupabaseStore {
    async fn fetch_upcoming_tasks(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        let response = self
            .send(self.client.get(self.rest_url("tasks")).query(&[
                ("select", REMINDER_TASK_COLUMNS.to_string()),
                ("status", "neq.done".to_string()),
                ("due_date", format!("gte.{}", timestamp(from))),
                ("due_date", format!("lte.{}", timestamp(to))),
                ("order", "due_date.asc".to_string()),
            ]))
            .await?;
        let rows: Vec<Value> = Self::read_json(response).await?;
        Ok(decode_task_rows(rows))
    }

    async fn get_preference(&self, user_id: &str) -> StoreResult<Option<UserPreference>> {
        let response = self
            .send(self.client.get(self.rest_url("profiles")).query(&[
                ("select", PROFILE_COLUMNS.to_string()),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ]))
            .await?;
        let rows: Vec<ProfileRow> = Self::read_json(response).await?;
        Ok(rows.into_iter().next().map(|row| row.into_preference(user_id)))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseStore {
    async fn get_user_email(&self, user_id: &str) -> StoreResult<Option<String>> {
        let url = self.admin_user_url(user_id)?;
        let response = match self.send(self.client.get(url)).await {
            Ok(response) => response,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body: Value = Self::read_json(response).await?;
        Ok(body
            .get("email")
            .or_else(|| body.pointer("/user/email"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(String::from))
    }
}
