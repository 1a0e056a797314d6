//! In-memory collaborators for pipeline tests

use crate::core::error::{MailError, StoreError, StoreResult};
use crate::core::model::{Task, TaskStatus, UserPreference};
use crate::database::{IdentityProvider, TaskStore};
use crate::mailer::{EmailTransport, OutgoingEmail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn task(id: &str, owner: &str, due: &str) -> Task {
    Task {
        id: id.to_string(),
        owner: owner.to_string(),
        title: format!("Task {id}"),
        description: None,
        status: TaskStatus::Pending,
        due: Some(utc(due)),
        duration: None,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
pub struct FakeStore {
    tasks: Vec<Task>,
    fail_fetch: bool,
    preferences: HashMap<String, UserPreference>,
    failing_preferences: HashSet<String>,
    fetches: Mutex<usize>,
}

impl FakeStore {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        FakeStore {
            tasks,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        FakeStore {
            fail_fetch: true,
            ..Default::default()
        }
    }

    pub fn with_preference(mut self, user_id: &str, name: Option<&str>, enabled: bool) -> Self {
        self.preferences.insert(
            user_id.to_string(),
            UserPreference {
                user_id: user_id.to_string(),
                display_name: name.map(String::from),
                notifications_enabled: enabled,
            },
        );
        self
    }

    pub fn with_failing_preference(mut self, user_id: &str) -> Self {
        self.failing_preferences.insert(user_id.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl TaskStore for FakeStore {
    async fn fetch_upcoming_tasks(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        *self.fetches.lock().unwrap() += 1;
        if self.fail_fetch {
            return Err(StoreError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        // Returns every task; window filtering happens in the fetcher
        Ok(self.tasks.clone())
    }

    async fn get_preference(&self, user_id: &str) -> StoreResult<Option<UserPreference>> {
        if self.failing_preferences.contains(user_id) {
            return Err(StoreError::Api {
                status: 500,
                message: "profile lookup failed".to_string(),
            });
        }
        Ok(self.preferences.get(user_id).cloned())
    }
}

/// Panics on the first fetch, then behaves like the wrapped store
pub struct PanicOnceStore {
    inner: FakeStore,
    panicked: AtomicBool,
}

impl PanicOnceStore {
    pub fn new(inner: FakeStore) -> Self {
        PanicOnceStore {
            inner,
            panicked: AtomicBool::new(false),
        }
    }

    pub fn has_panicked(&self) -> bool {
        self.panicked.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetch_count()
    }
}

#[async_trait]
impl TaskStore for PanicOnceStore {
    async fn fetch_upcoming_tasks(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("store blew up mid-run");
        }
        self.inner.fetch_upcoming_tasks(from, to).await
    }

    async fn get_preference(&self, user_id: &str) -> StoreResult<Option<UserPreference>> {
        self.inner.get_preference(user_id).await
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    emails: HashMap<String, String>,
    failing: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, user_id: &str, email: &str) -> Self {
        self.emails.insert(user_id.to_string(), email.to_string());
        self
    }

    pub fn with_failure(mut self, user_id: &str) -> Self {
        self.failing.insert(user_id.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_user_email(&self, user_id: &str) -> StoreResult<Option<String>> {
        self.lookups.lock().unwrap().push(user_id.to_string());
        if self.failing.contains(user_id) {
            return Err(StoreError::Api {
                status: 502,
                message: "identity provider unavailable".to_string(),
            });
        }
        Ok(self.emails.get(user_id).cloned())
    }
}

/// Records every message; can be told to fail for particular recipients
pub struct RecordingTransport {
    configured: bool,
    failing_recipients: HashSet<String>,
    delays: HashMap<String, Duration>,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        RecordingTransport {
            configured: true,
            failing_recipients: HashSet::new(),
            delays: HashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        RecordingTransport {
            configured: false,
            ..Self::new()
        }
    }

    pub fn failing_for(mut self, address: &str) -> Self {
        self.failing_recipients.insert(address.to_string());
        self
    }

    /// Hold sends to `address` for `delay` before recording them
    pub fn delaying_for(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = self.sent().into_iter().map(|e| e.to).collect();
        recipients.sort();
        recipients
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<bool, MailError> {
        if !self.configured {
            return Ok(false);
        }
        if let Some(delay) = self.delays.get(&email.to) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_recipients.contains(&email.to) {
            return Err(MailError::Transport("550 mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(true)
    }
}
