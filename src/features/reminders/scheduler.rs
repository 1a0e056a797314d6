//! Cron-driven reminder trigger
//!
//! Runs the fetch, group, resolve and send pipeline once at startup and then on
//! every fire of the configured schedule. At most one run is in flight; a fire
//! that lands while a run is still going is dropped.

use super::digest::group_by_owner;
use super::dispatcher::Dispatcher;
use super::fetcher::fetch_due_tasks;
use super::resolver::UserResolver;
use super::summary::RunSummary;
use super::template::DigestRenderer;
use super::window::TimeWindow;
use crate::core::config::Config;
use crate::database::{IdentityProvider, TaskStore};
use crate::mailer::EmailTransport;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use log::{debug, error, info, warn};
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct ReminderScheduler {
    store: Arc<dyn TaskStore>,
    dispatcher: Dispatcher,
    horizon: Duration,
    schedule: Schedule,
    schedule_expr: String,
    running: AtomicBool,
}

/// Clears the in-flight flag when the run ends, including by panic
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ReminderScheduler {
    /// Wire the pipeline from its collaborators. An invalid cron expression
    /// is a configuration error.
    pub fn new(
        store: Arc<dyn TaskStore>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn EmailTransport>,
        config: &Config,
    ) -> Result<Self> {
        let schedule = parse_schedule(&config.cron_schedule)?;
        let dispatcher = Dispatcher::new(
            UserResolver::new(store.clone(), identity),
            transport,
            DigestRenderer::new(config.display_offset, config.horizon_hours),
            config.send_concurrency,
        );

        Ok(ReminderScheduler {
            store,
            dispatcher,
            horizon: config.horizon(),
            schedule,
            schedule_expr: config.cron_schedule.clone(),
            running: AtomicBool::new(false),
        })
    }

    pub fn schedule_expr(&self) -> &str {
        &self.schedule_expr
    }

    /// One full pass for the window starting at `now`. Ignores the run guard.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunSummary {
        let window = TimeWindow::starting_at(now, self.horizon);
        info!("Reminder run started for {window}");

        let fetched = fetch_due_tasks(self.store.as_ref(), &window).await;
        let tasks_found = fetched.tasks.len();
        let candidates = group_by_owner(fetched.tasks);
        debug!("{} task(s) across {} user(s) due", tasks_found, candidates.len());

        let outcomes = self.dispatcher.dispatch_all(candidates).await;
        let summary = RunSummary {
            window,
            tasks_found,
            fetch_error: fetched.error,
            outcomes,
        };
        summary.log_summary();
        summary
    }

    /// Run now unless a run is already in progress, in which case `None`
    pub async fn run_once(&self) -> Option<RunSummary> {
        let Some(_guard) = self.try_begin_run() else {
            warn!("Previous reminder run still in progress, skipping this fire");
            return None;
        };
        Some(self.run_at(Utc::now()).await)
    }

    fn try_begin_run(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                flag: &self.running,
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Start a run in the background; a panic inside it is logged, not propagated
    fn launch(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run_once().await;
        });
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                error!("Reminder run aborted: {e}");
            }
        });
    }

    /// Fire once immediately, then on every schedule tick, forever
    pub async fn run(self: Arc<Self>) {
        info!("Reminder scheduler started (schedule: '{}')", self.schedule_expr);
        self.launch();

        loop {
            let now = Utc::now();
            let Some(next) = self.next_fire_after(now) else {
                warn!(
                    "Schedule '{}' has no upcoming fire times, reminder scheduler stopping",
                    self.schedule_expr
                );
                return;
            };
            debug!("Next reminder run at {}", next.to_rfc3339());

            let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(wait).await;
            self.launch();
        }
    }
}

/// Keep the scheduler task alive until `shutdown` resolves, then stop it.
///
/// If the shutdown signal cannot be listened for, the scheduler keeps running
/// and this waits on it instead.
pub async fn run_until_shutdown<F>(scheduler_task: JoinHandle<()>, shutdown: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match shutdown.await {
        Ok(()) => {
            info!("Shutdown signal received, stopping reminder scheduler");
            scheduler_task.abort();
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal, reminder scheduler keeps running: {e}");
            if let Err(e) = scheduler_task.await {
                error!("Reminder scheduler stopped: {e}");
            }
        }
    }
}

/// Parse a cron expression.
///
/// Five-field expressions (`min hour dom month dow`) get a zero seconds field
/// and their day-of-week numbers shifted from the 0-7 convention (0 and 7 are
/// Sunday) to the 1-7 one used by the parser (1 is Sunday). Six and seven
/// field expressions are taken as they are.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let normalized = match fields.as_slice() {
        [min, hour, dom, month, dow] => format!(
            "0 {} {} {} {} {}",
            min,
            hour,
            dom,
            month,
            translate_day_of_week(dow)
        ),
        _ if fields.len() == 6 || fields.len() == 7 => fields.join(" "),
        _ => {
            return Err(anyhow!(
                "Invalid CRON_SCHEDULE '{expr}': expected 5, 6 or 7 fields, got {}",
                fields.len()
            ))
        }
    };

    Schedule::from_str(&normalized).map_err(|e| anyhow!("Invalid CRON_SCHEDULE '{expr}': {e}"))
}

fn translate_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(translate_dow_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn translate_dow_item(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };

    let bounds = match base.split_once('-') {
        Some((from, to)) => from.parse::<u32>().ok().zip(to.parse::<u32>().ok()),
        // `3/2` runs from 3 to the end of the week
        None => base
            .parse::<u32>()
            .ok()
            .map(|day| (day, if step.is_some() { 7 } else { day })),
    };

    // `*`, `?` and day names are the same in both conventions; out-of-range
    // numbers are left for the parser to reject
    let Some((from, to)) = bounds.filter(|(from, to)| *from <= 7 && *to <= 7) else {
        return item.to_string();
    };

    let shift = |n: u32| n % 7 + 1;

    match step {
        None if from == to => shift(from).to_string(),
        None if shift(from) <= shift(to) => format!("{}-{}", shift(from), shift(to)),
        // Range ran through Sunday, e.g. 5-7 -> 6-1
        None => format!("{}-7,1-{}", shift(from), shift(to)),
        Some(step) => {
            let Some(step) = step.parse::<usize>().ok().filter(|s| *s > 0) else {
                return item.to_string();
            };
            // Step over the 0-7 sequence first, then shift each day
            let mut days: Vec<u32> = Vec::new();
            for day in (from..=to).step_by(step).map(shift) {
                if !days.contains(&day) {
                    days.push(day);
                }
            }
            days.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
