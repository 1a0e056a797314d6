//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Display offset and send concurrency for reminder digests
//! - 1.0.0: Store, SMTP and schedule settings

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

pub const DEFAULT_CRON_SCHEDULE: &str = "0 * * * *";
pub const DEFAULT_EMAIL_FROM: &str = "Taskly <no-reply@taskly.app>";
pub const DEFAULT_HORIZON_HOURS: i64 = 24;
pub const DEFAULT_SEND_CONCURRENCY: usize = 4;
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the Supabase project (REST + auth admin API)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
    pub timeout: Duration,
}

/// SMTP relay settings. Present only when host, port, user and password are all set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase: Option<SupabaseConfig>,
    pub smtp: Option<SmtpConfig>,
    pub email_from: String,
    pub cron_schedule: String,
    pub horizon_hours: i64,
    pub display_offset: FixedOffset,
    pub send_concurrency: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match get("STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow!("STORE_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"))?,
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
                timeout: Duration::from_secs(timeout_secs),
            }),
            _ => None,
        };

        let smtp = match (
            get("SMTP_HOST"),
            get("SMTP_PORT"),
            get("SMTP_USER"),
            get("SMTP_PASS"),
        ) {
            (Some(host), Some(port), Some(user), Some(password)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| anyhow!("SMTP_PORT must be a valid port number, got '{port}'"))?;
                Some(SmtpConfig {
                    host,
                    port,
                    user,
                    password,
                })
            }
            _ => None,
        };

        let horizon_hours = match get("REMINDER_HORIZON_HOURS") {
            Some(raw) => {
                let hours = raw
                    .parse::<i64>()
                    .map_err(|_| anyhow!("REMINDER_HORIZON_HOURS must be an integer, got '{raw}'"))?;
                if hours <= 0 {
                    return Err(anyhow!("REMINDER_HORIZON_HOURS must be positive, got {hours}"));
                }
                hours
            }
            None => DEFAULT_HORIZON_HOURS,
        };

        let display_offset = match get("REMINDER_TZ_OFFSET") {
            Some(raw) => parse_offset(&raw)?,
            None => utc_offset(),
        };

        let send_concurrency = match get("REMINDER_SEND_CONCURRENCY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("REMINDER_SEND_CONCURRENCY must be at least 1, got '{raw}'"))?,
            None => DEFAULT_SEND_CONCURRENCY,
        };

        Ok(Config {
            supabase,
            smtp,
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            cron_schedule: get("CRON_SCHEDULE").unwrap_or_else(|| DEFAULT_CRON_SCHEDULE.to_string()),
            horizon_hours,
            display_offset,
            send_concurrency,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::hours(self.horizon_hours)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse `+HH:MM`, `-HH:MM`, `+HH` or `Z` into a fixed offset
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    let invalid = || anyhow!("REMINDER_TZ_OFFSET must look like +02:00, got '{raw}'");

    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
