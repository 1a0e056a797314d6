//! Reminder email rendering

use super::digest::ReminderDigest;
use chrono::{DateTime, FixedOffset, Utc};

pub const REMINDER_SUBJECT: &str = "Taskly - upcoming task reminder";

const DUE_FORMAT: &str = "%d.%m.%Y, %H:%M";

/// Renders digests into the HTML body of a reminder email
#[derive(Debug, Clone)]
pub struct DigestRenderer {
    offset: FixedOffset,
    horizon_hours: i64,
}

impl DigestRenderer {
    pub fn new(offset: FixedOffset, horizon_hours: i64) -> Self {
        DigestRenderer {
            offset,
            horizon_hours,
        }
    }

    /// Due time as `DD.MM.YYYY, HH:MM` in the display offset
    pub fn format_due(&self, due: DateTime<Utc>) -> String {
        due.with_timezone(&self.offset).format(DUE_FORMAT).to_string()
    }

    pub fn render(&self, digest: &ReminderDigest) -> String {
        let items: String = digest
            .tasks
            .iter()
            .map(|task| {
                let due = task
                    .due
                    .map(|due| self.format_due(due))
                    .unwrap_or_else(|| "no due date".to_string());
                format!(
                    concat!(
                        "<li style=\"margin-bottom:12px;background:#1e1e24;padding:16px;border-radius:12px;\">",
                        "<strong style=\"color:#f1f5f9;\">{}</strong><br />",
                        "<span style=\"color:#cbd5f5;\">Due: {}</span>",
                        "</li>"
                    ),
                    escape_html(&task.title),
                    due
                )
            })
            .collect();

        format!(
            concat!(
                "<div style=\"background:#0f172a;color:#e2e8f0;font-family:'Segoe UI',sans-serif;padding:24px;\">",
                "<h1 style=\"color:#38bdf8;\">Hi {}!</h1>",
                "<p>These tasks are due within the next {} hours:</p>",
                "<ul style=\"list-style:none;padding:0;\">{}</ul>",
                "<p style=\"margin-top:16px;\">Good luck!<br />The Taskly team</p>",
                "</div>"
            ),
            escape_html(&digest.display_name),
            self.horizon_hours,
            items
        )
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
