use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub company_id: Option<i64>,
    pub name: Option<String>,
}

/// A job posting. `departmant` is the backend's field name for the sector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub job_id: Option<i64>,
    pub position: Option<String>,
    pub departmant: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub created_at: Option<String>,
    pub company: Option<Company>,
}

impl Job {
    /// Calendar date of the deadline. Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.as_deref().and_then(parse_calendar_date)
    }
}

/// Calendar date of a deadline. Timestamps carrying an offset are moved to
/// local time first, so the date is the one the local user sees.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local).date_naive())
        })
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}
