use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

use crate::models::{Application, Job};

/// A user-facing reason the apply action is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyBlock {
    DeadlinePassed,
    AlreadyApplied,
}

impl ApplyBlock {
    pub fn message(self) -> &'static str {
        match self {
            ApplyBlock::DeadlinePassed => "The application deadline for this job has passed.",
            ApplyBlock::AlreadyApplied => "You have already applied for this job.",
        }
    }
}

/// True once `now` is past 23:59:59.999 local time on the deadline date.
pub fn deadline_passed<Tz: TimeZone>(deadline: NaiveDate, now: &DateTime<Tz>) -> bool {
    let end_of_day = deadline.and_time(end_of_day_time());
    now.with_timezone(&Local).naive_local() > end_of_day
}

fn end_of_day_time() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

/// Jobs without a readable deadline never expire.
pub fn job_deadline_passed<Tz: TimeZone>(job: &Job, now: &DateTime<Tz>) -> bool {
    job.deadline_date()
        .map_or(false, |deadline| deadline_passed(deadline, now))
}

pub fn has_applied(job: &Job, applications: &[Application]) -> bool {
    job.job_id.map_or(false, |job_id| {
        applications.iter().any(|app| {
            app.job_id == Some(job_id)
                || app.job.as_ref().and_then(|j| j.job_id) == Some(job_id)
        })
    })
}

/// Checks whether the user may apply to `job` right now.
pub fn check_can_apply<Tz: TimeZone>(
    job: &Job,
    applications: &[Application],
    now: &DateTime<Tz>,
) -> Result<(), ApplyBlock> {
    if job_deadline_passed(job, now) {
        return Err(ApplyBlock::DeadlinePassed);
    }
    if has_applied(job, applications) {
        return Err(ApplyBlock::AlreadyApplied);
    }
    Ok(())
}
