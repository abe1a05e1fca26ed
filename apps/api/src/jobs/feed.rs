//! Job feed for applicants: sector and position filters over all open jobs.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::jobs::gating::{has_applied, job_deadline_passed};
use crate::jobs::sector::{normalize_sector, resolve_effective_sector, EffectiveSector};
use crate::models::{Application, Cv, Job};

/// Feed filter as chosen by the user. Blank values mean "not set".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub cv_id: Option<String>,
    pub position: Option<String>,
}

impl JobFilter {
    fn position_needle(&self) -> Option<String> {
        self.position
            .as_deref()
            .map(|p| p.to_lowercase().trim().to_string())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredJobs {
    pub effective_sector: EffectiveSector,
    pub jobs: Vec<Job>,
}

/// Applies the sector filter, then the position filter, to a copy of `jobs`.
///
/// Both filters intersect; neither replaces the other.
pub fn filter_jobs(jobs: &[Job], cvs: &[Cv], filter: &JobFilter, initial_sector: &str) -> FilteredJobs {
    let effective_sector = resolve_effective_sector(cvs, filter.cv_id.as_deref(), initial_sector);

    let mut visible: Vec<Job> = match effective_sector.sector.as_deref() {
        Some(sector) => jobs
            .iter()
            .filter(|job| job.departmant.as_deref().map(normalize_sector).as_deref() == Some(sector))
            .cloned()
            .collect(),
        None => jobs.to_vec(),
    };
    debug!(
        sector = ?effective_sector.sector,
        remaining = visible.len(),
        "Applied sector filter"
    );

    if let Some(needle) = filter.position_needle() {
        visible.retain(|job| {
            job.position
                .as_deref()
                .map_or(false, |p| p.to_lowercase().contains(&needle))
        });
        debug!(position = %needle, remaining = visible.len(), "Applied position filter");
    }

    FilteredJobs {
        effective_sector,
        jobs: visible,
    }
}

/// The feed with filters cleared: no CV selection, no position text, so
/// only the initial-sector rule applies.
pub fn clear_filters(jobs: &[Job], cvs: &[Cv], initial_sector: &str) -> FilteredJobs {
    filter_jobs(jobs, cvs, &JobFilter::default(), initial_sector)
}

/// A feed entry annotated with whether the apply action is available.
#[derive(Debug, Clone, Serialize)]
pub struct JobCard {
    #[serde(flatten)]
    pub job: Job,
    pub deadline_passed: bool,
    pub has_applied: bool,
    pub can_apply: bool,
}

pub fn annotate<Tz: TimeZone>(
    jobs: Vec<Job>,
    applications: &[Application],
    now: &DateTime<Tz>,
) -> Vec<JobCard> {
    jobs.into_iter()
        .map(|job| {
            let deadline_passed = job_deadline_passed(&job, now);
            let has_applied = has_applied(&job, applications);
            JobCard {
                job,
                deadline_passed,
                has_applied,
                can_apply: !deadline_passed && !has_applied,
            }
        })
        .collect()
}
