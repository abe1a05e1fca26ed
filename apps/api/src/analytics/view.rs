use serde::Serialize;

use crate::analytics::filter::{filter_and_sort, ApplicantFilter};
use crate::models::Application;

/// Derived job-detail view: the visible applicants under one filter, plus
/// which of them are still open to accept/reject actions.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantView {
    pub filter: ApplicantFilter,
    pub applicants: Vec<Application>,
    /// Visible applications without a final status, in display order.
    pub eligible_ids: Vec<i64>,
}

impl ApplicantView {
    pub fn build(applications: &[Application], filter: ApplicantFilter) -> Self {
        let applicants = filter_and_sort(applications, &filter);
        let eligible_ids = applicants
            .iter()
            .filter(|app| !app.has_final_status())
            .filter_map(|app| app.application_id)
            .collect();
        ApplicantView {
            filter,
            applicants,
            eligible_ids,
        }
    }

    pub fn is_eligible(&self, application_id: i64) -> bool {
        self.eligible_ids.contains(&application_id)
    }

    pub fn find(&self, application_id: i64) -> Option<&Application> {
        self.applicants
            .iter()
            .find(|app| app.application_id == Some(application_id))
    }
}
