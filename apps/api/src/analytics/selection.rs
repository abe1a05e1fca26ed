use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytics::view::ApplicantView;
use crate::models::ApplicationStatus;

/// Application ids picked for a bulk accept/reject.
///
/// Only ever holds ids that are eligible-visible in the view it was last
/// checked against: visible under the active filter and not final.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<i64>);

impl SelectionSet {
    /// Builds a selection from client-held ids, dropping anything not
    /// eligible-visible in `view`.
    pub fn from_ids<I: IntoIterator<Item = i64>>(ids: I, view: &ApplicantView) -> Self {
        let mut selection = SelectionSet(ids.into_iter().collect());
        selection.reconcile(view);
        selection
    }

    pub fn contains(&self, application_id: i64) -> bool {
        self.0.contains(&application_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }

    /// Flips membership of one application. Final applications are never
    /// touched, and ids outside the eligible-visible set are never added.
    /// Returns whether the selection changed.
    pub fn toggle(&mut self, application_id: i64, view: &ApplicantView) -> bool {
        if let Some(app) = view.find(application_id) {
            if app.has_final_status() {
                warn!(
                    application_id,
                    status = app.status.as_str(),
                    "Cannot select applicant, status is final"
                );
                return false;
            }
        }

        if self.0.remove(&application_id) {
            return true;
        }
        if view.is_eligible(application_id) {
            self.0.insert(application_id);
            return true;
        }
        debug!(application_id, "Ignoring toggle for application not visible in view");
        false
    }

    /// Replaces the selection with every eligible-visible application.
    pub fn select_all_visible(&mut self, view: &ApplicantView) {
        self.0 = view.eligible_ids.iter().copied().collect();
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    /// True iff something is eligible and all of it is selected.
    pub fn is_all_eligible_selected(&self, view: &ApplicantView) -> bool {
        !view.eligible_ids.is_empty() && view.eligible_ids.iter().all(|id| self.0.contains(id))
    }

    /// Drops ids that are no longer eligible-visible in `view`. Returns the
    /// dropped ids.
    pub fn reconcile(&mut self, view: &ApplicantView) -> Vec<i64> {
        let dropped: Vec<i64> = self
            .0
            .iter()
            .copied()
            .filter(|id| !view.is_eligible(*id))
            .collect();
        for id in &dropped {
            self.0.remove(id);
        }
        if !dropped.is_empty() {
            debug!(?dropped, "Pruned selection to eligible-visible applications");
        }
        dropped
    }

    /// Records a status change, removing the application from the selection
    /// when the new status is final.
    pub fn apply_status_change(&mut self, application_id: i64, status: ApplicationStatus) {
        if status.is_final() {
            self.0.remove(&application_id);
        }
    }
}
