use serde::{Deserialize, Deserializer, Serialize};

use crate::models::job::Job;

/// Review status of an application. The backend omits it for fresh
/// submissions, which are treated as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    /// Accepted and rejected are terminal: no further accept/reject action applies.
    pub fn is_final(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    fn from_backend(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("accepted") => ApplicationStatus::Accepted,
            Some("rejected") => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(ApplicationStatus::from_backend(raw.as_deref()))
    }
}

/// The applicant account nested inside an application record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicantUser {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ApplicantUser {
    /// "First Last", trimmed. Empty when neither part is known.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn resolvable_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

/// One user's submission to one job, as returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    pub application_id: Option<i64>,
    pub job_id: Option<i64>,
    pub user_id: Option<i64>,
    pub cv_id: Option<i64>,
    /// Resume-to-job similarity in [0,1]. Non-numeric values are read as absent.
    #[serde(deserialize_with = "lenient_score")]
    pub similarity_score: Option<f64>,
    pub status: ApplicationStatus,
    pub user: Option<ApplicantUser>,
    pub job: Option<Job>,
    pub created_at: Option<String>,
}

impl Application {
    pub fn has_final_status(&self) -> bool {
        self.status.is_final()
    }
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|score| score.is_finite()))
}
