//! Accept/reject email batches.
//!
//! A batch is built from a target set of application ids. Ids that cannot be
//! sent (unknown, no resolvable email, already final) are skipped and logged
//! without failing the rest. The backend send itself is atomic per request,
//! so every queued recipient shares the outcome of that one call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::selection::SelectionSet;
use crate::analytics::view::ApplicantView;
use crate::backend::{BackendError, JobBoardBackend};
use crate::models::{Application, ApplicationStatus};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailAction {
    Accept,
    Reject,
}

impl EmailAction {
    /// Status the application ends up in once the email is sent.
    pub fn resulting_status(self) -> ApplicationStatus {
        match self {
            EmailAction::Accept => ApplicationStatus::Accepted,
            EmailAction::Reject => ApplicationStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmailAction::Accept => "accept",
            EmailAction::Reject => "reject",
        }
    }
}

impl fmt::Display for EmailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(EmailAction::Accept),
            "reject" => Ok(EmailAction::Reject),
            other => Err(format!("Invalid email type '{other}', expected accept or reject")),
        }
    }
}

/// One recipient in the backend's bulk-send contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRecipient {
    pub application_id: i64,
    pub name: String,
    pub email: String,
}

/// Body of `POST /application/send-bulk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEmailRequest {
    pub applicants: Vec<BulkRecipient>,
    #[serde(rename = "type")]
    pub action: EmailAction,
}

/// Body of `POST /application/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmailRequest {
    pub application_id: i64,
    #[serde(rename = "type")]
    pub action: EmailAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownApplication,
    MissingEmail,
    FinalStatus,
    /// Hidden by the active score filter.
    NotVisible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecipientOutcome {
    /// Built into the request, not yet sent.
    Queued,
    Sent,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientResult {
    pub application_id: i64,
    #[serde(flatten)]
    pub outcome: RecipientOutcome,
}

/// A prepared batch: the request to send (if any) plus the fate of every
/// targeted id.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkBatch {
    pub action: EmailAction,
    pub request: Option<BulkEmailRequest>,
    pub results: Vec<RecipientResult>,
}

/// Builds the bulk request for `target_ids`, looking applicants up in the
/// full application list. An empty batch yields `request: None`.
pub fn prepare_bulk_batch(
    target_ids: &[i64],
    applications: &[Application],
    action: EmailAction,
) -> BulkBatch {
    let mut recipients = Vec::new();
    let mut results = Vec::with_capacity(target_ids.len());

    for &application_id in target_ids {
        let outcome = match resolve_recipient(application_id, applications) {
            Ok(recipient) => {
                recipients.push(recipient);
                RecipientOutcome::Queued
            }
            Err(reason) => {
                warn!(application_id, ?reason, "Skipping applicant during bulk email preparation");
                RecipientOutcome::Skipped { reason }
            }
        };
        results.push(RecipientResult {
            application_id,
            outcome,
        });
    }

    let request = (!recipients.is_empty()).then(|| BulkEmailRequest {
        applicants: recipients,
        action,
    });

    BulkBatch {
        action,
        request,
        results,
    }
}

/// Builds the batch for a client-held selection. The selection is first
/// pruned against `view`; pruned ids are reported as skipped alongside the
/// batch so the caller sees the fate of every id it asked for.
pub fn prepare_selection_batch(
    requested: &[i64],
    view: &ApplicantView,
    applications: &[Application],
    action: EmailAction,
) -> (SelectionSet, BulkBatch) {
    let selection = SelectionSet::from_ids(requested.iter().copied(), view);
    let mut batch = prepare_bulk_batch(&selection.ids(), applications, action);

    let mut pruned: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !selection.contains(*id))
        .collect();
    pruned.sort_unstable();
    pruned.dedup();

    for application_id in pruned {
        let reason = match applications
            .iter()
            .find(|a| a.application_id == Some(application_id))
        {
            None => SkipReason::UnknownApplication,
            Some(app) if app.has_final_status() => SkipReason::FinalStatus,
            Some(_) => SkipReason::NotVisible,
        };
        warn!(application_id, ?reason, "Selected applicant dropped before bulk email");
        batch.results.push(RecipientResult {
            application_id,
            outcome: RecipientOutcome::Skipped { reason },
        });
    }

    (selection, batch)
}

fn resolve_recipient(
    application_id: i64,
    applications: &[Application],
) -> Result<BulkRecipient, SkipReason> {
    let app = applications
        .iter()
        .find(|a| a.application_id == Some(application_id))
        .ok_or(SkipReason::UnknownApplication)?;
    if app.has_final_status() {
        return Err(SkipReason::FinalStatus);
    }
    let user = app.user.as_ref().ok_or(SkipReason::MissingEmail)?;
    let email = user.resolvable_email().ok_or(SkipReason::MissingEmail)?;
    Ok(BulkRecipient {
        application_id,
        name: user.full_name(),
        email: email.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Sent,
    /// Nothing sendable was left after skipping; the backend was not called.
    NothingToSend,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub action: EmailAction,
    pub status: DispatchStatus,
    pub results: Vec<RecipientResult>,
    pub error: Option<String>,
}

impl DispatchReport {
    pub fn sent_ids(&self) -> Vec<i64> {
        self.results
            .iter()
            .filter(|r| r.outcome == RecipientOutcome::Sent)
            .map(|r| r.application_id)
            .collect()
    }
}

/// Sends a prepared batch through the backend and resolves every queued
/// recipient to `Sent` or `Failed`.
pub async fn dispatch_bulk(
    backend: &dyn JobBoardBackend,
    session: &Session,
    batch: BulkBatch,
) -> DispatchReport {
    let BulkBatch {
        action,
        request,
        mut results,
    } = batch;

    let Some(request) = request else {
        info!("No valid applicants left to email, skipping bulk {action}");
        return DispatchReport {
            action,
            status: DispatchStatus::NothingToSend,
            results,
            error: None,
        };
    };

    info!(
        "Sending bulk {action} emails to {} applicant(s)",
        request.applicants.len()
    );

    let (status, error, outcome) = match backend.send_bulk_email(&request, session).await {
        Ok(_) => (DispatchStatus::Sent, None, RecipientOutcome::Sent),
        Err(e) => {
            warn!("Bulk {action} email dispatch failed: {e}");
            let message = describe_failure(&e);
            (
                DispatchStatus::Failed,
                Some(message.clone()),
                RecipientOutcome::Failed { error: message },
            )
        }
    };

    for result in results.iter_mut() {
        if result.outcome == RecipientOutcome::Queued {
            result.outcome = outcome.clone();
        }
    }

    DispatchReport {
        action,
        status,
        results,
        error,
    }
}

fn describe_failure(error: &BackendError) -> String {
    match error {
        BackendError::Api { message, .. } if !message.is_empty() => message.clone(),
        other => other.to_string(),
    }
}
