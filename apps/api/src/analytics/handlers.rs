use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::dispatch::{
    dispatch_bulk, prepare_selection_batch, DispatchReport, DispatchStatus, EmailAction,
    SingleEmailRequest,
};
use crate::analytics::filter::{format_score_percent, ApplicantFilter, FilterParams};
use crate::analytics::histogram::{compute_score_histogram, ScoreHistogram};
use crate::analytics::selection::SelectionSet;
use crate::analytics::view::ApplicantView;
use crate::errors::AppError;
use crate::models::{Application, Job};
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApplicantRow {
    #[serde(flatten)]
    pub application: Application,
    pub score_display: String,
    pub selectable: bool,
}

#[derive(Serialize)]
pub struct ApplicantsResponse {
    pub job: Job,
    pub filter: ApplicantFilter,
    pub applicants: Vec<ApplicantRow>,
    pub eligible_ids: Vec<i64>,
    /// Computed over every application for the job, not just the visible ones.
    pub histogram: ScoreHistogram,
}

/// GET /api/v1/jobs/:job_id/applicants
pub async fn handle_get_applicants(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ApplicantsResponse>, AppError> {
    let (job, applications) = tokio::try_join!(
        state.backend.job_details(job_id, &session),
        state.backend.job_applicants(job_id, &session),
    )?;

    let histogram = compute_score_histogram(&applications);
    let view = ApplicantView::build(&applications, ApplicantFilter::from_params(&params));

    let applicants = view
        .applicants
        .iter()
        .map(|app| ApplicantRow {
            score_display: format_score_percent(app.similarity_score),
            selectable: app.application_id.map_or(false, |id| view.is_eligible(id)),
            application: app.clone(),
        })
        .collect();

    Ok(Json(ApplicantsResponse {
        job,
        filter: view.filter,
        applicants,
        eligible_ids: view.eligible_ids,
        histogram,
    }))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOp {
    Toggle,
    SelectAll,
    Clear,
    /// Only prune the held selection against the current view.
    Sync,
}

#[derive(Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub selected: Vec<i64>,
    pub op: SelectionOp,
    pub application_id: Option<i64>,
    #[serde(flatten)]
    pub filter: FilterParams,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    pub selected: SelectionSet,
    pub changed: bool,
    pub is_all_eligible_selected: bool,
    pub eligible_ids: Vec<i64>,
}

/// POST /api/v1/jobs/:job_id/applicants/selection
pub async fn handle_update_selection(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, AppError> {
    let applications = state.backend.job_applicants(job_id, &session).await?;
    let view = ApplicantView::build(&applications, ApplicantFilter::from_params(&req.filter));
    let mut selection = SelectionSet::from_ids(req.selected.iter().copied(), &view);

    let changed = match req.op {
        SelectionOp::Toggle => {
            let application_id = req.application_id.ok_or_else(|| {
                AppError::Validation("application_id is required to toggle".to_string())
            })?;
            selection.toggle(application_id, &view)
        }
        SelectionOp::SelectAll => {
            let before = selection.clone();
            selection.select_all_visible(&view);
            before != selection
        }
        SelectionOp::Clear => {
            let was_empty = selection.is_empty();
            selection.clear_all();
            !was_empty
        }
        SelectionOp::Sync => false,
    };

    Ok(Json(SelectionResponse {
        is_all_eligible_selected: selection.is_all_eligible_selected(&view),
        selected: selection,
        changed,
        eligible_ids: view.eligible_ids,
    }))
}

#[derive(Deserialize)]
pub struct BulkSendRequest {
    pub selected: Vec<i64>,
    #[serde(rename = "type")]
    pub action: String,
    #[serde(flatten)]
    pub filter: FilterParams,
}

#[derive(Serialize)]
pub struct BulkSendResponse {
    pub report: DispatchReport,
    /// Selection to hold after the send: cleared on success, kept for a retry otherwise.
    pub selected: SelectionSet,
}

/// POST /api/v1/jobs/:job_id/applicants/send-bulk
pub async fn handle_send_bulk(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
    Json(req): Json<BulkSendRequest>,
) -> Result<(StatusCode, Json<BulkSendResponse>), AppError> {
    let action: EmailAction = req.action.parse().map_err(AppError::Validation)?;
    if req.selected.is_empty() {
        return Err(AppError::Validation(
            "No applicants selected for bulk email".to_string(),
        ));
    }

    let applications = state.backend.job_applicants(job_id, &session).await?;
    let view = ApplicantView::build(&applications, ApplicantFilter::from_params(&req.filter));
    let (mut selection, batch) =
        prepare_selection_batch(&req.selected, &view, &applications, action);

    let report = dispatch_bulk(state.backend.as_ref(), &session, batch).await;

    let status = match report.status {
        DispatchStatus::Sent => {
            info!(job_id, sent = report.sent_ids().len(), "Bulk {action} emails sent");
            selection.clear_all();
            StatusCode::OK
        }
        DispatchStatus::NothingToSend => StatusCode::OK,
        DispatchStatus::Failed => StatusCode::BAD_GATEWAY,
    };

    Ok((status, Json(BulkSendResponse { report, selected: selection })))
}

#[derive(Deserialize)]
pub struct SingleSendRequest {
    pub job_id: i64,
    #[serde(rename = "type")]
    pub action: String,
    /// Bulk selection held by the client, returned reconciled and without
    /// this application once its status is final.
    #[serde(default)]
    pub selected: Vec<i64>,
    #[serde(flatten)]
    pub filter: FilterParams,
}

#[derive(Serialize)]
pub struct SingleSendResponse {
    pub application_id: i64,
    #[serde(rename = "type")]
    pub action: EmailAction,
    pub status: &'static str,
    pub selected: SelectionSet,
}

/// POST /api/v1/applications/:application_id/send
pub async fn handle_send_single(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<i64>,
    Json(req): Json<SingleSendRequest>,
) -> Result<Json<SingleSendResponse>, AppError> {
    let action: EmailAction = req.action.parse().map_err(AppError::Validation)?;

    let applications = state.backend.job_applicants(req.job_id, &session).await?;
    let application = applications
        .iter()
        .find(|a| a.application_id == Some(application_id))
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Application {application_id} not found for job {}",
                req.job_id
            ))
        })?;

    if application.has_final_status() {
        let name = application
            .user
            .as_ref()
            .map(|u| u.full_name())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "This applicant".to_string());
        warn!(application_id, "Refusing {action} email, status is final");
        return Err(AppError::Conflict(format!(
            "{name} has already been {}.",
            application.status.as_str()
        )));
    }

    state
        .backend
        .send_single_email(
            &SingleEmailRequest {
                application_id,
                action,
            },
            &session,
        )
        .await?;
    info!(application_id, "Sent {action} email");

    let view = ApplicantView::build(&applications, ApplicantFilter::from_params(&req.filter));
    let mut selected = SelectionSet::from_ids(req.selected.iter().copied(), &view);
    selected.apply_status_change(application_id, action.resulting_status());

    Ok(Json(SingleSendResponse {
        application_id,
        action,
        status: "sent",
        selected,
    }))
}
