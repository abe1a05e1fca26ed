use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::backend::ApplyRequest;
use crate::errors::AppError;
use crate::jobs::feed::{annotate, clear_filters, filter_jobs, FilteredJobs, JobCard, JobFilter};
use crate::jobs::gating::check_can_apply;
use crate::jobs::posting::{
    validate_deadline_update, validate_new_job, CreateJobRequest, UpdateDeadlineRequest,
};
use crate::jobs::sector::{initial_sector, EffectiveSector};
use crate::models::{Application, CurrentUser, Cv, Job};
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FeedResponse {
    pub initial_sector: String,
    pub effective_sector: EffectiveSector,
    pub cvs: Vec<Cv>,
    pub jobs: Vec<JobCard>,
}

/// GET /api/v1/jobs/feed
pub async fn handle_job_feed(
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<JobFilter>,
) -> Result<Json<FeedResponse>, AppError> {
    build_feed(&state, &session, |jobs, cvs, initial| {
        filter_jobs(jobs, cvs, &filter, initial)
    })
    .await
    .map(Json)
}

/// GET /api/v1/jobs/feed/clear
pub async fn handle_clear_feed(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FeedResponse>, AppError> {
    build_feed(&state, &session, clear_filters).await.map(Json)
}

/// Loads everything the feed needs in one round and runs `apply` over it.
async fn build_feed<F>(
    state: &AppState,
    session: &Session,
    apply: F,
) -> Result<FeedResponse, AppError>
where
    F: FnOnce(&[Job], &[Cv], &str) -> FilteredJobs,
{
    let (cvs, jobs, user) = tokio::try_join!(
        state.backend.user_cvs(session),
        state.backend.all_jobs(session),
        state.backend.current_user(session),
    )?;
    let applications = own_applications(state, session, &user).await?;

    let initial = initial_sector(&cvs);
    let FilteredJobs {
        effective_sector,
        jobs,
    } = apply(&jobs, &cvs, &initial);

    Ok(FeedResponse {
        jobs: annotate(jobs, &applications, &Local::now()),
        initial_sector: initial,
        effective_sector,
        cvs,
    })
}

#[derive(Deserialize)]
pub struct ApplyBody {
    pub cv_id: Option<i64>,
}

/// POST /api/v1/jobs/:job_id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
    Json(body): Json<ApplyBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let cv_id = body
        .cv_id
        .ok_or_else(|| AppError::Validation("Please select a CV to apply with.".to_string()))?;

    let (job, user) = tokio::try_join!(
        state.backend.job_details(job_id, &session),
        state.backend.current_user(&session),
    )?;
    let user_id = require_user_id(&user)?;
    let applications = state.backend.applications_by_user(user_id, &session).await?;

    check_can_apply(&job, &applications, &Local::now())
        .map_err(|block| AppError::ApplyBlocked(block.message().to_string()))?;

    let created = state
        .backend
        .apply(
            &ApplyRequest {
                cv_id,
                user_id,
                job_id,
            },
            &session,
        )
        .await?;
    info!(
        job_id,
        cv_id,
        "{} applied to job",
        user.display_name().unwrap_or("User")
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/applications/mine
pub async fn handle_my_applications(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Application>>, AppError> {
    let user = state.backend.current_user(&session).await?;
    Ok(Json(own_applications(&state, &session, &user).await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let job = validate_new_job(&req, Local::now().date_naive()).map_err(AppError::Validation)?;
    let created = state.backend.create_job(&job, &session).await?;
    info!(position = %job.position, category = %job.departmant, "Job posted");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/jobs/mine
pub async fn handle_company_jobs(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.backend.company_jobs(&session).await?))
}

/// PUT /api/v1/jobs/:job_id
pub async fn handle_update_deadline(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
    Json(req): Json<UpdateDeadlineRequest>,
) -> Result<Json<Value>, AppError> {
    let update =
        validate_deadline_update(&req, Local::now().date_naive()).map_err(AppError::Validation)?;
    let updated = state
        .backend
        .update_job_deadline(job_id, &update, &session)
        .await?;
    info!(job_id, deadline = %update.deadline, "Job deadline updated");
    Ok(Json(updated))
}

/// DELETE /api/v1/jobs/:job_id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.backend.delete_job(job_id, &session).await?;
    info!(job_id, "Job deleted");
    Ok(Json(deleted))
}

async fn own_applications(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
) -> Result<Vec<Application>, AppError> {
    let user_id = require_user_id(user)?;
    Ok(state.backend.applications_by_user(user_id, session).await?)
}

fn require_user_id(user: &CurrentUser) -> Result<i64, AppError> {
    user.user_id
        .ok_or_else(|| anyhow::anyhow!("Backend returned a user without a userId").into())
}
