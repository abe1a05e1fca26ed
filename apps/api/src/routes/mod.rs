pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::cvs::handlers as cvs;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Applicant analytics (company side)
        .route(
            "/api/v1/jobs/:job_id/applicants",
            get(analytics::handle_get_applicants),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants/selection",
            post(analytics::handle_update_selection),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants/send-bulk",
            post(analytics::handle_send_bulk),
        )
        .route(
            "/api/v1/applications/:application_id/send",
            post(analytics::handle_send_single),
        )
        // Job feed (applicant side)
        .route("/api/v1/jobs/feed", get(jobs::handle_job_feed))
        .route("/api/v1/jobs/feed/clear", get(jobs::handle_clear_feed))
        .route("/api/v1/jobs/:job_id/apply", post(jobs::handle_apply))
        .route("/api/v1/applications/mine", get(jobs::handle_my_applications))
        // Company job management
        .route("/api/v1/jobs", post(jobs::handle_create_job))
        .route("/api/v1/jobs/mine", get(jobs::handle_company_jobs))
        .route(
            "/api/v1/jobs/:job_id",
            put(jobs::handle_update_deadline).delete(jobs::handle_delete_job),
        )
        .route(
            "/api/v1/cvs/:cv_id",
            get(cvs::handle_get_cv).delete(cvs::handle_delete_cv),
        )
        .with_state(state)
}
