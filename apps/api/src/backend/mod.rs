//! Backend client, the single point of contact with the job-board REST API.
//!
//! Handlers depend on the `JobBoardBackend` trait, carried in `AppState` as
//! `Arc<dyn JobBoardBackend>`. `HttpBackend` is the production implementation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::analytics::dispatch::{BulkEmailRequest, SingleEmailRequest};
use crate::models::{Application, CurrentUser, Cv, CvRecord, Job};
use crate::session::Session;

#[cfg(test)]
pub mod fake;
pub mod http;

pub use http::HttpBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session rejected by backend")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

/// Body of `POST /application`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub cv_id: i64,
    pub user_id: i64,
    pub job_id: i64,
}

/// Body of `POST /job/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub departmant: String,
    pub position: String,
    pub description: String,
    pub deadline: String,
}

/// Body of `PUT /job/{id}`; only the deadline can be changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDeadlineUpdate {
    pub deadline: String,
}

#[async_trait]
pub trait JobBoardBackend: Send + Sync {
    async fn current_user(&self, session: &Session) -> Result<CurrentUser, BackendError>;

    async fn job_details(&self, job_id: i64, session: &Session) -> Result<Job, BackendError>;

    async fn job_applicants(
        &self,
        job_id: i64,
        session: &Session,
    ) -> Result<Vec<Application>, BackendError>;

    async fn all_jobs(&self, session: &Session) -> Result<Vec<Job>, BackendError>;

    /// Jobs posted by the signed-in company.
    async fn company_jobs(&self, session: &Session) -> Result<Vec<Job>, BackendError>;

    async fn user_cvs(&self, session: &Session) -> Result<Vec<Cv>, BackendError>;

    async fn cv_details(&self, cv_id: i64, session: &Session) -> Result<CvRecord, BackendError>;

    /// The user's own applications. "No applications found" is an empty list,
    /// not an error.
    async fn applications_by_user(
        &self,
        user_id: i64,
        session: &Session,
    ) -> Result<Vec<Application>, BackendError>;

    async fn apply(&self, request: &ApplyRequest, session: &Session)
        -> Result<Value, BackendError>;

    async fn create_job(&self, job: &NewJob, session: &Session) -> Result<Value, BackendError>;

    async fn update_job_deadline(
        &self,
        job_id: i64,
        update: &JobDeadlineUpdate,
        session: &Session,
    ) -> Result<Value, BackendError>;

    async fn delete_job(&self, job_id: i64, session: &Session) -> Result<Value, BackendError>;

    async fn delete_cv(&self, cv_id: i64, session: &Session) -> Result<Value, BackendError>;

    async fn send_single_email(
        &self,
        request: &SingleEmailRequest,
        session: &Session,
    ) -> Result<Value, BackendError>;

    async fn send_bulk_email(
        &self,
        request: &BulkEmailRequest,
        session: &Session,
    ) -> Result<Value, BackendError>;
}
