//! In-memory backend used by unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ApplyRequest, BackendError, JobBoardBackend, JobDeadlineUpdate, NewJob};
use crate::analytics::dispatch::{BulkEmailRequest, SingleEmailRequest};
use crate::models::{Application, CurrentUser, Cv, CvRecord, Job};
use crate::session::Session;

#[derive(Default)]
pub struct FakeBackend {
    pub user: CurrentUser,
    pub jobs: Vec<Job>,
    pub company_jobs: Vec<Job>,
    pub applicants: Vec<Application>,
    pub cvs: Vec<Cv>,
    pub cv_records: Vec<CvRecord>,
    pub user_applications: Vec<Application>,
    pub fail_email: bool,
    pub fail_reads: bool,
    pub(crate) bulk: Mutex<Vec<BulkEmailRequest>>,
    pub(crate) single: Mutex<Vec<SingleEmailRequest>>,
    pub(crate) applies: Mutex<Vec<ApplyRequest>>,
    pub(crate) created: Mutex<Vec<NewJob>>,
    pub(crate) deadline_updates: Mutex<Vec<(i64, JobDeadlineUpdate)>>,
    pub(crate) deleted_jobs: Mutex<Vec<i64>>,
    pub(crate) deleted_cvs: Mutex<Vec<i64>>,
}

impl FakeBackend {
    pub fn bulk_requests(&self) -> Vec<BulkEmailRequest> {
        self.bulk.lock().unwrap().clone()
    }

    pub fn single_requests(&self) -> Vec<SingleEmailRequest> {
        self.single.lock().unwrap().clone()
    }

    pub fn apply_requests(&self) -> Vec<ApplyRequest> {
        self.applies.lock().unwrap().clone()
    }

    pub fn created_jobs(&self) -> Vec<NewJob> {
        self.created.lock().unwrap().clone()
    }

    pub fn deadline_updates(&self) -> Vec<(i64, JobDeadlineUpdate)> {
        self.deadline_updates.lock().unwrap().clone()
    }

    pub fn deleted_jobs(&self) -> Vec<i64> {
        self.deleted_jobs.lock().unwrap().clone()
    }

    pub fn deleted_cvs(&self) -> Vec<i64> {
        self.deleted_cvs.lock().unwrap().clone()
    }

    fn own_job(&self, job_id: i64) -> Result<(), BackendError> {
        if self.company_jobs.iter().any(|j| j.job_id == Some(job_id)) {
            Ok(())
        } else {
            Err(BackendError::NotFound(format!("Job {job_id} not found")))
        }
    }

    fn read_guard(&self) -> Result<(), BackendError> {
        if self.fail_reads {
            return Err(BackendError::Api {
                status: 503,
                message: "backend down".to_string(),
            });
        }
        Ok(())
    }

    fn email_guard(&self) -> Result<(), BackendError> {
        if self.fail_email {
            return Err(BackendError::Api {
                status: 500,
                message: "SMTP relay unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JobBoardBackend for FakeBackend {
    async fn current_user(&self, _session: &Session) -> Result<CurrentUser, BackendError> {
        self.read_guard()?;
        Ok(self.user.clone())
    }

    async fn job_details(&self, job_id: i64, _session: &Session) -> Result<Job, BackendError> {
        self.read_guard()?;
        self.jobs
            .iter()
            .find(|j| j.job_id == Some(job_id))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("Job {job_id} not found")))
    }

    async fn job_applicants(
        &self,
        job_id: i64,
        _session: &Session,
    ) -> Result<Vec<Application>, BackendError> {
        self.read_guard()?;
        Ok(self
            .applicants
            .iter()
            .filter(|a| a.job_id.is_none() || a.job_id == Some(job_id))
            .cloned()
            .collect())
    }

    async fn all_jobs(&self, _session: &Session) -> Result<Vec<Job>, BackendError> {
        self.read_guard()?;
        Ok(self.jobs.clone())
    }

    async fn company_jobs(&self, _session: &Session) -> Result<Vec<Job>, BackendError> {
        self.read_guard()?;
        Ok(self.company_jobs.clone())
    }

    async fn user_cvs(&self, _session: &Session) -> Result<Vec<Cv>, BackendError> {
        self.read_guard()?;
        Ok(self.cvs.clone())
    }

    async fn cv_details(&self, cv_id: i64, _session: &Session) -> Result<CvRecord, BackendError> {
        self.read_guard()?;
        self.cv_records
            .iter()
            .find(|cv| cv.cv_id == Some(cv_id))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("CV {cv_id} not found")))
    }

    async fn applications_by_user(
        &self,
        _user_id: i64,
        _session: &Session,
    ) -> Result<Vec<Application>, BackendError> {
        self.read_guard()?;
        Ok(self.user_applications.clone())
    }

    async fn apply(
        &self,
        request: &ApplyRequest,
        _session: &Session,
    ) -> Result<Value, BackendError> {
        self.applies.lock().unwrap().push(request.clone());
        Ok(json!({ "success": true }))
    }

    async fn create_job(&self, job: &NewJob, _session: &Session) -> Result<Value, BackendError> {
        self.created.lock().unwrap().push(job.clone());
        Ok(json!({ "message": "Job created" }))
    }

    async fn update_job_deadline(
        &self,
        job_id: i64,
        update: &JobDeadlineUpdate,
        _session: &Session,
    ) -> Result<Value, BackendError> {
        self.own_job(job_id)?;
        self.deadline_updates
            .lock()
            .unwrap()
            .push((job_id, update.clone()));
        Ok(json!({ "message": "Job updated" }))
    }

    async fn delete_job(&self, job_id: i64, _session: &Session) -> Result<Value, BackendError> {
        self.own_job(job_id)?;
        self.deleted_jobs.lock().unwrap().push(job_id);
        Ok(json!({ "message": "Job deleted" }))
    }

    async fn delete_cv(&self, cv_id: i64, _session: &Session) -> Result<Value, BackendError> {
        if !self.cvs.iter().any(|cv| cv.cv_id == Some(cv_id)) {
            return Err(BackendError::NotFound(format!("CV {cv_id} not found")));
        }
        self.deleted_cvs.lock().unwrap().push(cv_id);
        Ok(json!({ "message": "CV deleted" }))
    }

    async fn send_single_email(
        &self,
        request: &SingleEmailRequest,
        _session: &Session,
    ) -> Result<Value, BackendError> {
        self.email_guard()?;
        self.single.lock().unwrap().push(request.clone());
        Ok(json!({ "success": true }))
    }

    async fn send_bulk_email(
        &self,
        request: &BulkEmailRequest,
        _session: &Session,
    ) -> Result<Value, BackendError> {
        self.email_guard()?;
        self.bulk.lock().unwrap().push(request.clone());
        Ok(json!({ "success": true }))
    }
}
