use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApplyRequest, BackendError, JobBoardBackend, JobDeadlineUpdate, NewJob};
use crate::analytics::dispatch::{BulkEmailRequest, SingleEmailRequest};
use crate::models::{Application, CurrentUser, Cv, CvRecord, Job};
use crate::session::Session;

/// Message the backend sends with its 404 when a user has never applied.
const NO_APPLICATIONS_MESSAGE: &str = "No applications found for this user";

const MAX_BACKOFF_EXPONENT: u32 = 6;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// reqwest-backed client for the job-board REST API.
/// Reads retry on 429 and 5xx with exponential backoff; writes are sent once.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(session.token())
    }

    async fn get_json(&self, path: &str, session: &Session) -> Result<Value, BackendError> {
        let mut last_error: Option<BackendError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "GET {path} attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .authorized(self.client.get(self.url(path)), session)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(BackendError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Backend returned {status} for GET {path}: {body}");
                last_error = Some(BackendError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
                continue;
            }

            return read_json(response, path).await;
        }

        Err(last_error.unwrap_or(BackendError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: format!("GET {path} exhausted {} retries", self.max_retries),
        }))
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        session: &Session,
    ) -> Result<Value, BackendError> {
        let builder = self.client.post(self.url(path)).json(body);
        self.send_once(builder, path, session).await
    }

    async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        session: &Session,
    ) -> Result<Value, BackendError> {
        let builder = self.client.put(self.url(path)).json(body);
        self.send_once(builder, path, session).await
    }

    async fn delete(&self, path: &str, session: &Session) -> Result<Value, BackendError> {
        let builder = self.client.delete(self.url(path));
        self.send_once(builder, path, session).await
    }

    async fn send_once(
        &self,
        builder: RequestBuilder,
        path: &str,
        session: &Session,
    ) -> Result<Value, BackendError> {
        let response = self.authorized(builder, session).send().await?;
        read_json(response, path).await
    }
}

/// Wait before retry number `retry` (1-based): 1s, 2s, 4s, ... capped at 64s.
fn backoff_delay(retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(1000 << exponent)
}

async fn read_json(response: Response, path: &str) -> Result<Value, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_message(&body);
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            _ => BackendError::Api {
                status: status.as_u16(),
                message,
            },
        });
    }

    debug!("Backend {path} -> {status} ({} bytes)", body.len());

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(format!("{path}: {e}")))
}

/// Pulls `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string())
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(format!("{what}: {e}")))
}

/// Unwraps `{ "<key>": ... }` envelopes.
fn envelope(mut value: Value, key: &str) -> Result<Value, BackendError> {
    match value.get_mut(key) {
        Some(inner) => Ok(inner.take()),
        None => Err(BackendError::Decode(format!("missing '{key}' in response"))),
    }
}

/// Lists may come back as `null` when empty.
fn list_or_empty(value: Value) -> Value {
    if value.is_null() {
        Value::Array(vec![])
    } else {
        value
    }
}

fn is_no_applications(error: &BackendError) -> bool {
    matches!(error, BackendError::NotFound(message) if message == NO_APPLICATIONS_MESSAGE)
}

#[async_trait]
impl JobBoardBackend for HttpBackend {
    async fn current_user(&self, session: &Session) -> Result<CurrentUser, BackendError> {
        let value = self.get_json("/auth/me", session).await?;
        decode(value, "current user")
    }

    async fn job_details(&self, job_id: i64, session: &Session) -> Result<Job, BackendError> {
        let value = self.get_json(&format!("/job/{job_id}"), session).await?;
        decode(envelope(value, "job")?, "job")
    }

    async fn job_applicants(
        &self,
        job_id: i64,
        session: &Session,
    ) -> Result<Vec<Application>, BackendError> {
        let value = self
            .get_json(&format!("/application/job/{job_id}/applicants"), session)
            .await?;
        decode(list_or_empty(value), "applicants")
    }

    async fn all_jobs(&self, session: &Session) -> Result<Vec<Job>, BackendError> {
        let value = self.get_json("/job/all", session).await?;
        decode(list_or_empty(envelope(value, "allJobs")?), "jobs")
    }

    async fn company_jobs(&self, session: &Session) -> Result<Vec<Job>, BackendError> {
        let value = self.get_json("/job", session).await?;
        decode(list_or_empty(envelope(value, "jobs")?), "company jobs")
    }

    async fn user_cvs(&self, session: &Session) -> Result<Vec<Cv>, BackendError> {
        let value = self.get_json("/cv/profile", session).await?;
        decode(list_or_empty(value), "cvs")
    }

    async fn cv_details(&self, cv_id: i64, session: &Session) -> Result<CvRecord, BackendError> {
        let value = self
            .get_json(&format!("/cv/{cv_id}/details"), session)
            .await?;
        if value.is_null() {
            return Err(BackendError::NotFound(format!("CV {cv_id} has no details")));
        }
        decode(value, "cv details")
    }

    async fn applications_by_user(
        &self,
        user_id: i64,
        session: &Session,
    ) -> Result<Vec<Application>, BackendError> {
        match self
            .get_json(&format!("/application/job/user/{user_id}"), session)
            .await
        {
            Ok(value) => decode(list_or_empty(value), "user applications"),
            Err(e) if is_no_applications(&e) => {
                debug!(user_id, "Backend reports no applications, returning empty list");
                Ok(vec![])
            }
            Err(e) => Err(e),
        }
    }

    async fn apply(
        &self,
        request: &ApplyRequest,
        session: &Session,
    ) -> Result<Value, BackendError> {
        self.post_json("/application", request, session).await
    }

    async fn create_job(&self, job: &NewJob, session: &Session) -> Result<Value, BackendError> {
        self.post_json("/job/create", job, session).await
    }

    async fn update_job_deadline(
        &self,
        job_id: i64,
        update: &JobDeadlineUpdate,
        session: &Session,
    ) -> Result<Value, BackendError> {
        self.put_json(&format!("/job/{job_id}"), update, session)
            .await
    }

    async fn delete_job(&self, job_id: i64, session: &Session) -> Result<Value, BackendError> {
        self.delete(&format!("/job/{job_id}"), session).await
    }

    async fn delete_cv(&self, cv_id: i64, session: &Session) -> Result<Value, BackendError> {
        self.delete(&format!("/cv/{cv_id}"), session).await
    }

    async fn send_single_email(
        &self,
        request: &SingleEmailRequest,
        session: &Session,
    ) -> Result<Value, BackendError> {
        self.post_json("/application/send", request, session).await
    }

    async fn send_bulk_email(
        &self,
        request: &BulkEmailRequest,
        session: &Session,
    ) -> Result<Value, BackendError> {
        self.post_json("/application/send-bulk", request, session)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"Job not found"}"#), "Job not found");
        assert_eq!(error_message(" gateway timeout "), "gateway timeout");
    }

    #[test]
    fn test_envelope_unwraps_key() {
        let value = json!({ "allJobs": [{ "jobId": 1 }] });
        assert_eq!(envelope(value, "allJobs").unwrap(), json!([{ "jobId": 1 }]));
        assert!(matches!(
            envelope(json!({}), "job"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn test_null_list_is_empty() {
        let jobs: Vec<Job> = decode(list_or_empty(Value::Null), "jobs").unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_only_the_no_applications_404_is_normalized() {
        assert!(is_no_applications(&BackendError::NotFound(
            NO_APPLICATIONS_MESSAGE.to_string()
        )));
        assert!(!is_no_applications(&BackendError::NotFound(
            "User not found".to_string()
        )));
        assert!(!is_no_applications(&BackendError::Api {
            status: 500,
            message: NO_APPLICATIONS_MESSAGE.to_string()
        }));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(7), Duration::from_secs(64));
        assert_eq!(backoff_delay(200), Duration::from_secs(64));
    }

    #[test]
    fn test_base_url_join() {
        let backend = HttpBackend::new("http://localhost:5000", Duration::from_secs(5), 3).unwrap();
        assert_eq!(backend.url("/job/all"), "http://localhost:5000/job/all");
    }
}
