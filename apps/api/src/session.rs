use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::errors::AppError;

/// Caller's backend credentials, taken from the incoming request and passed
/// explicitly into every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn from_authorization(value: &str) -> Option<Self> {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))?
            .trim();
        (!token.is_empty()).then(|| Session::new(token))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match header.and_then(Session::from_authorization) {
            Some(session) => Ok(session),
            None => {
                tracing::warn!("Bearer token missing, request denied");
                Err(AppError::Unauthorized)
            }
        }
    }
}
