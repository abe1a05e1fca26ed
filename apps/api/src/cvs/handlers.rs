use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::models::CvDetails;
use crate::session::Session;
use crate::state::AppState;

/// Flat display text for each resume section.
#[derive(Debug, Serialize)]
pub struct CvSummary {
    pub phone: String,
    pub skills: String,
    pub experience: String,
    pub education: String,
    pub certifications: String,
}

impl From<&CvDetails> for CvSummary {
    fn from(details: &CvDetails) -> Self {
        CvSummary {
            phone: details.phone.display(),
            skills: details.skills.display(),
            experience: details.experience.display(),
            education: details.education.display(),
            certifications: details.certifications.display(),
        }
    }
}

#[derive(Serialize)]
pub struct CvDetailsResponse {
    #[serde(flatten)]
    pub details: CvDetails,
    pub summary: CvSummary,
}

/// GET /api/v1/cvs/:cv_id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    session: Session,
    Path(cv_id): Path<i64>,
) -> Result<Json<CvDetailsResponse>, AppError> {
    let details = CvDetails::from(state.backend.cv_details(cv_id, &session).await?);
    Ok(Json(CvDetailsResponse {
        summary: CvSummary::from(&details),
        details,
    }))
}

/// DELETE /api/v1/cvs/:cv_id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    session: Session,
    Path(cv_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.backend.delete_cv(cv_id, &session).await?;
    info!(cv_id, "CV deleted");
    Ok(Json(deleted))
}
