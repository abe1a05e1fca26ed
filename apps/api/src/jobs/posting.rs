use chrono::NaiveDate;
use serde::Deserialize;

use crate::backend::{JobDeadlineUpdate, NewJob};
use crate::jobs::sector::sectors_match;
use crate::models::job::parse_calendar_date;

/// Sectors a company can post under.
pub const JOB_CATEGORIES: &[&str] = &[
    "HR",
    "Designer",
    "Information-Technology",
    "Teacher",
    "Advocate",
    "Business-Development",
    "Healthcare",
    "Fitness",
    "Agriculture",
    "BPO",
    "Sales",
    "Consultant",
    "Digital-Media",
    "Automobile",
    "Chef",
    "Finance",
    "Apparel",
    "Engineering",
    "Accountant",
    "Construction",
    "Public-Relations",
    "Banking",
    "Arts",
    "Aviation",
];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub departmant: String,
    pub position: String,
    pub description: String,
    pub deadline: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDeadlineRequest {
    pub deadline: String,
}

/// Validates a posting against the category list and today's date, returning
/// the backend body with the category in its canonical spelling.
pub fn validate_new_job(request: &CreateJobRequest, today: NaiveDate) -> Result<NewJob, String> {
    let category = JOB_CATEGORIES
        .iter()
        .find(|c| sectors_match(c, &request.departmant))
        .ok_or_else(|| format!("Unknown job category '{}'", request.departmant.trim()))?;

    let position = request.position.trim();
    if position.is_empty() {
        return Err("position cannot be empty".to_string());
    }
    let description = request.description.trim();
    if description.is_empty() {
        return Err("description cannot be empty".to_string());
    }

    Ok(NewJob {
        departmant: category.to_string(),
        position: position.to_string(),
        description: description.to_string(),
        deadline: validate_deadline(&request.deadline, today)?,
    })
}

/// Validates a new deadline for an existing posting. Same rule as posting:
/// today is fine, anything earlier is not.
pub fn validate_deadline_update(
    request: &UpdateDeadlineRequest,
    today: NaiveDate,
) -> Result<JobDeadlineUpdate, String> {
    Ok(JobDeadlineUpdate {
        deadline: validate_deadline(&request.deadline, today)?,
    })
}

/// Parses `raw` as a calendar date not before `today`, returned as `YYYY-MM-DD`.
fn validate_deadline(raw: &str, today: NaiveDate) -> Result<String, String> {
    let deadline =
        parse_calendar_date(raw).ok_or_else(|| format!("deadline '{raw}' is not a valid date"))?;
    if deadline < today {
        return Err(format!("deadline {deadline} is in the past"));
    }
    Ok(deadline.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn request(dept: &str, deadline: &str) -> CreateJobRequest {
        CreateJobRequest {
            departmant: dept.to_string(),
            position: " Staff Nurse ".to_string(),
            description: "Night shifts".to_string(),
            deadline: deadline.to_string(),
        }
    }

    #[test]
    fn test_valid_posting_is_canonicalized() {
        let job = validate_new_job(&request("healthcare", "2026-04-01"), today()).unwrap();
        assert_eq!(job.departmant, "Healthcare");
        assert_eq!(job.position, "Staff Nurse");
        assert_eq!(job.deadline, "2026-04-01");
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = validate_new_job(&request("Astrology", "2026-05-01"), today()).unwrap_err();
        assert!(err.contains("Astrology"));
    }

    #[test]
    fn test_past_deadline_rejected() {
        assert!(validate_new_job(&request("HR", "2026-03-31"), today()).is_err());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut req = request("HR", "2026-05-01");
        req.description = "  ".to_string();
        assert!(validate_new_job(&req, today()).is_err());
    }

    #[test]
    fn test_deadline_update_follows_posting_rule() {
        let update = |d: &str| {
            validate_deadline_update(
                &UpdateDeadlineRequest {
                    deadline: d.to_string(),
                },
                today(),
            )
        };
        assert_eq!(update("2026-04-01").unwrap().deadline, "2026-04-01");
        assert_eq!(update(" 2026-06-15 ").unwrap().deadline, "2026-06-15");
        assert!(update("2026-03-31").unwrap_err().contains("in the past"));
        assert!(update("next week").unwrap_err().contains("not a valid date"));
    }
}
