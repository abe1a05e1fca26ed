use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jobs::sector::normalize_sector;

const NOT_SPECIFIED: &str = "Not specified";

/// A CV as listed on the owner's profile (`GET /cv/profile`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cv {
    pub cv_id: Option<i64>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub sector: Option<String>,
}

impl Cv {
    /// Normalized sector, or `None` when absent or blank after normalization.
    pub fn normalized_sector(&self) -> Option<String> {
        self.sector
            .as_deref()
            .map(normalize_sector)
            .filter(|s| !s.is_empty())
    }
}

/// Raw CV detail record. Resume sections arrive either as plain text,
/// as JSON-encoded strings, or as already-structured JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvRecord {
    pub cv_id: Option<i64>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub sector: Option<String>,
    pub phone: Option<Value>,
    pub skills: Option<Value>,
    pub experience: Option<Value>,
    pub education: Option<Value>,
    pub certifications: Option<Value>,
}

/// A resume section after decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CvField {
    /// Decoded JSON array or object.
    Structured(Value),
    /// Opaque text, including strings that looked like JSON but did not decode.
    Text(String),
    Empty,
}

impl CvField {
    /// Never fails: malformed embedded JSON falls back to the raw string.
    pub fn parse(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => CvField::Empty,
            Some(Value::String(s)) if s.trim().is_empty() => CvField::Empty,
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ (Value::Array(_) | Value::Object(_))) => CvField::Structured(parsed),
                _ => CvField::Text(s.clone()),
            },
            Some(structured @ (Value::Array(_) | Value::Object(_))) => {
                CvField::Structured(structured.clone())
            }
            Some(other) => CvField::Text(other.to_string()),
        }
    }

    /// Flat display text: arrays are comma-joined, objects become `key: value` pairs.
    pub fn display(&self) -> String {
        match self {
            CvField::Empty => NOT_SPECIFIED.to_string(),
            CvField::Text(s) => s.clone(),
            CvField::Structured(Value::Array(items)) if items.is_empty() => {
                NOT_SPECIFIED.to_string()
            }
            CvField::Structured(Value::Array(items)) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            CvField::Structured(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| format!("{k}: {}", scalar_text(v)))
                .collect::<Vec<_>>()
                .join("; "),
            CvField::Structured(other) => scalar_text(other),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decoded CV returned by `GET /api/v1/cvs/:cv_id`.
#[derive(Debug, Clone, Serialize)]
pub struct CvDetails {
    pub cv_id: Option<i64>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub sector: Option<String>,
    pub phone: CvField,
    pub skills: CvField,
    pub experience: CvField,
    pub education: CvField,
    pub certifications: CvField,
}

impl From<CvRecord> for CvDetails {
    fn from(record: CvRecord) -> Self {
        CvDetails {
            phone: CvField::parse(record.phone.as_ref()),
            skills: CvField::parse(record.skills.as_ref()),
            experience: CvField::parse(record.experience.as_ref()),
            education: CvField::parse(record.education.as_ref()),
            certifications: CvField::parse(record.certifications.as_ref()),
            cv_id: record.cv_id,
            file_name: record.file_name,
            file_path: record.file_path,
            sector: record.sector,
        }
    }
}
