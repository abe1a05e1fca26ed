use serde::Serialize;
use tracing::debug;

use crate::models::Cv;

/// Sector comparison form: embedded quotes stripped, lowercased, trimmed.
pub fn normalize_sector(raw: &str) -> String {
    raw.replace('"', "").to_lowercase().trim().to_string()
}

pub fn sectors_match(a: &str, b: &str) -> bool {
    normalize_sector(a) == normalize_sector(b)
}

/// Normalized sector of the user's first CV, or empty if there is none.
pub fn initial_sector(cvs: &[Cv]) -> String {
    cvs.first()
        .and_then(|cv| cv.sector.as_deref())
        .map(normalize_sector)
        .unwrap_or_default()
}

/// Why a particular sector (or none) is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorSource {
    SelectedCv,
    /// A CV was chosen but could not be resolved or has no sector. This opts
    /// out of sector filtering rather than falling back to the initial sector.
    SelectedCvWithoutSector,
    InitialSector,
    NoSector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSector {
    pub sector: Option<String>,
    pub source: SectorSource,
}

/// Resolves the sector to filter jobs by.
///
/// Precedence: selected CV's sector, then (only when no CV is selected) the
/// initial sector, then nothing. `selected_cv` is the raw id as chosen in
/// the filter; blank means no selection.
pub fn resolve_effective_sector(
    cvs: &[Cv],
    selected_cv: Option<&str>,
    initial_sector: &str,
) -> EffectiveSector {
    if let Some(raw_id) = selected_cv.map(str::trim).filter(|s| !s.is_empty()) {
        let sector = raw_id
            .parse::<i64>()
            .ok()
            .and_then(|id| cvs.iter().find(|cv| cv.cv_id == Some(id)))
            .and_then(Cv::normalized_sector);

        return match sector {
            Some(sector) => EffectiveSector {
                sector: Some(sector),
                source: SectorSource::SelectedCv,
            },
            None => {
                debug!(
                    selected_cv = raw_id,
                    "Selected CV not found or has no sector, no sector filter applied"
                );
                EffectiveSector {
                    sector: None,
                    source: SectorSource::SelectedCvWithoutSector,
                }
            }
        };
    }

    let initial = normalize_sector(initial_sector);
    if !initial.is_empty() {
        return EffectiveSector {
            sector: Some(initial),
            source: SectorSource::InitialSector,
        };
    }

    EffectiveSector {
        sector: None,
        source: SectorSource::NoSector,
    }
}
