//! Applicant filtering and ordering for the job-detail view.
//!
//! Filtering and sorting are independent: the filter decides membership,
//! the sort decides order. Both produce new collections and never touch
//! the input slice.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::Application;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Ascending application id.
    #[default]
    Default,
    /// Highest score first, unscored last.
    High,
    /// Lowest score first, unscored first.
    Low,
}

impl FromStr for SortOption {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `Default`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "high" => SortOption::High,
            "low" => SortOption::Low,
            _ => SortOption::Default,
        })
    }
}

/// Raw filter parameters as typed by the user. Shared by query strings and
/// request bodies so every endpoint interprets them the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default, deserialize_with = "lenient_text")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub min_score: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub max_score: Option<String>,
}

/// JSON bodies may carry bounds as numbers; query strings always carry text.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parsed filter: score bounds are decimals in [0,1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ApplicantFilter {
    pub sort: SortOption,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl ApplicantFilter {
    pub fn from_params(params: &FilterParams) -> Self {
        ApplicantFilter {
            sort: params
                .sort
                .as_deref()
                .map(|s| s.parse().unwrap_or_default())
                .unwrap_or_default(),
            min_score: params.min_score.as_deref().and_then(parse_percentage),
            max_score: params.max_score.as_deref().and_then(parse_percentage),
        }
    }

    pub fn has_bounds(&self) -> bool {
        self.min_score.is_some() || self.max_score.is_some()
    }

    /// Membership test for one application.
    pub fn accepts(&self, application: &Application) -> bool {
        if application.user.is_none() {
            return false;
        }
        match application.similarity_score {
            // any bound forces numeric-only results
            None => !self.has_bounds(),
            Some(score) => {
                self.min_score.map_or(true, |min| score >= min)
                    && self.max_score.map_or(true, |max| score <= max)
            }
        }
    }
}

/// Parses a user-entered percentage into a decimal bound.
///
/// The leading number of the trimmed text is used, so `"50%"` reads as 50.
/// Valid iff that number is finite and in [0, 100]. Anything else (blank,
/// no leading number, out of range) means "no bound".
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let number = leading_number(raw.trim());
    match number.parse::<f64>() {
        Ok(n) if n.is_finite() && (0.0..=100.0).contains(&n) => Some(n / 100.0),
        _ => {
            if !raw.trim().is_empty() {
                debug!("Ignoring invalid percentage bound {raw:?}");
            }
            None
        }
    }
}

/// Longest prefix of `s` shaped like a decimal number: optional sign,
/// digits with an optional fraction, then an optional exponent. Empty when
/// there is no digit before the first other character.
fn leading_number(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

/// Returns the applications passing `filter`, ordered by `filter.sort`.
///
/// Applications without a user record are malformed and dropped.
pub fn filter_and_sort(applications: &[Application], filter: &ApplicantFilter) -> Vec<Application> {
    let mut visible: Vec<Application> = applications
        .iter()
        .filter(|app| {
            if app.user.is_none() {
                warn!(
                    application_id = ?app.application_id,
                    "Dropping application without an applicant user record"
                );
            }
            filter.accepts(app)
        })
        .cloned()
        .collect();

    // sort_by is stable: ties keep backend order
    visible.sort_by(|a, b| compare(a, b, filter.sort));
    visible
}

fn compare(a: &Application, b: &Application, sort: SortOption) -> Ordering {
    match sort {
        SortOption::High => sort_key(b).total_cmp(&sort_key(a)),
        SortOption::Low => sort_key(a).total_cmp(&sort_key(b)),
        SortOption::Default => a
            .application_id
            .unwrap_or(0)
            .cmp(&b.application_id.unwrap_or(0)),
    }
}

/// Missing scores rank as negative infinity.
fn sort_key(application: &Application) -> f64 {
    application.similarity_score.unwrap_or(f64::NEG_INFINITY)
}

/// Formats a decimal score for display: `"85%"`, or `"-"` outside [0,1].
pub fn format_score_percent(score: Option<f64>) -> String {
    match score {
        Some(s) if (0.0..=1.0).contains(&s) => format!("{}%", (s * 100.0).round() as u32),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicantUser;
    use crate::models::ApplicationStatus;

    fn app(id: Option<i64>, score: Option<f64>) -> Application {
        Application {
            application_id: id,
            similarity_score: score,
            user: Some(ApplicantUser::default()),
            ..Default::default()
        }
    }

    fn ids(apps: &[Application]) -> Vec<Option<i64>> {
        apps.iter().map(|a| a.application_id).collect()
    }

    fn bounds(min: Option<&str>, max: Option<&str>) -> ApplicantFilter {
        ApplicantFilter::from_params(&FilterParams {
            sort: None,
            min_score: min.map(String::from),
            max_score: max.map(String::from),
        })
    }

    #[test]
    fn test_parse_percentage_valid() {
        assert_eq!(parse_percentage("50"), Some(0.5));
        assert_eq!(parse_percentage(" 0 "), Some(0.0));
        assert_eq!(parse_percentage("100"), Some(1.0));
        assert_eq!(parse_percentage("12.5"), Some(0.125));
    }

    #[test]
    fn test_parse_percentage_invalid_means_no_bound() {
        assert_eq!(parse_percentage(""), None);
        assert_eq!(parse_percentage("   "), None);
        assert_eq!(parse_percentage("abc"), None);
        assert_eq!(parse_percentage("-1"), None);
        assert_eq!(parse_percentage("100.1"), None);
        assert_eq!(parse_percentage("inf"), None);
        assert_eq!(parse_percentage("NaN"), None);
    }

    #[test]
    fn test_parse_percentage_reads_leading_number() {
        assert_eq!(parse_percentage("50%"), Some(0.5));
        assert_eq!(parse_percentage("50abc"), Some(0.5));
        assert_eq!(parse_percentage(" 7.5 percent"), Some(0.075));
        assert_eq!(parse_percentage("1e1x"), Some(0.1));
        assert_eq!(parse_percentage("20e"), Some(0.2));
        assert_eq!(parse_percentage("%50"), None);
        assert_eq!(parse_percentage("-5%"), None);
        assert_eq!(parse_percentage("."), None);
    }

    #[test]
    fn test_sort_option_parse_falls_back_to_default() {
        assert_eq!("high".parse::<SortOption>().unwrap(), SortOption::High);
        assert_eq!("LOW".parse::<SortOption>().unwrap(), SortOption::Low);
        assert_eq!("newest".parse::<SortOption>().unwrap(), SortOption::Default);
    }

    #[test]
    fn test_default_sort_orders_by_id_with_missing_as_zero() {
        let input = vec![app(Some(3), None), app(None, Some(0.1)), app(Some(1), Some(0.9))];
        let out = filter_and_sort(&input, &ApplicantFilter::default());
        assert_eq!(ids(&out), vec![None, Some(1), Some(3)]);
    }

    #[test]
    fn test_applications_without_user_are_dropped() {
        let mut orphan = app(Some(2), Some(0.5));
        orphan.user = None;
        let input = vec![app(Some(1), None), orphan];
        let out = filter_and_sort(&input, &ApplicantFilter::default());
        assert_eq!(ids(&out), vec![Some(1)]);
    }

    #[test]
    fn test_bounds_are_inclusive_and_exclude_unscored() {
        let input = vec![
            app(Some(1), Some(0.2)),
            app(Some(2), Some(0.5)),
            app(Some(3), Some(0.8)),
            app(Some(4), Some(0.81)),
            app(Some(5), None),
        ];
        let out = filter_and_sort(&input, &bounds(Some("20"), Some("80")));
        assert_eq!(ids(&out), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_single_bound_still_excludes_unscored() {
        let input = vec![app(Some(1), None), app(Some(2), Some(0.9))];
        let out = filter_and_sort(&input, &bounds(None, Some("100")));
        assert_eq!(ids(&out), vec![Some(2)]);
    }

    #[test]
    fn test_invalid_bound_is_ignored() {
        let input = vec![app(Some(1), None), app(Some(2), Some(0.9))];
        let out = filter_and_sort(&input, &bounds(Some("lots"), Some("150")));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_high_sort_puts_unscored_last() {
        let input = vec![
            app(Some(1), Some(0.85)),
            app(Some(2), None),
            app(Some(3), Some(0.3)),
        ];
        let filter = ApplicantFilter {
            sort: SortOption::High,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&input, &filter)), vec![Some(1), Some(3), Some(2)]);
    }

    #[test]
    fn test_low_sort_puts_unscored_first() {
        let input = vec![
            app(Some(1), Some(0.85)),
            app(Some(2), None),
            app(Some(3), Some(0.3)),
        ];
        let filter = ApplicantFilter {
            sort: SortOption::Low,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&input, &filter)), vec![Some(2), Some(3), Some(1)]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_scores() {
        let input = vec![app(Some(9), Some(0.5)), app(Some(4), Some(0.5))];
        let filter = ApplicantFilter {
            sort: SortOption::High,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&input, &filter)), vec![Some(9), Some(4)]);
    }

    #[test]
    fn test_status_does_not_affect_membership_or_order() {
        let mut accepted = app(Some(1), Some(0.4));
        accepted.status = ApplicationStatus::Accepted;
        let input = vec![accepted, app(Some(2), Some(0.6))];
        let filter = ApplicantFilter {
            sort: SortOption::High,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&input, &filter)), vec![Some(2), Some(1)]);
    }

    #[test]
    fn test_filtering_is_idempotent_and_leaves_input_untouched() {
        let input = vec![app(Some(2), Some(0.7)), app(Some(1), Some(0.2))];
        let filter = bounds(Some("10"), None);
        let first = filter_and_sort(&input, &filter);
        let second = filter_and_sort(&input, &filter);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ids(&input), vec![Some(2), Some(1)]);
    }

    #[test]
    fn test_filter_params_accept_numbers_in_json() {
        let params: FilterParams =
            serde_json::from_value(serde_json::json!({ "min_score": 40, "max_score": "90" }))
                .unwrap();
        let filter = ApplicantFilter::from_params(&params);
        assert_eq!(filter.min_score, Some(0.4));
        assert_eq!(filter.max_score, Some(0.9));
        assert_eq!(filter.sort, SortOption::Default);
    }

    #[test]
    fn test_format_score_percent() {
        assert_eq!(format_score_percent(Some(0.853)), "85%");
        assert_eq!(format_score_percent(Some(1.0)), "100%");
        assert_eq!(format_score_percent(Some(1.2)), "-");
        assert_eq!(format_score_percent(None), "-");
    }
}
