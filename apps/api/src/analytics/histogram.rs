use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Application;

/// Percentage at or above which an applicant counts as a strong match.
pub const SCORE_THRESHOLD_PERCENT: f64 = 50.0;

pub const NOT_SCORED_BUCKET: &str = "N/A";

/// A named inclusive percentage range.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBucket {
    pub name: &'static str,
    pub min: u32,
    pub max: u32,
}

/// Fixed histogram ranges, in display order. The N/A bucket follows them.
pub const SCORE_BUCKETS: &[ScoreBucket] = &[
    ScoreBucket { name: "0-20%", min: 0, max: 20 },
    ScoreBucket { name: "21-40%", min: 21, max: 40 },
    ScoreBucket { name: "41-60%", min: 41, max: 60 },
    ScoreBucket { name: "61-80%", min: 61, max: 80 },
    ScoreBucket { name: "81-100%", min: 81, max: 100 },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: usize,
    pub scored: usize,
    pub above_threshold: usize,
    pub percentage_above_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistogram {
    pub buckets: Vec<BucketCount>,
    pub summary: ScoreSummary,
}

/// Buckets every application by similarity score.
///
/// Runs over the full list, ignoring filter and sort state. Each application
/// lands in exactly one bucket, so counts always sum to `applications.len()`.
pub fn compute_score_histogram(applications: &[Application]) -> ScoreHistogram {
    let mut counts = vec![0usize; SCORE_BUCKETS.len()];
    let mut not_scored = 0usize;
    let mut scored = 0usize;
    let mut above_threshold = 0usize;

    for application in applications {
        let Some(percent) = valid_percent(application.similarity_score) else {
            not_scored += 1;
            continue;
        };

        scored += 1;
        if percent >= SCORE_THRESHOLD_PERCENT {
            above_threshold += 1;
        }

        match bucket_index(percent) {
            Some(idx) => counts[idx] += 1,
            None => {
                debug!("Score {percent}% matched no bucket, counting as N/A");
                not_scored += 1;
            }
        }
    }

    let mut buckets: Vec<BucketCount> = SCORE_BUCKETS
        .iter()
        .zip(counts)
        .map(|(bucket, count)| BucketCount {
            name: bucket.name.to_string(),
            count,
        })
        .collect();
    buckets.push(BucketCount {
        name: NOT_SCORED_BUCKET.to_string(),
        count: not_scored,
    });

    let percentage_above_threshold = if scored > 0 {
        ((above_threshold as f64 / scored as f64) * 100.0).round() as u32
    } else {
        0
    };

    ScoreHistogram {
        buckets,
        summary: ScoreSummary {
            total: applications.len(),
            scored,
            above_threshold,
            percentage_above_threshold,
        },
    }
}

/// Score as a percentage, if it is a number in [0,1].
fn valid_percent(score: Option<f64>) -> Option<f64> {
    score
        .filter(|s| s.is_finite() && (0.0..=1.0).contains(s))
        .map(|s| s * 100.0)
}

/// First bucket containing the percentage. Percentages are rounded to whole
/// numbers first so that values such as 20.4% land in a bucket rather than
/// between two integer ranges.
fn bucket_index(percent: f64) -> Option<usize> {
    let whole = percent.round() as u32;
    SCORE_BUCKETS
        .iter()
        .position(|b| whole >= b.min && whole <= b.max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: Option<f64>) -> Application {
        Application {
            similarity_score: score,
            ..Default::default()
        }
    }

    fn count(h: &ScoreHistogram, name: &str) -> usize {
        h.buckets.iter().find(|b| b.name == name).unwrap().count
    }

    #[test]
    fn test_empty_list_has_all_buckets_zeroed() {
        let h = compute_score_histogram(&[]);
        assert_eq!(h.buckets.len(), 6);
        assert!(h.buckets.iter().all(|b| b.count == 0));
        assert_eq!(h.summary.percentage_above_threshold, 0);
        assert_eq!(h.summary.total, 0);
    }

    #[test]
    fn test_bucket_order_ends_with_not_scored() {
        let names: Vec<_> = compute_score_histogram(&[])
            .buckets
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(
            names,
            vec!["0-20%", "21-40%", "41-60%", "61-80%", "81-100%", "N/A"]
        );
    }

    #[test]
    fn test_mixed_applicants() {
        let apps = vec![scored(Some(0.85)), scored(None), scored(Some(0.3))];
        let h = compute_score_histogram(&apps);
        assert_eq!(count(&h, "81-100%"), 1);
        assert_eq!(count(&h, "21-40%"), 1);
        assert_eq!(count(&h, "N/A"), 1);
        assert_eq!(
            h.summary,
            ScoreSummary {
                total: 3,
                scored: 2,
                above_threshold: 1,
                percentage_above_threshold: 50,
            }
        );
    }

    #[test]
    fn test_out_of_range_scores_are_not_scored() {
        let apps = vec![scored(Some(1.5)), scored(Some(-0.1))];
        let h = compute_score_histogram(&apps);
        assert_eq!(count(&h, "N/A"), 2);
        assert_eq!(h.summary.scored, 0);
    }

    #[test]
    fn test_bucket_edges() {
        let apps = vec![
            scored(Some(0.0)),
            scored(Some(0.2)),
            scored(Some(0.21)),
            scored(Some(0.6)),
            scored(Some(0.61)),
            scored(Some(1.0)),
        ];
        let h = compute_score_histogram(&apps);
        assert_eq!(count(&h, "0-20%"), 2);
        assert_eq!(count(&h, "21-40%"), 1);
        assert_eq!(count(&h, "41-60%"), 1);
        assert_eq!(count(&h, "61-80%"), 1);
        assert_eq!(count(&h, "81-100%"), 1);
    }

    #[test]
    fn test_fractional_percentages_still_land_in_a_bucket() {
        let apps = vec![scored(Some(0.204)), scored(Some(0.806)), scored(Some(0.4049))];
        let h = compute_score_histogram(&apps);
        assert_eq!(count(&h, "0-20%"), 1);
        assert_eq!(count(&h, "81-100%"), 1);
        assert_eq!(count(&h, "21-40%"), 1);
        assert_eq!(count(&h, "N/A"), 0);
    }

    #[test]
    fn test_counts_sum_to_total() {
        let apps: Vec<_> = (0..=40)
            .map(|i| scored(if i % 7 == 0 { None } else { Some(i as f64 / 40.0) }))
            .collect();
        let h = compute_score_histogram(&apps);
        let sum: usize = h.buckets.iter().map(|b| b.count).sum();
        assert_eq!(sum, apps.len());
    }

    #[test]
    fn test_threshold_is_inclusive_at_fifty() {
        let apps = vec![scored(Some(0.5)), scored(Some(0.49)), scored(Some(0.1))];
        let h = compute_score_histogram(&apps);
        assert_eq!(h.summary.above_threshold, 1);
        // round(1/3 * 100) = 33
        assert_eq!(h.summary.percentage_above_threshold, 33);
    }
}
