//! Hotness policy: decides whether a post is still worth polling.

use chrono::{DateTime, Utc};

use crate::domain::PostSnapshot;

/// Gravity-decay score over engagement and age.
///
/// hotness = (points + 1) / (age_hours + 2)^gravity
#[derive(Debug, Clone, PartialEq)]
pub struct HotnessPolicy {
    pub gravity: f64,
    /// Polling stops once hotness drops below this value.
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Continue { hotness: f64 },
    Expired { hotness: f64 },
}

impl HotnessPolicy {
    pub const DEFAULT_GRAVITY: f64 = 1.8;
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    pub fn new(gravity: f64, threshold: f64) -> Self {
        Self { gravity, threshold }
    }

    pub fn score(&self, points: i64, age_hours: f64) -> f64 {
        (points as f64 + 1.0) / (age_hours.max(0.0) + 2.0).powf(self.gravity)
    }

    pub fn judge(&self, snapshot: &PostSnapshot, now: DateTime<Utc>) -> Verdict {
        let hotness = self.score(snapshot.points(), snapshot.age_hours(now));
        if hotness < self.threshold {
            Verdict::Expired { hotness }
        } else {
            Verdict::Continue { hotness }
        }
    }
}

impl Default for HotnessPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GRAVITY, Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::post_details;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case::fresh_and_quiet(0, 0.0, 0.2872)]
    #[case::two_days_quiet(0, 48.0, 0.0008747)]
    #[case::one_hour_busy(100, 1.0, 13.98)]
    fn score_matches_formula(#[case] points: i64, #[case] age_hours: f64, #[case] expected: f64) {
        let score = HotnessPolicy::default().score(points, age_hours);
        assert!(
            (score - expected).abs() / expected < 0.001,
            "score({points}, {age_hours}) = {score}, expected ~{expected}"
        );
    }

    #[rstest]
    #[case::fresh_and_quiet(0, 0, true)]
    #[case::two_days_quiet(0, 48, false)]
    #[case::one_hour_busy(100, 1, true)]
    #[case::downvoted_to_oblivion(-5, 0, false)]
    fn judge_applies_threshold(#[case] votes: i64, #[case] age_hours: i64, #[case] keep: bool) {
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let snapshot =
            PostSnapshot::from_details(&post_details("p1", created, votes), false, false, 0.0);

        let verdict = HotnessPolicy::default().judge(&snapshot, created + Duration::hours(age_hours));

        assert_eq!(matches!(verdict, Verdict::Continue { .. }), keep, "{verdict:?}");
    }

    #[test]
    fn threshold_is_inclusive_for_continue() {
        let policy = HotnessPolicy::new(1.0, 0.5);
        // (0 + 1) / (0 + 2)^1 == 0.5
        assert_eq!(policy.score(0, 0.0), 0.5);

        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let snapshot =
            PostSnapshot::from_details(&post_details("p1", created, 0), false, false, 0.0);
        assert_eq!(policy.judge(&snapshot, created), Verdict::Continue { hotness: 0.5 });
    }
}
