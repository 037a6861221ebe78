// Similarity Matcher
//
// *Le Rapprochement* (The Matching) - Votes of stored exemplars similar to a snapshot

use lemotif::{Exemplar, Profile, Recommendation, RecommendationSource, Snapshot};
use std::collections::BTreeMap;

/// Highest confidence the matcher may report
pub const MAX_PATTERN_CONFIDENCE: f64 = 0.85;

// Scores are kept in tenths so the qualification threshold compares exactly.
const NEAR_HOUR_POINTS: u32 = 3;
const CLOSE_HOUR_POINTS: u32 = 1;
const SAME_DAY_POINTS: u32 = 2;
const SAME_POWER_POINTS: u32 = 2;
const SAME_APP_POINTS: u32 = 3;
const QUALIFYING_POINTS: u32 = 5;

/// Weighted similarity of one exemplar against a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityScore(u32);

impl SimilarityScore {
    /// Score in tenths (0..=10)
    pub fn tenths(self) -> u32 {
        self.0
    }

    /// Score as a fraction (0.0..=1.0)
    pub fn value(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Whether the exemplar counts as similar
    pub fn qualifies(self) -> bool {
        self.0 >= QUALIFYING_POINTS
    }
}

/// Scores exemplars against a snapshot and aggregates per-profile votes
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    /// Create a matcher
    pub fn new() -> Self {
        Self
    }

    /// Additive similarity score of one exemplar
    pub fn score(&self, snapshot: &Snapshot, exemplar: &Exemplar) -> SimilarityScore {
        let mut points = 0;

        let hour_distance = snapshot.hour.abs_diff(exemplar.hour);
        if hour_distance <= 1 {
            points += NEAR_HOUR_POINTS;
        } else if hour_distance <= 3 {
            points += CLOSE_HOUR_POINTS;
        }

        if snapshot.day_of_week == exemplar.day_of_week {
            points += SAME_DAY_POINTS;
        }

        if snapshot.is_charging == exemplar.is_charging {
            points += SAME_POWER_POINTS;
        }

        if snapshot.active_app == exemplar.active_app {
            points += SAME_APP_POINTS;
        }

        SimilarityScore(points)
    }

    /// Vote among qualifying exemplars; `None` when none qualify
    ///
    /// The profile with the largest summed score wins, ties going to the
    /// profile declared first. Confidence is the winner's share of all
    /// qualifying score, capped at [`MAX_PATTERN_CONFIDENCE`].
    pub fn match_exemplars(
        &self,
        snapshot: &Snapshot,
        exemplars: &[Exemplar],
    ) -> Option<Recommendation> {
        let mut votes: BTreeMap<Profile, u32> = BTreeMap::new();
        let mut qualifying = 0usize;

        for exemplar in exemplars {
            let score = self.score(snapshot, exemplar);
            if score.qualifies() {
                qualifying += 1;
                *votes.entry(exemplar.chosen_plan).or_insert(0) += score.tenths();
            }
        }

        let total: u32 = votes.values().sum();
        let (winner, winner_points) = votes.iter().fold(None, |best, (plan, points)| match best {
            Some((_, best_points)) if *points <= best_points => best,
            _ => Some((*plan, *points)),
        })?;

        if total == 0 {
            return None;
        }

        let confidence =
            (f64::from(winner_points) / f64::from(total)).min(MAX_PATTERN_CONFIDENCE);

        tracing::debug!(
            "Pattern vote: {} of {} exemplars similar, {} wins with {}/{}",
            qualifying,
            exemplars.len(),
            winner.as_str(),
            winner_points,
            total
        );

        Some(Recommendation::new(
            winner,
            confidence,
            format!("Predicted from {} similar past choices", qualifying),
            RecommendationSource::Patterns,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use rstest::rstest;

    // 2024-01-03 is a Wednesday (day_of_week = 2)
    fn wednesday(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 3, hour, 0, 0).unwrap()
    }

    fn snap_at(at: DateTime<Local>, charging: bool, app: &str) -> Snapshot {
        Snapshot::at(at, 50.0, 50.0, Some(80), charging, app)
    }

    fn exemplar_at(at: DateTime<Local>, charging: bool, app: &str, plan: Profile) -> Exemplar {
        Exemplar::from_snapshot(&snap_at(at, charging, app), plan)
    }

    #[rstest]
    #[case(14, 10)] // same hour, day, power, app
    #[case(15, 10)] // one hour away still near
    #[case(16, 8)] // two hours away is close
    #[case(17, 8)]
    #[case(18, 7)] // four hours away earns nothing
    fn test_hour_terms(#[case] exemplar_hour: u32, #[case] expected: u32) {
        let matcher = SimilarityMatcher::new();
        let snapshot = snap_at(wednesday(14), true, "code.exe");
        let exemplar = exemplar_at(wednesday(exemplar_hour), true, "code.exe", Profile::Balanced);
        assert_eq!(matcher.score(&snapshot, &exemplar).tenths(), expected);
    }

    #[test]
    fn test_hour_distance_does_not_wrap_midnight() {
        let matcher = SimilarityMatcher::new();
        let snapshot = snap_at(wednesday(23), true, "code.exe");
        let exemplar = exemplar_at(wednesday(0), true, "code.exe", Profile::Balanced);
        assert_eq!(matcher.score(&snapshot, &exemplar).tenths(), 7);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let matcher = SimilarityMatcher::new();
        // Only the hour matches (3), not similar.
        let snapshot = snap_at(wednesday(14), true, "code.exe");
        let thursday = wednesday(14) + Duration::days(1);
        let far = exemplar_at(thursday, false, "vlc.exe", Profile::PowerSaver);
        assert!(!matcher.score(&snapshot, &far).qualifies());

        // Hour (3) + same power (2) = 5, exactly at the threshold.
        let edge = exemplar_at(thursday, true, "vlc.exe", Profile::PowerSaver);
        let score = matcher.score(&snapshot, &edge);
        assert_eq!(score.value(), 0.5);
        assert!(score.qualifies());
    }

    #[test]
    fn test_no_qualifying_exemplar_defers() {
        let snapshot = snap_at(wednesday(14), true, "code.exe");
        let sunday_early = wednesday(2) + Duration::days(4);
        let exemplars: Vec<Exemplar> = (0..12)
            .map(|_| exemplar_at(sunday_early, false, "vlc.exe", Profile::PowerSaver))
            .collect();
        assert!(SimilarityMatcher::new().match_exemplars(&snapshot, &exemplars).is_none());
    }

    #[test]
    fn test_votes_are_score_weighted() {
        let snapshot = snap_at(wednesday(14), true, "code.exe");
        let thursday = wednesday(14) + Duration::days(1);
        let exemplars = vec![
            // 1.0 for Balanced
            exemplar_at(wednesday(14), true, "code.exe", Profile::Balanced),
            // 0.5 for HighPerformance
            exemplar_at(thursday, true, "vlc.exe", Profile::HighPerformance),
            // 0.8 for PowerSaver
            exemplar_at(thursday, true, "code.exe", Profile::PowerSaver),
        ];

        let rec = SimilarityMatcher::new()
            .match_exemplars(&snapshot, &exemplars)
            .expect("similar exemplars exist");
        assert_eq!(rec.recommended_plan, Profile::Balanced);
        assert!((rec.confidence - 10.0 / 23.0).abs() < 1e-9);
        assert!(rec.reason.contains('3'));
        assert_eq!(rec.source, RecommendationSource::Patterns);
    }

    #[test]
    fn test_tie_goes_to_first_declared_profile() {
        let snapshot = snap_at(wednesday(14), true, "code.exe");
        let exemplars = vec![
            exemplar_at(wednesday(14), true, "code.exe", Profile::PowerSaver),
            exemplar_at(wednesday(14), true, "code.exe", Profile::Balanced),
        ];
        let rec = SimilarityMatcher::new()
            .match_exemplars(&snapshot, &exemplars)
            .expect("similar exemplars exist");
        assert_eq!(rec.recommended_plan, Profile::Balanced);
        assert_eq!(rec.confidence, 0.5);
    }

    #[test]
    fn test_unanimous_vote_is_capped() {
        let snapshot = snap_at(wednesday(14), false, "notepad.exe");
        let exemplars: Vec<Exemplar> = (0..10)
            .map(|_| exemplar_at(wednesday(14), false, "notepad.exe", Profile::PowerSaver))
            .collect();
        let rec = SimilarityMatcher::new()
            .match_exemplars(&snapshot, &exemplars)
            .expect("similar exemplars exist");
        assert_eq!(rec.confidence, MAX_PATTERN_CONFIDENCE);
        assert!(rec.reason.contains("10"));
    }
}
