//! Confidence scoring for candidate surveys
//!
//! Classifies each candidate into a discrete tier from two weak signals:
//! time proximity (primary) and numeric plausibility of the recorded
//! ride-quality average (secondary corroboration). Pure computation, no
//! I/O.

use crate::models::{CandidateMatch, ConfidenceTier};
use roadlens_common::db::models::{HistoricalRating, Survey};

/// Confidence scorer with fixed tier thresholds.
///
/// Thresholds are not configurable per tenant in the current design;
/// that is a known candidate improvement, not a bug.
pub struct ConfidenceScorer {
    /// Time delta below which a corroborated candidate is High
    high_time_delta_ms: i64,
    /// Value delta below which a candidate can be High
    high_value_delta: f64,
    /// Time delta below which a corroborated candidate is Medium
    medium_time_delta_ms: i64,
    /// Value delta below which a candidate can be Medium
    medium_value_delta: f64,
}

impl ConfidenceScorer {
    /// Create a scorer with the platform's default thresholds.
    ///
    /// **Defaults:**
    /// - High: within 1 minute and ride-quality delta < 0.1
    /// - Medium: within 3 minutes and ride-quality delta < 0.5
    /// - Low: anything else, including candidates without a recorded
    ///   average
    pub fn new() -> Self {
        Self {
            high_time_delta_ms: 60_000,
            high_value_delta: 0.1,
            medium_time_delta_ms: 180_000,
            medium_value_delta: 0.5,
        }
    }

    /// Score one candidate survey against a historical rating.
    ///
    /// Tier assignment is evaluated in order, first match wins. A
    /// candidate without a recorded average has no value delta and can
    /// never reach High or Medium.
    pub fn score(&self, record: &HistoricalRating, candidate: &Survey) -> CandidateMatch {
        let time_delta_ms = (candidate.created_at - record.created_at)
            .num_milliseconds()
            .abs();
        let value_delta = candidate
            .average_ride_quality
            .map(|avg| (avg - record.ride_quality).abs());

        let tier = self.assign_tier(time_delta_ms, value_delta);

        CandidateMatch {
            survey_id: candidate.id,
            project_id: candidate.project_id,
            tier,
            time_delta_ms,
            value_delta,
        }
    }

    fn assign_tier(&self, time_delta_ms: i64, value_delta: Option<f64>) -> ConfidenceTier {
        match value_delta {
            Some(delta) if time_delta_ms < self.high_time_delta_ms && delta < self.high_value_delta => {
                ConfidenceTier::High
            }
            Some(delta)
                if time_delta_ms < self.medium_time_delta_ms && delta < self.medium_value_delta =>
            {
                ConfidenceTier::Medium
            }
            _ => ConfidenceTier::Low,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn rating(ride_quality: f64) -> HistoricalRating {
        HistoricalRating {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            road_segment_id: "seg-1".to_string(),
            ride_quality,
            author_id: Uuid::new_v4(),
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
            resolution: roadlens_common::db::models::Resolution::Unresolved,
        }
    }

    fn survey_after(record: &HistoricalRating, offset_ms: i64, average: Option<f64>) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            tenant_id: record.tenant_id,
            author_id: record.author_id,
            road_segment_ids: HashSet::from(["seg-1".to_string()]),
            average_ride_quality: average,
            path: None,
            created_at: record.created_at + Duration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn close_time_and_value_is_high() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);
        let candidate = survey_after(&record, 30_000, Some(3.05));

        let scored = scorer.score(&record, &candidate);
        assert_eq!(scored.tier, ConfidenceTier::High);
        assert_eq!(scored.time_delta_ms, 30_000);
    }

    #[test]
    fn moderate_deltas_are_medium() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);
        let candidate = survey_after(&record, 150_000, Some(3.3));

        let scored = scorer.score(&record, &candidate);
        assert_eq!(scored.tier, ConfidenceTier::Medium);
    }

    #[test]
    fn stale_candidate_is_low_regardless_of_value() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);
        let candidate = survey_after(&record, 400_000, Some(3.0));

        let scored = scorer.score(&record, &candidate);
        assert_eq!(scored.tier, ConfidenceTier::Low);
    }

    #[test]
    fn missing_average_disqualifies_high_and_medium() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);
        let candidate = survey_after(&record, 5_000, None);

        let scored = scorer.score(&record, &candidate);
        assert_eq!(scored.tier, ConfidenceTier::Low);
        assert_eq!(scored.value_delta, None);
    }

    #[test]
    fn time_delta_is_absolute() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);
        // Survey created 30 s before the rating
        let candidate = survey_after(&record, -30_000, Some(3.0));

        let scored = scorer.score(&record, &candidate);
        assert_eq!(scored.time_delta_ms, 30_000);
        assert_eq!(scored.tier, ConfidenceTier::High);
    }

    #[test]
    fn boundary_values_fall_to_the_lower_tier() {
        let scorer = ConfidenceScorer::new();
        let record = rating(3.0);

        // Exactly 60 s is not High (strict less-than)
        let at_high_edge = survey_after(&record, 60_000, Some(3.0));
        assert_eq!(
            scorer.score(&record, &at_high_edge).tier,
            ConfidenceTier::Medium
        );

        // Exactly 180 s is not Medium either
        let at_medium_edge = survey_after(&record, 180_000, Some(3.0));
        assert_eq!(
            scorer.score(&record, &at_medium_edge).tier,
            ConfidenceTier::Low
        );

        // Value delta of exactly 0.1 is not High
        let at_value_edge = survey_after(&record, 1_000, Some(3.1));
        assert_eq!(
            scorer.score(&record, &at_value_edge).tier,
            ConfidenceTier::Medium
        );
    }
}
