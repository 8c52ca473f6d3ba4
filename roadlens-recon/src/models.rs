//! Matching types for the reconciliation engine
//!
//! `CandidateMatch` values are computed fresh per rating during matching
//! and discarded after resolution; they are never persisted.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Closed time interval used for candidate and anomaly queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Symmetric window of `radius` around `center`
    pub fn around(center: DateTime<Utc>, radius: Duration) -> Self {
        Self {
            start: center - radius,
            end: center + radius,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Filter for unresolved-rating scans; `None` means the full population
#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    pub segment_id: Option<String>,
}

impl RatingFilter {
    pub fn for_segment(segment_id: impl Into<String>) -> Self {
        Self {
            segment_id: Some(segment_id.into()),
        }
    }
}

/// Discrete confidence classification of a candidate survey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// Tight time proximity corroborated by the recorded average
    High,
    /// Plausible on both signals, but not tight enough to trust alone
    Medium,
    /// Everything else, including candidates without a recorded average
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// A scored candidate survey for one historical rating
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub survey_id: Uuid,
    pub project_id: Uuid,
    pub tier: ConfidenceTier,
    /// |survey.created_at - rating.created_at| in milliseconds
    pub time_delta_ms: i64,
    /// |survey.average_ride_quality - rating.ride_quality|; None when the
    /// survey has no recorded average
    pub value_delta: Option<f64>,
}
