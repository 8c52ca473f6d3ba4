//! Shared entity models
//!
//! Rows are stored with TEXT UUID ids and RFC3339 TEXT timestamps.
//! Set-valued and geometry columns are JSON in TEXT.

use crate::geo::{self, BoundingBox, GeoPoint};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A survey project commissioned by a tenant (city hall)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One completed field survey covering a route.
///
/// `road_segment_ids` is the set of road-segment identifiers the survey's
/// path intersects, computed at upload time by the ingestion service.
/// Surveys are read-only inputs to reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub id: Uuid,
    pub project_id: Uuid,
    pub tenant_id: Uuid,
    pub author_id: Uuid,
    pub road_segment_ids: HashSet<String>,
    pub average_ride_quality: Option<f64>,
    /// Recorded route geometry, when the mobile app uploaded one
    pub path: Option<Vec<GeoPoint>>,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    /// Exact set-membership test (never substring or prefix matching)
    pub fn covers_segment(&self, segment_id: &str) -> bool {
        self.road_segment_ids.contains(segment_id)
    }

    /// Length of the recorded route in meters, if geometry was uploaded
    pub fn path_length_m(&self) -> Option<f64> {
        self.path.as_deref().map(geo::path_length_m)
    }

    /// Bounding box of the recorded route, if geometry was uploaded
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.path.as_deref().and_then(BoundingBox::from_points)
    }
}

/// Resolution state of a historical rating.
///
/// Linkage metadata is written at most once per record; modeling it as a
/// sum type makes a half-written resolution unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Unresolved,
    Resolved {
        survey_id: Uuid,
        project_id: Uuid,
        anomaly_count: i64,
    },
}

impl Resolution {
    /// Decode from the three nullable storage columns, all-or-nothing.
    ///
    /// A row with only one of survey/project set is corrupt and is
    /// rejected rather than silently treated as unresolved. A missing
    /// anomaly count on a resolved row reads as 0.
    pub fn from_columns(
        survey_id: Option<&str>,
        project_id: Option<&str>,
        anomaly_count: Option<i64>,
    ) -> Result<Self> {
        match (survey_id, project_id) {
            (None, None) => Ok(Resolution::Unresolved),
            (Some(survey), Some(project)) => Ok(Resolution::Resolved {
                survey_id: parse_uuid(survey, "resolved_survey_id")?,
                project_id: parse_uuid(project, "resolved_project_id")?,
                anomaly_count: anomaly_count.unwrap_or(0),
            }),
            _ => Err(Error::Internal(
                "Rating row has partial resolution columns".to_string(),
            )),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// One point-in-time ride-quality measurement recorded before linkage
/// metadata existed.
///
/// Immutable except for `resolution`, which the reconciliation engine
/// writes at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRating {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub road_segment_id: String,
    /// EIRI-like roughness index; lower is better
    pub ride_quality: f64,
    pub author_id: Uuid,
    /// Reading location, when the original ingestion captured one
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub resolution: Resolution,
}

impl HistoricalRating {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_resolved()
    }

    /// Reading location as a point, when both coordinates are present
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// Derived per-(tenant, road segment) statistics.
///
/// Fully derivable from the rating and survey history; every recompute
/// overwrites all fields together so the row stays internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegmentAggregate {
    pub tenant_id: Uuid,
    pub road_segment_id: String,
    pub total_surveys: i64,
    pub total_anomalies: i64,
    pub unique_contributors: i64,
    pub last_survey_date: Option<DateTime<Utc>>,
    pub average_ride_quality: Option<f64>,
}

/// Audit record for one successful resolution.
///
/// `tie_break` marks records resolved defensively among multiple
/// high-confidence candidates, for operator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionAudit {
    pub rating_id: Uuid,
    pub survey_id: Uuid,
    pub candidate_count: i64,
    pub high_count: i64,
    pub medium_count: i64,
    pub tie_break: bool,
    pub created_at: DateTime<Utc>,
}

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {} '{}': {}", column, value, e)))
}

/// Parse an RFC3339 TEXT timestamp column
pub fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {} '{}': {}", column, value, e)))
}
