//! Aggregate recomputation engine
//!
//! Derives per-(tenant, road segment) summary statistics from the full
//! rating history and upserts them. Always recomputed from source data
//! rather than incrementally maintained, trading I/O cost for
//! correctness against any historical corrections; safe to re-run.

use crate::models::RatingFilter;
use crate::services::reconciler::statistics::AggregateSummary;
use crate::store::{AggregateStore, RatingStore};
use roadlens_common::db::models::{HistoricalRating, Resolution, RoadSegmentAggregate};
use roadlens_common::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct AggregateEngine {
    ratings: Arc<dyn RatingStore>,
    aggregates: Arc<dyn AggregateStore>,
    dry_run: bool,
}

impl AggregateEngine {
    pub fn new(
        ratings: Arc<dyn RatingStore>,
        aggregates: Arc<dyn AggregateStore>,
        dry_run: bool,
    ) -> Self {
        Self {
            ratings,
            aggregates,
            dry_run,
        }
    }

    /// Recompute and upsert the aggregate for one (tenant, segment) pair.
    ///
    /// Returns the derived aggregate; the upsert is suppressed under
    /// dry-run.
    pub async fn recompute(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
    ) -> Result<RoadSegmentAggregate> {
        let rows = self.ratings.ratings_for_segment(tenant_id, segment_id).await?;
        let aggregate = derive_aggregate(tenant_id, segment_id, &rows);

        if !self.dry_run {
            self.aggregates.upsert(&aggregate).await?;
        }

        tracing::debug!(
            tenant_id = %tenant_id,
            segment_id = %segment_id,
            total_surveys = aggregate.total_surveys,
            total_anomalies = aggregate.total_anomalies,
            "Aggregate recomputed"
        );

        Ok(aggregate)
    }

    /// Recompute every (tenant, segment) pair in the rating history,
    /// optionally narrowed to one segment.
    ///
    /// Pairs are processed sequentially (concurrent recomputation of the
    /// same pair would race on the upsert) and failures are isolated per
    /// pair: the pass always drains and reports a summary.
    pub async fn recompute_all(
        &self,
        segment_filter: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AggregateSummary> {
        let filter = RatingFilter {
            segment_id: segment_filter.map(str::to_string),
        };
        let pairs = self.ratings.segment_pairs(&filter).await?;
        let mut summary = AggregateSummary::new(self.dry_run);

        tracing::info!(
            segments = pairs.len(),
            dry_run = self.dry_run,
            "Starting aggregate recomputation"
        );

        for (tenant_id, segment_id) in pairs {
            if cancel.is_cancelled() {
                tracing::warn!(
                    completed = summary.segments,
                    "Aggregate recomputation cancelled"
                );
                break;
            }

            summary.segments += 1;
            match self.recompute(tenant_id, &segment_id).await {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    summary.errored += 1;
                    tracing::error!(
                        tenant_id = %tenant_id,
                        segment_id = %segment_id,
                        error = %e,
                        "Aggregate recomputation failed for segment"
                    );
                }
            }
        }

        tracing::info!("{}", summary.display_string());
        Ok(summary)
    }
}

/// Derive the aggregate for one pair from its rating rows. Pure.
///
/// Note the deliberate asymmetry: contributors are counted across all
/// rows, while survey count and last survey date consider resolved rows
/// only (an unresolved row has no survey to date).
pub fn derive_aggregate(
    tenant_id: Uuid,
    segment_id: &str,
    rows: &[HistoricalRating],
) -> RoadSegmentAggregate {
    let mut surveys = HashSet::new();
    let mut contributors = HashSet::new();
    let mut total_anomalies = 0i64;
    let mut last_survey_date = None;
    let mut quality_sum = 0.0f64;

    for row in rows {
        contributors.insert(row.author_id);
        quality_sum += row.ride_quality;

        if let Resolution::Resolved {
            survey_id,
            anomaly_count,
            ..
        } = &row.resolution
        {
            surveys.insert(*survey_id);
            total_anomalies += anomaly_count;
            last_survey_date = match last_survey_date {
                Some(latest) if latest >= row.created_at => Some(latest),
                _ => Some(row.created_at),
            };
        }
    }

    let average_ride_quality = if rows.is_empty() {
        None
    } else {
        Some(quality_sum / rows.len() as f64)
    };

    RoadSegmentAggregate {
        tenant_id,
        road_segment_id: segment_id.to_string(),
        total_surveys: surveys.len() as i64,
        total_anomalies,
        unique_contributors: contributors.len() as i64,
        last_survey_date,
        average_ride_quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(
        author: Uuid,
        ride_quality: f64,
        offset_min: i64,
        resolution: Resolution,
    ) -> HistoricalRating {
        HistoricalRating {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            road_segment_id: "seg-1".to_string(),
            ride_quality,
            author_id: author,
            latitude: None,
            longitude: None,
            created_at: Utc::now() + Duration::minutes(offset_min),
            resolution,
        }
    }

    fn resolved(survey: Uuid, anomalies: i64) -> Resolution {
        Resolution::Resolved {
            survey_id: survey,
            project_id: Uuid::new_v4(),
            anomaly_count: anomalies,
        }
    }

    #[test]
    fn empty_history_derives_zeroed_aggregate() {
        let aggregate = derive_aggregate(Uuid::new_v4(), "seg-1", &[]);
        assert_eq!(aggregate.total_surveys, 0);
        assert_eq!(aggregate.total_anomalies, 0);
        assert_eq!(aggregate.unique_contributors, 0);
        assert_eq!(aggregate.last_survey_date, None);
        assert_eq!(aggregate.average_ride_quality, None);
    }

    #[test]
    fn counts_distinct_surveys_and_authors() {
        let tenant = Uuid::new_v4();
        let author_a = Uuid::new_v4();
        let author_b = Uuid::new_v4();
        let survey_1 = Uuid::new_v4();
        let survey_2 = Uuid::new_v4();
        let survey_3 = Uuid::new_v4();

        // Three distinct resolved surveys, two distinct authors,
        // anomaly counts [1, unset, 2]
        let rows = vec![
            row(author_a, 2.0, 0, resolved(survey_1, 1)),
            row(author_b, 3.0, 1, resolved(survey_2, 0)),
            row(author_a, 4.0, 2, resolved(survey_3, 2)),
        ];

        let aggregate = derive_aggregate(tenant, "seg-1", &rows);
        assert_eq!(aggregate.total_surveys, 3);
        assert_eq!(aggregate.total_anomalies, 3);
        assert_eq!(aggregate.unique_contributors, 2);
        assert_eq!(aggregate.average_ride_quality, Some(3.0));
    }

    #[test]
    fn duplicate_survey_ids_count_once() {
        let survey = Uuid::new_v4();
        let rows = vec![
            row(Uuid::new_v4(), 2.0, 0, resolved(survey, 1)),
            row(Uuid::new_v4(), 2.0, 1, resolved(survey, 1)),
        ];

        let aggregate = derive_aggregate(Uuid::new_v4(), "seg-1", &rows);
        assert_eq!(aggregate.total_surveys, 1);
        assert_eq!(aggregate.total_anomalies, 2);
    }

    #[test]
    fn unresolved_rows_count_toward_contributors_not_surveys() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rows = vec![
            row(author, 2.0, 5, Resolution::Unresolved),
            row(other, 3.0, 0, resolved(Uuid::new_v4(), 0)),
        ];

        let aggregate = derive_aggregate(Uuid::new_v4(), "seg-1", &rows);
        assert_eq!(aggregate.total_surveys, 1);
        assert_eq!(aggregate.unique_contributors, 2);
        // The unresolved row is newer but does not move the survey date
        assert_eq!(aggregate.last_survey_date, Some(rows[1].created_at));
    }

    #[test]
    fn derivation_is_deterministic() {
        let rows = vec![
            row(Uuid::new_v4(), 2.5, 0, resolved(Uuid::new_v4(), 1)),
            row(Uuid::new_v4(), 3.5, 1, Resolution::Unresolved),
        ];
        let tenant = Uuid::new_v4();

        let first = derive_aggregate(tenant, "seg-1", &rows);
        let second = derive_aggregate(tenant, "seg-1", &rows);
        assert_eq!(first, second);
    }
}
