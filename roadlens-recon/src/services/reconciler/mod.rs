//! Reconciliation batch driver
//!
//! Streams the unresolved rating backlog in fixed-size chunks. Within a
//! chunk every record is dispatched concurrently and the driver waits
//! for the whole chunk before starting the next: peak store load stays
//! bounded while I/O latency still overlaps. Records are independent;
//! nothing may depend on completion order inside a chunk.

pub mod statistics;

use crate::config::ReconSettings;
use crate::models::{CandidateMatch, ConfidenceTier, RatingFilter};
use crate::services::candidate_locator::CandidateLocator;
use crate::services::confidence_scorer::ConfidenceScorer;
use crate::services::resolution_policy::{resolve, ResolutionOutcome, UnresolvedReason};
use crate::store::{HazardStore, RatingStore, SurveyStore};
use futures::future::join_all;
use roadlens_common::db::models::{HistoricalRating, ResolutionAudit};
use roadlens_common::Result;
use statistics::{BatchSummary, RecordOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Run options for one backfill invocation
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Records dispatched concurrently per chunk
    pub chunk_size: usize,
    /// Timeout around one record's store work
    pub record_timeout: Duration,
    /// Suppress all writes, still producing the same summary counts
    pub dry_run: bool,
    /// Restrict the run to one road segment (incremental/test runs)
    pub segment_filter: Option<String>,
}

impl ReconcilerOptions {
    pub fn from_settings(
        settings: &ReconSettings,
        dry_run: bool,
        segment_filter: Option<String>,
    ) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            record_timeout: Duration::from_millis(settings.record_timeout_ms),
            dry_run,
            segment_filter,
        }
    }
}

pub struct Reconciler {
    locator: CandidateLocator,
    scorer: ConfidenceScorer,
    ratings: Arc<dyn RatingStore>,
    hazards: Arc<dyn HazardStore>,
    options: ReconcilerOptions,
}

impl Reconciler {
    pub fn new(
        surveys: Arc<dyn SurveyStore>,
        ratings: Arc<dyn RatingStore>,
        hazards: Arc<dyn HazardStore>,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            locator: CandidateLocator::new(surveys),
            scorer: ConfidenceScorer::new(),
            ratings,
            hazards,
            options,
        }
    }

    /// Drain the unresolved backlog and return the run summary.
    ///
    /// Per-record failures are logged and counted, never propagated; the
    /// batch always drains. Cancellation is honored between chunks, so a
    /// cancelled run still finishes its in-flight chunk and reports the
    /// counts it accumulated.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<BatchSummary> {
        let filter = RatingFilter {
            segment_id: self.options.segment_filter.clone(),
        };
        let records = self.ratings.find_unresolved(&filter).await?;
        let total = records.len();
        let mut summary = BatchSummary::new(self.options.dry_run);
        let start = Instant::now();

        tracing::info!(
            total,
            chunk_size = self.options.chunk_size,
            dry_run = self.options.dry_run,
            segment = self.options.segment_filter.as_deref().unwrap_or("<all>"),
            "Starting reconciliation backfill"
        );

        for chunk in records.chunks(self.options.chunk_size.max(1)) {
            if cancel.is_cancelled() {
                tracing::warn!(
                    processed = summary.processed,
                    total,
                    "Reconciliation cancelled between chunks"
                );
                break;
            }

            let outcomes = join_all(chunk.iter().map(|record| self.process_record(record))).await;
            for outcome in outcomes {
                summary.record(outcome);
            }

            let elapsed = start.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                summary.processed as f64 / elapsed
            } else {
                0.0
            };
            let eta_secs = if rate > 0.0 {
                ((total - summary.processed) as f64 / rate) as u64
            } else {
                0
            };
            tracing::info!(
                "Reconciliation progress: {}/{} ({:.1}%) | Rate: {:.1} records/sec | ETA: {}s | Updated: {} | Errors: {}",
                summary.processed,
                total,
                (summary.processed as f64 / total.max(1) as f64) * 100.0,
                rate,
                eta_secs,
                summary.updated,
                summary.errored
            );
        }

        tracing::info!("{}", summary.display_string());
        Ok(summary)
    }

    /// Process one record, converting every failure mode into an outcome
    async fn process_record(&self, record: &HistoricalRating) -> RecordOutcome {
        match tokio::time::timeout(self.options.record_timeout, self.try_process(record)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(
                    rating_id = %record.id,
                    error = %e,
                    "Record failed, continuing batch"
                );
                RecordOutcome::Errored
            }
            Err(_) => {
                tracing::warn!(
                    rating_id = %record.id,
                    timeout_ms = self.options.record_timeout.as_millis() as u64,
                    "Record timed out, continuing batch"
                );
                RecordOutcome::Errored
            }
        }
    }

    async fn try_process(&self, record: &HistoricalRating) -> Result<RecordOutcome> {
        let candidates = self.locator.locate_candidates(record).await?;
        let matches: Vec<CandidateMatch> = candidates
            .iter()
            .map(|candidate| self.scorer.score(record, candidate))
            .collect();

        match resolve(&matches) {
            ResolutionOutcome::Unresolved(reason) => {
                tracing::debug!(
                    rating_id = %record.id,
                    reason = reason.as_str(),
                    "Rating left unresolved"
                );
                Ok(match reason {
                    UnresolvedReason::NoCandidates => RecordOutcome::NoCandidates,
                    UnresolvedReason::Ambiguous => RecordOutcome::Ambiguous,
                    UnresolvedReason::LowConfidence => RecordOutcome::LowConfidence,
                })
            }
            ResolutionOutcome::Resolved { winner, tie_break } => {
                // Anomalies are counted over the same window the
                // candidate had to fall into.
                let window = CandidateLocator::candidate_window(record);
                let anomaly_count = self
                    .hazards
                    .count_anomalies(winner.project_id, &record.road_segment_id, window)
                    .await? as i64;

                if !self.options.dry_run {
                    self.ratings
                        .record_resolution(
                            record.id,
                            winner.survey_id,
                            winner.project_id,
                            anomaly_count,
                        )
                        .await?;
                    self.ratings
                        .record_audit(&ResolutionAudit {
                            rating_id: record.id,
                            survey_id: winner.survey_id,
                            candidate_count: matches.len() as i64,
                            high_count: count_tier(&matches, ConfidenceTier::High),
                            medium_count: count_tier(&matches, ConfidenceTier::Medium),
                            tie_break,
                            created_at: chrono::Utc::now(),
                        })
                        .await?;
                }

                tracing::debug!(
                    rating_id = %record.id,
                    survey_id = %winner.survey_id,
                    tier = winner.tier.as_str(),
                    anomaly_count,
                    tie_break,
                    "Rating resolved"
                );
                Ok(RecordOutcome::Updated)
            }
        }
    }
}

fn count_tier(matches: &[CandidateMatch], tier: ConfidenceTier) -> i64 {
    matches.iter().filter(|m| m.tier == tier).count() as i64
}
