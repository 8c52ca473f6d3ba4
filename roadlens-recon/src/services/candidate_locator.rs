//! Candidate survey location
//!
//! Finds the surveys that could plausibly have produced a historical
//! rating: same tenant, segment coverage, a tight creation-time window,
//! and an identity link between the rating's author and the survey.

use crate::models::TimeWindow;
use crate::store::SurveyStore;
use chrono::Duration;
use roadlens_common::db::models::{HistoricalRating, Survey};
use roadlens_common::Result;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Candidate window radius around the rating's timestamp.
///
/// Ingestion historically wrote the derived rating immediately after
/// survey completion, so a tight window is a deliberate
/// precision-over-recall choice: it keeps unrelated surveys of the same
/// segment out of the candidate set.
pub const CANDIDATE_WINDOW_MINUTES: i64 = 5;

/// Bounding-box tolerance for the route containment diagnostic, in
/// degrees (roughly 500 m at mid latitudes)
const BBOX_MARGIN_DEG: f64 = 0.005;

pub struct CandidateLocator {
    surveys: Arc<dyn SurveyStore>,
}

impl CandidateLocator {
    pub fn new(surveys: Arc<dyn SurveyStore>) -> Self {
        Self { surveys }
    }

    /// The time window candidate surveys must fall into for `record`
    pub fn candidate_window(record: &HistoricalRating) -> TimeWindow {
        TimeWindow::around(
            record.created_at,
            Duration::minutes(CANDIDATE_WINDOW_MINUTES),
        )
    }

    /// Locate candidate surveys for one unresolved rating.
    ///
    /// An empty result is the common "insufficient history" case, not an
    /// error. Constraints, all required:
    /// - same tenant (the store query scopes by tenant);
    /// - `record.road_segment_id` in the survey's segment set (exact set
    ///   membership on the decoded set);
    /// - survey created within the candidate window;
    /// - identity link: survey author or project creator equals the
    ///   rating's author (either is sufficient).
    pub async fn locate_candidates(&self, record: &HistoricalRating) -> Result<Vec<Survey>> {
        let window = Self::candidate_window(record);
        let in_window = self
            .surveys
            .find_candidates(record.tenant_id, &record.road_segment_id, window)
            .await?;

        // One creator lookup per project, not per survey
        let mut creators: HashMap<Uuid, Option<Uuid>> = HashMap::new();
        let mut candidates = Vec::new();

        for survey in in_window {
            if !survey.covers_segment(&record.road_segment_id) {
                continue;
            }

            let identity_match = if survey.author_id == record.author_id {
                true
            } else {
                let creator = match creators.get(&survey.project_id) {
                    Some(cached) => *cached,
                    None => {
                        let fetched = self.surveys.project_creator(survey.project_id).await?;
                        creators.insert(survey.project_id, fetched);
                        fetched
                    }
                };
                creator == Some(record.author_id)
            };
            if !identity_match {
                continue;
            }

            self.check_route_containment(record, &survey);
            candidates.push(survey);
        }

        tracing::debug!(
            rating_id = %record.id,
            segment_id = %record.road_segment_id,
            candidates = candidates.len(),
            "Candidate lookup complete"
        );

        Ok(candidates)
    }

    /// Diagnostic only: a reading taken far outside the candidate's
    /// recorded route suggests bad segment data upstream. Never affects
    /// eligibility.
    fn check_route_containment(&self, record: &HistoricalRating, survey: &Survey) {
        let (Some(location), Some(bbox)) = (record.location(), survey.bounding_box()) else {
            return;
        };
        if !bbox.contains(location, BBOX_MARGIN_DEG) {
            tracing::warn!(
                rating_id = %record.id,
                survey_id = %survey.id,
                segment_id = %record.road_segment_id,
                "Rating location outside candidate survey route bounds"
            );
        }
    }
}
