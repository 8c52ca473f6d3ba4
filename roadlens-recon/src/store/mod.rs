//! Store interfaces and their SQLite implementations
//!
//! The engine talks to its collaborators (survey, rating, hazard and
//! aggregate stores) through async trait seams, so the batch driver and
//! services are testable against in-memory mocks. Production wiring uses
//! the SQLite implementations over the shared pool.

pub mod aggregates;
pub mod hazards;
pub mod ratings;
pub mod surveys;

pub use aggregates::SqliteAggregateStore;
pub use hazards::SqliteHazardStore;
pub use ratings::SqliteRatingStore;
pub use surveys::SqliteSurveyStore;

use crate::models::{RatingFilter, TimeWindow};
use async_trait::async_trait;
use roadlens_common::db::models::{
    HistoricalRating, ResolutionAudit, RoadSegmentAggregate, Survey,
};
use roadlens_common::Result;
use uuid::Uuid;

/// Read access to surveys and their owning projects
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Surveys of one tenant touching a segment, created inside the
    /// window.
    ///
    /// The store may use the segment id only to narrow the result set;
    /// exact membership is the locator's job (it operates on the decoded
    /// set, so an over-approximating store stays correct).
    async fn find_candidates(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Survey>>;

    /// Creator of a project, or None for an unknown project id
    async fn project_creator(&self, project_id: Uuid) -> Result<Option<Uuid>>;
}

/// Access to historical ratings and their resolution metadata
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// All unresolved ratings, ordered by creation time ascending
    async fn find_unresolved(&self, filter: &RatingFilter) -> Result<Vec<HistoricalRating>>;

    /// Every rating row of one (tenant, segment) pair, resolved or not
    async fn ratings_for_segment(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
    ) -> Result<Vec<HistoricalRating>>;

    /// Distinct (tenant, segment) pairs present in the rating history
    async fn segment_pairs(&self, filter: &RatingFilter) -> Result<Vec<(Uuid, String)>>;

    /// Persist a resolution, refusing to overwrite an existing one
    async fn record_resolution(
        &self,
        rating_id: Uuid,
        survey_id: Uuid,
        project_id: Uuid,
        anomaly_count: i64,
    ) -> Result<()>;

    /// Persist the audit row for a successful resolution
    async fn record_audit(&self, audit: &ResolutionAudit) -> Result<()>;
}

/// Read access to hazard reports
#[async_trait]
pub trait HazardStore: Send + Sync {
    /// Hazards reported for a project's segment inside the window
    async fn count_anomalies(
        &self,
        project_id: Uuid,
        segment_id: &str,
        window: TimeWindow,
    ) -> Result<u64>;
}

/// Write access to the per-segment aggregate summary store
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Create-or-overwrite, all fields together
    async fn upsert(&self, aggregate: &RoadSegmentAggregate) -> Result<()>;

    /// Current aggregate row, if one exists
    async fn fetch(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
    ) -> Result<Option<RoadSegmentAggregate>>;
}
