//! Hazard report store over the shared SQLite pool

use super::HazardStore;
use crate::models::TimeWindow;
use async_trait::async_trait;
use roadlens_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct SqliteHazardStore {
    pool: SqlitePool,
}

impl SqliteHazardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HazardStore for SqliteHazardStore {
    async fn count_anomalies(
        &self,
        project_id: Uuid,
        segment_id: &str,
        window: TimeWindow,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM hazard_reports
            WHERE project_id = ? AND road_segment_id = ?
              AND reported_at >= ? AND reported_at <= ?
            "#,
        )
        .bind(project_id.to_string())
        .bind(segment_id)
        .bind(window.start.to_rfc3339())
        .bind(window.end.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}
