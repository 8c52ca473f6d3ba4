//! Aggregate summary store over the shared SQLite pool

use super::AggregateStore;
use crate::utils::retry_on_lock;
use async_trait::async_trait;
use roadlens_common::db::models::{parse_timestamp, RoadSegmentAggregate};
use roadlens_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub struct SqliteAggregateStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteAggregateStore {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }
}

#[async_trait]
impl AggregateStore for SqliteAggregateStore {
    async fn upsert(&self, aggregate: &RoadSegmentAggregate) -> Result<()> {
        let tenant = aggregate.tenant_id.to_string();
        let last_survey_date = aggregate.last_survey_date.map(|dt| dt.to_rfc3339());
        let updated_at = chrono::Utc::now().to_rfc3339();

        retry_on_lock("aggregate_upsert", self.max_lock_wait_ms, || async {
            // All derived fields are written together; a reader never
            // observes a half-updated row.
            sqlx::query(
                r#"
                INSERT INTO road_segment_aggregates (
                    tenant_id, road_segment_id,
                    total_surveys, total_anomalies, unique_contributors,
                    last_survey_date, average_ride_quality, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(tenant_id, road_segment_id) DO UPDATE SET
                    total_surveys = excluded.total_surveys,
                    total_anomalies = excluded.total_anomalies,
                    unique_contributors = excluded.unique_contributors,
                    last_survey_date = excluded.last_survey_date,
                    average_ride_quality = excluded.average_ride_quality,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&tenant)
            .bind(&aggregate.road_segment_id)
            .bind(aggregate.total_surveys)
            .bind(aggregate.total_anomalies)
            .bind(aggregate.unique_contributors)
            .bind(&last_survey_date)
            .bind(aggregate.average_ride_quality)
            .bind(&updated_at)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

            Ok(())
        })
        .await
    }

    async fn fetch(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
    ) -> Result<Option<RoadSegmentAggregate>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, road_segment_id,
                   total_surveys, total_anomalies, unique_contributors,
                   last_survey_date, average_ride_quality
            FROM road_segment_aggregates
            WHERE tenant_id = ? AND road_segment_id = ?
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(segment_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tenant: String = row.get("tenant_id");
        let tenant = Uuid::parse_str(&tenant)
            .map_err(|e| Error::Internal(format!("Failed to parse tenant_id '{}': {}", tenant, e)))?;

        let last_survey_date: Option<String> = row.get("last_survey_date");
        let last_survey_date = last_survey_date
            .map(|raw| parse_timestamp(&raw, "last_survey_date"))
            .transpose()?;

        Ok(Some(RoadSegmentAggregate {
            tenant_id: tenant,
            road_segment_id: row.get("road_segment_id"),
            total_surveys: row.get("total_surveys"),
            total_anomalies: row.get("total_anomalies"),
            unique_contributors: row.get("unique_contributors"),
            last_survey_date,
            average_ride_quality: row.get("average_ride_quality"),
        }))
    }
}
