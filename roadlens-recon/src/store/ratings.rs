//! Historical rating store over the shared SQLite pool
//!
//! Writes go through lock-retry because the ingestion service may hold
//! the database while a backfill runs.

use super::RatingStore;
use crate::models::RatingFilter;
use crate::utils::retry_on_lock;
use async_trait::async_trait;
use roadlens_common::db::models::{
    parse_timestamp, HistoricalRating, Resolution, ResolutionAudit,
};
use roadlens_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub struct SqliteRatingStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteRatingStore {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }
}

#[async_trait]
impl RatingStore for SqliteRatingStore {
    async fn find_unresolved(&self, filter: &RatingFilter) -> Result<Vec<HistoricalRating>> {
        let rows = match &filter.segment_id {
            Some(segment_id) => {
                sqlx::query(
                    r#"
                    SELECT id, tenant_id, road_segment_id, ride_quality, author_id,
                           latitude, longitude, created_at,
                           resolved_survey_id, resolved_project_id, anomaly_count
                    FROM historical_ratings
                    WHERE resolved_survey_id IS NULL AND road_segment_id = ?
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(segment_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, tenant_id, road_segment_id, ride_quality, author_id,
                           latitude, longitude, created_at,
                           resolved_survey_id, resolved_project_id, anomaly_count
                    FROM historical_ratings
                    WHERE resolved_survey_id IS NULL
                    ORDER BY created_at ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(decode_rating).collect()
    }

    async fn ratings_for_segment(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
    ) -> Result<Vec<HistoricalRating>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, road_segment_id, ride_quality, author_id,
                   latitude, longitude, created_at,
                   resolved_survey_id, resolved_project_id, anomaly_count
            FROM historical_ratings
            WHERE tenant_id = ? AND road_segment_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(segment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_rating).collect()
    }

    async fn segment_pairs(&self, filter: &RatingFilter) -> Result<Vec<(Uuid, String)>> {
        let rows = match &filter.segment_id {
            Some(segment_id) => {
                sqlx::query(
                    "SELECT DISTINCT tenant_id, road_segment_id FROM historical_ratings \
                     WHERE road_segment_id = ? ORDER BY tenant_id, road_segment_id",
                )
                .bind(segment_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT DISTINCT tenant_id, road_segment_id FROM historical_ratings \
                     ORDER BY tenant_id, road_segment_id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| {
                let tenant: String = row.get("tenant_id");
                let segment: String = row.get("road_segment_id");
                let tenant = Uuid::parse_str(&tenant).map_err(|e| {
                    Error::Internal(format!("Failed to parse tenant_id '{}': {}", tenant, e))
                })?;
                Ok((tenant, segment))
            })
            .collect()
    }

    async fn record_resolution(
        &self,
        rating_id: Uuid,
        survey_id: Uuid,
        project_id: Uuid,
        anomaly_count: i64,
    ) -> Result<()> {
        let rating = rating_id.to_string();
        let survey = survey_id.to_string();
        let project = project_id.to_string();

        let rows_affected = retry_on_lock("record_resolution", self.max_lock_wait_ms, || async {
            // The IS NULL guard makes resolve-at-most-once hold even if
            // a concurrent run raced past the unresolved scan.
            let result = sqlx::query(
                r#"
                UPDATE historical_ratings
                SET resolved_survey_id = ?, resolved_project_id = ?, anomaly_count = ?
                WHERE id = ? AND resolved_survey_id IS NULL
                "#,
            )
            .bind(&survey)
            .bind(&project)
            .bind(anomaly_count)
            .bind(&rating)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

            Ok(result.rows_affected())
        })
        .await?;

        if rows_affected == 0 {
            return Err(Error::InvalidInput(format!(
                "Rating {} is unknown or already resolved",
                rating_id
            )));
        }

        Ok(())
    }

    async fn record_audit(&self, audit: &ResolutionAudit) -> Result<()> {
        let rating = audit.rating_id.to_string();
        let survey = audit.survey_id.to_string();
        let created_at = audit.created_at.to_rfc3339();

        retry_on_lock("record_audit", self.max_lock_wait_ms, || async {
            sqlx::query(
                r#"
                INSERT INTO resolution_audit (
                    rating_id, survey_id, candidate_count,
                    high_count, medium_count, tie_break, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(rating_id) DO NOTHING
                "#,
            )
            .bind(&rating)
            .bind(&survey)
            .bind(audit.candidate_count)
            .bind(audit.high_count)
            .bind(audit.medium_count)
            .bind(audit.tie_break)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

            Ok(())
        })
        .await
    }
}

fn decode_rating(row: &sqlx::sqlite::SqliteRow) -> Result<HistoricalRating> {
    let id: String = row.get("id");
    let tenant_id: String = row.get("tenant_id");
    let author_id: String = row.get("author_id");
    let created_at: String = row.get("created_at");

    let resolved_survey_id: Option<String> = row.get("resolved_survey_id");
    let resolved_project_id: Option<String> = row.get("resolved_project_id");
    let anomaly_count: Option<i64> = row.get("anomaly_count");
    let resolution = Resolution::from_columns(
        resolved_survey_id.as_deref(),
        resolved_project_id.as_deref(),
        anomaly_count,
    )?;

    Ok(HistoricalRating {
        id: parse_id(&id, "rating id")?,
        tenant_id: parse_id(&tenant_id, "tenant_id")?,
        road_segment_id: row.get("road_segment_id"),
        ride_quality: row.get("ride_quality"),
        author_id: parse_id(&author_id, "author_id")?,
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        created_at: parse_timestamp(&created_at, "created_at")?,
        resolution,
    })
}

fn parse_id(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {} '{}': {}", column, value, e)))
}
