//! Survey store over the shared SQLite pool

use super::SurveyStore;
use crate::models::TimeWindow;
use async_trait::async_trait;
use roadlens_common::db::models::{parse_timestamp, Survey};
use roadlens_common::geo::GeoPoint;
use roadlens_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

pub struct SqliteSurveyStore {
    pool: SqlitePool,
}

impl SqliteSurveyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SurveyStore for SqliteSurveyStore {
    async fn find_candidates(
        &self,
        tenant_id: Uuid,
        segment_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Survey>> {
        // RFC3339 UTC timestamps compare lexicographically in creation
        // order, so the window bounds can be plain TEXT comparisons.
        // The LIKE clause only narrows the scan over the JSON segment
        // column; the locator re-checks exact membership on the decoded
        // set, so a false positive here is harmless.
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, tenant_id, author_id, road_segment_ids,
                   average_ride_quality, path, created_at
            FROM surveys
            WHERE tenant_id = ? AND created_at >= ? AND created_at <= ?
              AND road_segment_ids LIKE ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(window.start.to_rfc3339())
        .bind(window.end.to_rfc3339())
        .bind(format!("%\"{}\"%", segment_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_survey).collect()
    }

    async fn project_creator(&self, project_id: Uuid) -> Result<Option<Uuid>> {
        let creator: Option<String> =
            sqlx::query_scalar("SELECT creator_id FROM projects WHERE id = ?")
                .bind(project_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        creator
            .map(|raw| {
                Uuid::parse_str(&raw).map_err(|e| {
                    Error::Internal(format!("Failed to parse creator_id '{}': {}", raw, e))
                })
            })
            .transpose()
    }
}

fn decode_survey(row: &sqlx::sqlite::SqliteRow) -> Result<Survey> {
    let id: String = row.get("id");
    let project_id: String = row.get("project_id");
    let tenant_id: String = row.get("tenant_id");
    let author_id: String = row.get("author_id");

    let segment_json: String = row.get("road_segment_ids");
    let road_segment_ids: HashSet<String> = serde_json::from_str(&segment_json)
        .map_err(|e| Error::Internal(format!("Failed to parse road_segment_ids: {}", e)))?;

    let path_json: Option<String> = row.get("path");
    let path: Option<Vec<GeoPoint>> = path_json
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| Error::Internal(format!("Failed to parse survey path: {}", e)))
        })
        .transpose()?;

    let created_at: String = row.get("created_at");

    Ok(Survey {
        id: parse_id(&id, "survey id")?,
        project_id: parse_id(&project_id, "project_id")?,
        tenant_id: parse_id(&tenant_id, "tenant_id")?,
        author_id: parse_id(&author_id, "author_id")?,
        road_segment_ids,
        average_ride_quality: row.get("average_ride_quality"),
        path,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn parse_id(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {} '{}': {}", column, value, e)))
}
