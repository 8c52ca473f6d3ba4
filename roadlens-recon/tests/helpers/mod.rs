//! Shared fixtures for reconciliation integration tests

// Each test binary compiles this module separately and uses a subset
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use roadlens_common::db::models::Resolution;
use roadlens_common::geo::GeoPoint;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub async fn test_pool() -> SqlitePool {
    roadlens_common::db::init_memory_pool()
        .await
        .expect("in-memory pool")
}

pub async fn insert_project(pool: &SqlitePool, tenant_id: Uuid, creator_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO projects (id, tenant_id, creator_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(tenant_id.to_string())
        .bind(creator_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .expect("insert project");
    id
}

/// A short two-street route near the city center, used when a fixture
/// survey should carry geometry
pub fn demo_path() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(52.5200, 13.4000),
        GeoPoint::new(52.5210, 13.4015),
        GeoPoint::new(52.5225, 13.4020),
    ]
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_survey(
    pool: &SqlitePool,
    project_id: Uuid,
    tenant_id: Uuid,
    author_id: Uuid,
    segments: &[&str],
    average_ride_quality: Option<f64>,
    path: Option<&[GeoPoint]>,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    let segments_json = serde_json::to_string(segments).expect("segments json");
    let path_json = path.map(|p| serde_json::to_string(p).expect("path json"));
    sqlx::query(
        r#"
        INSERT INTO surveys (
            id, project_id, tenant_id, author_id, road_segment_ids,
            average_ride_quality, path, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(project_id.to_string())
    .bind(tenant_id.to_string())
    .bind(author_id.to_string())
    .bind(segments_json)
    .bind(average_ride_quality)
    .bind(path_json)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await
    .expect("insert survey");
    id
}

pub async fn insert_rating(
    pool: &SqlitePool,
    tenant_id: Uuid,
    segment_id: &str,
    ride_quality: f64,
    author_id: Uuid,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO historical_ratings (
            id, tenant_id, road_segment_id, ride_quality, author_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(segment_id)
    .bind(ride_quality)
    .bind(author_id.to_string())
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await
    .expect("insert rating");
    id
}

/// Insert a rating that already carries resolution metadata, as the
/// engine would have written it
#[allow(clippy::too_many_arguments)]
pub async fn insert_resolved_rating(
    pool: &SqlitePool,
    tenant_id: Uuid,
    segment_id: &str,
    ride_quality: f64,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    survey_id: Uuid,
    project_id: Uuid,
    anomaly_count: Option<i64>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO historical_ratings (
            id, tenant_id, road_segment_id, ride_quality, author_id, created_at,
            resolved_survey_id, resolved_project_id, anomaly_count
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(segment_id)
    .bind(ride_quality)
    .bind(author_id.to_string())
    .bind(created_at.to_rfc3339())
    .bind(survey_id.to_string())
    .bind(project_id.to_string())
    .bind(anomaly_count)
    .execute(pool)
    .await
    .expect("insert resolved rating");
    id
}

pub async fn insert_hazard(
    pool: &SqlitePool,
    project_id: Uuid,
    segment_id: &str,
    reported_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO hazard_reports (id, project_id, road_segment_id, severity, reported_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(project_id.to_string())
    .bind(segment_id)
    .bind("pothole")
    .bind(reported_at.to_rfc3339())
    .execute(pool)
    .await
    .expect("insert hazard");
    id
}

/// Read a rating's resolution state back from storage
pub async fn fetch_resolution(pool: &SqlitePool, rating_id: Uuid) -> Resolution {
    let row = sqlx::query(
        "SELECT resolved_survey_id, resolved_project_id, anomaly_count \
         FROM historical_ratings WHERE id = ?",
    )
    .bind(rating_id.to_string())
    .fetch_one(pool)
    .await
    .expect("rating row");

    let survey: Option<String> = row.get("resolved_survey_id");
    let project: Option<String> = row.get("resolved_project_id");
    let anomalies: Option<i64> = row.get("anomaly_count");
    Resolution::from_columns(survey.as_deref(), project.as_deref(), anomalies)
        .expect("decode resolution")
}

pub async fn count_audit_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM resolution_audit")
        .fetch_one(pool)
        .await
        .expect("audit count")
}
