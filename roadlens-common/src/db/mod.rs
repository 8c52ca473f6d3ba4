//! Shared SQLite database access
//!
//! All roadlens services connect to the same `roadlens.db` in the root
//! folder. Table creation is idempotent so any service can start first.

pub mod models;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory pool, used by tests and dry-run experiments.
///
/// Pinned to a single connection: every pooled connection would
/// otherwise open its own private in-memory database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create roadlens tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            creator_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            road_segment_ids TEXT NOT NULL DEFAULT '[]',
            average_ride_quality REAL,
            path TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_surveys_tenant_created ON surveys(tenant_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historical_ratings (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            road_segment_id TEXT NOT NULL,
            ride_quality REAL NOT NULL,
            author_id TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            created_at TEXT NOT NULL,
            resolved_survey_id TEXT,
            resolved_project_id TEXT,
            anomaly_count INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ratings_segment_created \
         ON historical_ratings(tenant_id, road_segment_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hazard_reports (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            road_segment_id TEXT NOT NULL,
            severity TEXT,
            reported_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS road_segment_aggregates (
            tenant_id TEXT NOT NULL,
            road_segment_id TEXT NOT NULL,
            total_surveys INTEGER NOT NULL DEFAULT 0,
            total_anomalies INTEGER NOT NULL DEFAULT 0,
            unique_contributors INTEGER NOT NULL DEFAULT 0,
            last_survey_date TEXT,
            average_ride_quality REAL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, road_segment_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resolution_audit (
            rating_id TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL,
            candidate_count INTEGER NOT NULL,
            high_count INTEGER NOT NULL,
            medium_count INTEGER NOT NULL,
            tie_break INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}
