//! roadlens-recon - Reconciliation and Aggregate Backfill
//!
//! Operational command for the roadlens platform: links unresolved
//! historical ride-quality ratings to their originating surveys and
//! recomputes per-road-segment aggregate statistics. Invoked on demand,
//! shares the roadlens database with the other services.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use roadlens_common::config;
use roadlens_recon::services::AggregateEngine;
use roadlens_recon::store::{
    SqliteAggregateStore, SqliteHazardStore, SqliteRatingStore, SqliteSurveyStore,
};
use roadlens_recon::{Reconciler, ReconcilerOptions, ReconSettings};

#[derive(Parser)]
#[command(name = "roadlens-recon", version, about = "Roadlens reconciliation and aggregate backfill")]
struct Cli {
    /// Root folder holding the shared roadlens database
    #[arg(long, env = "ROADLENS_ROOT_FOLDER")]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Link unresolved historical ratings to their originating surveys
    Backfill {
        /// Restrict the run to one road segment
        #[arg(long)]
        segment: Option<String>,
        /// Suppress all writes while still reporting summary counts
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute per-segment aggregate statistics from the full history
    Aggregates {
        /// Restrict the pass to one road segment
        #[arg(long)]
        segment: Option<String>,
        /// Suppress all writes while still reporting summary counts
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    info!("Starting roadlens-recon");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Pre-flight: resolve the root folder and open the database. Any
    // failure here aborts before batch work begins.
    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = roadlens_common::db::init_database_pool(&db_path).await?;
    let settings = ReconSettings::load(&pool).await?;
    info!(
        chunk_size = settings.chunk_size,
        max_lock_wait_ms = settings.max_lock_wait_ms,
        record_timeout_ms = settings.record_timeout_ms,
        "Settings loaded"
    );

    // A first interrupt lets the in-flight chunk finish; the run stops
    // before the next chunk starts.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current chunk");
            signal_token.cancel();
        }
    });

    match cli.command {
        Command::Backfill { segment, dry_run } => {
            let surveys = Arc::new(SqliteSurveyStore::new(pool.clone()));
            let ratings = Arc::new(SqliteRatingStore::new(
                pool.clone(),
                settings.max_lock_wait_ms,
            ));
            let hazards = Arc::new(SqliteHazardStore::new(pool.clone()));

            let options = ReconcilerOptions::from_settings(&settings, dry_run, segment);
            let reconciler = Reconciler::new(surveys, ratings, hazards, options);

            let summary = reconciler.run(&cancel).await?;
            println!("{}", summary.display_string());
        }
        Command::Aggregates { segment, dry_run } => {
            let ratings = Arc::new(SqliteRatingStore::new(
                pool.clone(),
                settings.max_lock_wait_ms,
            ));
            let aggregates = Arc::new(SqliteAggregateStore::new(
                pool.clone(),
                settings.max_lock_wait_ms,
            ));

            let engine = AggregateEngine::new(ratings, aggregates, dry_run);
            let summary = engine.recompute_all(segment.as_deref(), &cancel).await?;
            println!("{}", summary.display_string());
        }
    }

    Ok(())
}
