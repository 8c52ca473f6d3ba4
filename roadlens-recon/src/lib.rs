//! roadlens-recon - Reconciliation and Aggregate Backfill
//!
//! Retroactively links historical ride-quality ratings to the surveys
//! that produced them, and recomputes per-road-segment aggregate
//! statistics from the full history.
//!
//! The engine is a library-level batch process invoked on demand through
//! the `roadlens-recon` binary; it shares the roadlens database with the
//! ingestion and dashboard services but only ever writes rating
//! resolution metadata, audit rows, and aggregate rows.

pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::ReconSettings;
pub use models::{CandidateMatch, ConfidenceTier, RatingFilter, TimeWindow};
pub use services::reconciler::{Reconciler, ReconcilerOptions};
pub use services::reconciler::statistics::{AggregateSummary, BatchSummary};
