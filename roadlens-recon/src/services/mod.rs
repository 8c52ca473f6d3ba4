//! Reconciliation services
//!
//! The matching pipeline is locate → score → resolve; the reconciler
//! drives it over the unresolved backlog, and the aggregate engine is an
//! independent recomputation pass.

pub mod aggregate_engine;
pub mod candidate_locator;
pub mod confidence_scorer;
pub mod reconciler;
pub mod resolution_policy;

pub use aggregate_engine::AggregateEngine;
pub use candidate_locator::CandidateLocator;
pub use confidence_scorer::ConfidenceScorer;
pub use resolution_policy::{resolve, ResolutionOutcome, UnresolvedReason};
