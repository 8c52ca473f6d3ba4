//! Batch run summaries
//!
//! Counters are plain values folded from per-record outcomes and
//! returned to the caller; the driver keeps no module-level mutable
//! state, so runs are independently testable and composable.

use serde::{Deserialize, Serialize};

/// Terminal state of one processed rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Resolution persisted (or counted, in a dry run)
    Updated,
    /// Multiple medium-confidence candidates, left for manual follow-up
    Ambiguous,
    /// No candidate survived the locator's constraints
    NoCandidates,
    /// Only low-confidence candidates
    LowConfidence,
    /// A store failure or timeout; the record stays unresolved
    Errored,
}

/// End-of-run summary for a reconciliation backfill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Records examined
    pub processed: usize,
    /// Resolutions written (or counted under dry-run)
    pub updated: usize,
    /// Left unresolved: multiple medium-confidence candidates
    pub ambiguous: usize,
    /// Left unresolved: no candidates at all
    pub no_candidates: usize,
    /// Left unresolved: only low-confidence candidates
    pub low_confidence: usize,
    /// Failed with a store error or timeout
    pub errored: usize,
    /// True when writes were suppressed
    pub dry_run: bool,
}

impl BatchSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Fold one record outcome into the summary
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Ambiguous => self.ambiguous += 1,
            RecordOutcome::NoCandidates => self.no_candidates += 1,
            RecordOutcome::LowConfidence => self.low_confidence += 1,
            RecordOutcome::Errored => self.errored += 1,
        }
    }

    /// Records skipped for expected (non-error) reasons
    pub fn skipped(&self) -> usize {
        self.no_candidates + self.low_confidence
    }

    pub fn display_string(&self) -> String {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        format!(
            "{}{} processed: {} updated, {} ambiguous, {} skipped ({} no candidates, {} low confidence), {} errors",
            prefix,
            self.processed,
            self.updated,
            self.ambiguous,
            self.skipped(),
            self.no_candidates,
            self.low_confidence,
            self.errored
        )
    }
}

/// End-of-run summary for an aggregate recomputation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// (tenant, segment) pairs examined
    pub segments: usize,
    /// Aggregates written (or counted under dry-run)
    pub updated: usize,
    /// Pairs that failed and were skipped
    pub errored: usize,
    /// True when writes were suppressed
    pub dry_run: bool,
}

impl AggregateSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn display_string(&self) -> String {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        format!(
            "{}{} segments: {} aggregates updated, {} errors",
            prefix, self.segments, self.updated, self.errored
        )
    }
}
