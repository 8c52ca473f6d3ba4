//! Resolution policy over scored candidates
//!
//! Picks at most one winning survey per historical rating, or declares
//! the rating unresolved. The procedure favors precision: a single
//! unresolved record is a safe default, a wrong match corrupts
//! downstream aggregates with no way to unwind it later.

use crate::models::{CandidateMatch, ConfidenceTier};

/// Why a rating was left unresolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No survey passed the locator's constraints
    NoCandidates,
    /// Multiple medium-confidence candidates, none clearly the origin
    Ambiguous,
    /// Only low-confidence candidates
    LowConfidence,
}

impl UnresolvedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedReason::NoCandidates => "no_candidates",
            UnresolvedReason::Ambiguous => "ambiguous",
            UnresolvedReason::LowConfidence => "low_confidence",
        }
    }
}

/// Outcome of the decision procedure
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Resolved {
        winner: CandidateMatch,
        /// True when the winner was picked among multiple high-confidence
        /// candidates by the closest-in-time tie-break
        tie_break: bool,
    },
    Unresolved(UnresolvedReason),
}

/// Apply the decision procedure to a scored candidate set.
///
/// Evaluated top-down:
/// 1. No candidates: unresolved.
/// 2. Exactly one High wins outright. Multiple Highs resolve to the
///    closest-in-time candidate with an operator warning; the situation
///    is ambiguous and the tie-break is defensive, not safe.
/// 3. With no Highs, exactly one Medium wins; multiple Mediums are left
///    unresolved (deliberately conservative, unlike the High tie-break);
///    no Mediums means only low-confidence noise remained.
///
/// Pure function of its input: the same candidate set always yields the
/// same outcome.
pub fn resolve(matches: &[CandidateMatch]) -> ResolutionOutcome {
    if matches.is_empty() {
        return ResolutionOutcome::Unresolved(UnresolvedReason::NoCandidates);
    }

    let highs: Vec<&CandidateMatch> = matches
        .iter()
        .filter(|m| m.tier == ConfidenceTier::High)
        .collect();

    match highs.as_slice() {
        [single] => {
            return ResolutionOutcome::Resolved {
                winner: (*single).clone(),
                tie_break: false,
            };
        }
        [first, rest @ ..] => {
            let mut winner: &CandidateMatch = *first;
            for m in rest {
                if m.time_delta_ms < winner.time_delta_ms {
                    winner = *m;
                }
            }
            tracing::warn!(
                survey_id = %winner.survey_id,
                high_candidates = highs.len(),
                time_delta_ms = winner.time_delta_ms,
                "Multiple high-confidence candidates, resolving to closest in time"
            );
            return ResolutionOutcome::Resolved {
                winner: winner.clone(),
                tie_break: true,
            };
        }
        [] => {}
    }

    let meds: Vec<&CandidateMatch> = matches
        .iter()
        .filter(|m| m.tier == ConfidenceTier::Medium)
        .collect();

    match meds.as_slice() {
        [single] => ResolutionOutcome::Resolved {
            winner: (*single).clone(),
            tie_break: false,
        },
        [] => ResolutionOutcome::Unresolved(UnresolvedReason::LowConfidence),
        _ => ResolutionOutcome::Unresolved(UnresolvedReason::Ambiguous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(tier: ConfidenceTier, time_delta_ms: i64) -> CandidateMatch {
        CandidateMatch {
            survey_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            tier,
            time_delta_ms,
            value_delta: Some(0.05),
        }
    }

    #[test]
    fn empty_set_is_no_candidates() {
        assert_eq!(
            resolve(&[]),
            ResolutionOutcome::Unresolved(UnresolvedReason::NoCandidates)
        );
    }

    #[test]
    fn single_high_wins() {
        let high = candidate(ConfidenceTier::High, 10_000);
        let low = candidate(ConfidenceTier::Low, 5_000);

        match resolve(&[low, high.clone()]) {
            ResolutionOutcome::Resolved { winner, tie_break } => {
                assert_eq!(winner, high);
                assert!(!tie_break);
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn multiple_highs_resolve_to_closest_in_time() {
        let slower = candidate(ConfidenceTier::High, 10_000);
        let faster = candidate(ConfidenceTier::High, 5_000);

        match resolve(&[slower, faster.clone()]) {
            ResolutionOutcome::Resolved { winner, tie_break } => {
                assert_eq!(winner, faster);
                assert!(tie_break);
            }
            other => panic!("expected tie-break resolution, got {:?}", other),
        }
    }

    #[test]
    fn single_medium_wins_without_highs() {
        let med = candidate(ConfidenceTier::Medium, 90_000);
        let low = candidate(ConfidenceTier::Low, 20_000);

        match resolve(&[med.clone(), low]) {
            ResolutionOutcome::Resolved { winner, tie_break } => {
                assert_eq!(winner, med);
                assert!(!tie_break);
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn multiple_mediums_are_ambiguous() {
        let a = candidate(ConfidenceTier::Medium, 90_000);
        let b = candidate(ConfidenceTier::Medium, 100_000);

        assert_eq!(
            resolve(&[a, b]),
            ResolutionOutcome::Unresolved(UnresolvedReason::Ambiguous)
        );
    }

    #[test]
    fn only_lows_are_low_confidence() {
        let a = candidate(ConfidenceTier::Low, 90_000);
        let b = candidate(ConfidenceTier::Low, 100_000);

        assert_eq!(
            resolve(&[a, b]),
            ResolutionOutcome::Unresolved(UnresolvedReason::LowConfidence)
        );
    }

    #[test]
    fn outcome_is_deterministic() {
        let set = vec![
            candidate(ConfidenceTier::High, 10_000),
            candidate(ConfidenceTier::High, 5_000),
            candidate(ConfidenceTier::Medium, 90_000),
        ];

        let first = resolve(&set);
        for _ in 0..10 {
            assert_eq!(resolve(&set), first);
        }
    }
}
