// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Multi-witness aggregation.
//!
//! Combines witness reports into one belief by trust-weighted averaging,
//! while preserving disagreement instead of hiding it: high variance widens
//! the distribution, and witnesses that all report identically are
//! suspected of sharing a failure mode and penalized.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::belief::Belief;
use crate::node::NodeId;
use crate::witness::Registry;

/// Below this summed trust the aggregate is meaningless.
const MIN_TOTAL_TRUST: f64 = 0.001;

/// Correlation above this triggers the shared-failure-mode penalty.
const CORRELATION_THRESHOLD: f64 = 0.9;
const CORRELATION_PENALTY: f64 = 0.7;

/// Disagreement above this widens the distribution.
const DISAGREEMENT_THRESHOLD: f64 = 0.3;

const UNKNOWN_FLOOR: f64 = 0.05;

/// A belief report from a single witness about a single target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessReport {
    pub witness: NodeId,
    pub target: NodeId,
    pub belief: Belief,
    /// Trust as observed when the report was ingested, if known.
    pub trust: Option<f64>,
}

/// The combined belief plus the disagreement it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub belief: Belief,
    /// 0 = all witnesses agree, 1 = maximum disagreement.
    pub disagreement: f64,
    pub witness_count: usize,
    pub reports: Vec<WitnessReport>,
}

impl AggregateResult {
    fn unknown(reports: Vec<WitnessReport>) -> Self {
        Self {
            belief: Belief::unknown_belief(),
            disagreement: 0.0,
            witness_count: reports.len(),
            reports,
        }
    }
}

/// Combines witness reports for one target into a single belief.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<Registry>,
}

impl Aggregator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn aggregate(&self, reports: &[WitnessReport]) -> AggregateResult {
        if reports.is_empty() {
            return AggregateResult::unknown(Vec::new());
        }

        if reports.len() == 1 {
            return AggregateResult {
                belief: reports[0].belief,
                disagreement: 0.0,
                witness_count: 1,
                reports: reports.to_vec(),
            };
        }

        let mut total_trust = 0.0;
        let mut alive_sum = 0.0;
        let mut dead_sum = 0.0;
        let mut unknown_sum = 0.0;

        for r in reports {
            let trust = self.registry.trust_of(r.witness);
            total_trust += trust;
            alive_sum += r.belief.alive().value() * trust;
            dead_sum += r.belief.dead().value() * trust;
            unknown_sum += r.belief.unknown().value() * trust;
        }

        if total_trust < MIN_TOTAL_TRUST {
            return AggregateResult::unknown(reports.to_vec());
        }

        let mut alive = alive_sum / total_trust;
        let mut dead = dead_sum / total_trust;
        let mut unknown = unknown_sum / total_trust;

        let disagreement = disagreement_of(reports, alive, dead);

        // Witnesses that all report identically are suspected of sharing a
        // failure mode.
        let correlation = correlation_of(reports);
        if correlation > CORRELATION_THRESHOLD {
            alive *= CORRELATION_PENALTY;
            dead *= CORRELATION_PENALTY;
            unknown = 1.0 - alive - dead;
        }

        if disagreement > DISAGREEMENT_THRESHOLD {
            let reduction = disagreement * 0.5;
            alive *= 1.0 - reduction;
            dead *= 1.0 - reduction;
            unknown = 1.0 - alive - dead;
        }

        // The floor is applied last; the steps above may transiently dip
        // unknown below it.
        if unknown < UNKNOWN_FLOOR {
            let deficit = UNKNOWN_FLOOR - unknown;
            alive -= deficit / 2.0;
            dead -= deficit / 2.0;
            unknown = UNKNOWN_FLOOR;
        }

        let belief =
            Belief::new(alive, dead, unknown).unwrap_or_else(|_| Belief::unknown_belief());

        AggregateResult {
            belief,
            disagreement,
            witness_count: reports.len(),
            reports: reports.to_vec(),
        }
    }
}

/// Variance of witness opinions around the trust-weighted mean, as a scalar
/// in [0, 1].
fn disagreement_of(reports: &[WitnessReport], avg_alive: f64, avg_dead: f64) -> f64 {
    if reports.len() < 2 {
        return 0.0;
    }

    let mut variance = 0.0;
    for r in reports {
        let diff_alive = r.belief.alive().value() - avg_alive;
        let diff_dead = r.belief.dead().value() - avg_dead;
        variance += diff_alive * diff_alive + diff_dead * diff_dead;
    }
    variance /= reports.len() as f64;

    variance.sqrt().min(1.0)
}

/// How similar the reports are to each other: 1 = identical, 0 = far apart.
fn correlation_of(reports: &[WitnessReport]) -> f64 {
    if reports.len() < 2 {
        return 0.0;
    }

    let first = reports[0].belief;
    let mut total_diff = 0.0;
    for r in &reports[1..] {
        total_diff += (first.alive().value() - r.belief.alive().value()).abs()
            + (first.dead().value() - r.belief.dead().value()).abs();
    }
    let avg_diff = total_diff / (reports.len() - 1) as f64;

    1.0 - (avg_diff * 2.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(witness: u64, alive: f64, dead: f64, unknown: f64) -> WitnessReport {
        WitnessReport {
            witness: NodeId::new(witness),
            target: NodeId::new(99),
            belief: Belief::new(alive, dead, unknown).unwrap(),
            trust: None,
        }
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(Arc::new(Registry::new()))
    }

    #[test]
    fn empty_is_unknown_with_zero_disagreement() {
        let result = aggregator().aggregate(&[]);
        assert!(result.belief.approx_eq(&Belief::unknown_belief()));
        assert_eq!(result.disagreement, 0.0);
        assert_eq!(result.witness_count, 0);
    }

    #[test]
    fn single_report_passes_through() {
        let r = report(1, 0.6, 0.2, 0.2);
        let result = aggregator().aggregate(&[r.clone()]);
        assert!(result.belief.approx_eq(&r.belief));
        assert_eq!(result.disagreement, 0.0);
        assert_eq!(result.witness_count, 1);
    }

    #[test]
    fn resubmitting_aggregate_is_idempotent() {
        let agg = aggregator();
        let reports = vec![
            report(1, 0.8, 0.1, 0.1),
            report(2, 0.75, 0.15, 0.1),
            report(3, 0.7, 0.2, 0.1),
        ];
        let first = agg.aggregate(&reports);

        let echo = WitnessReport {
            witness: NodeId::new(9),
            target: NodeId::new(99),
            belief: first.belief,
            trust: None,
        };
        let second = agg.aggregate(&[echo]);
        assert!(second.belief.approx_eq(&first.belief));
        assert_eq!(second.disagreement, 0.0);
    }

    #[test]
    fn identical_reports_are_penalized() {
        let agg = aggregator();
        let reports: Vec<_> = (0..10).map(|i| report(i, 0.95, 0.03, 0.02)).collect();
        let result = agg.aggregate(&reports);
        // The correlation penalty keeps unanimous certainty suspicious.
        assert!(result.belief.alive().value() <= 0.85);
        assert!(result.belief.unknown().value() > 0.02);
    }

    #[test]
    fn disagreement_widens_uncertainty() {
        let agg = aggregator();
        let split = vec![
            report(1, 0.9, 0.05, 0.05),
            report(2, 0.1, 0.85, 0.05),
            report(3, 0.9, 0.05, 0.05),
            report(4, 0.1, 0.85, 0.05),
        ];
        let result = agg.aggregate(&split);
        assert!(result.disagreement > DISAGREEMENT_THRESHOLD);

        let agreed = vec![
            report(1, 0.8, 0.1, 0.1),
            report(2, 0.72, 0.18, 0.1),
            report(3, 0.88, 0.02, 0.1),
        ];
        let calm = agg.aggregate(&agreed);
        assert!(result.belief.unknown().value() > calm.belief.unknown().value());
    }

    #[test]
    fn distrusted_witnesses_lose_influence() {
        let registry = Arc::new(Registry::new());
        let liar = NodeId::new(1);
        let honest = NodeId::new(2);
        registry.register(liar);
        registry.register(honest);
        for _ in 0..10 {
            registry.record_wrong(liar);
        }

        let agg = Aggregator::new(registry);
        let reports = vec![
            WitnessReport {
                witness: liar,
                target: NodeId::new(99),
                belief: Belief::new(0.05, 0.9, 0.05).unwrap(),
                trust: None,
            },
            WitnessReport {
                witness: honest,
                target: NodeId::new(99),
                belief: Belief::new(0.9, 0.05, 0.05).unwrap(),
                trust: None,
            },
        ];
        let result = agg.aggregate(&reports);
        assert!(result.belief.alive().value() > result.belief.dead().value());
    }

    #[test]
    fn result_preserves_sum_invariant() {
        let agg = aggregator();
        let reports = vec![
            report(1, 0.95, 0.03, 0.02),
            report(2, 0.94, 0.04, 0.02),
            report(3, 0.96, 0.02, 0.02),
        ];
        let result = agg.aggregate(&reports);
        assert!(result.belief.is_valid());
        assert!(result.belief.unknown().value() >= UNKNOWN_FLOOR - 1e-12);
    }
}
