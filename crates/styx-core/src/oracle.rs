// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! The oracle façade.
//!
//! Composes the witness registry, aggregator, partition detector, and
//! finality engine into a single query surface. The oracle never returns a
//! boolean and never raises for uncertainty: refusal is a first-class
//! outcome, expressed in the result.
//!
//! Lock order, when multiple locks must be held: oracle -> finality ->
//! registry. Never acquire in reverse.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::aggregator::{Aggregator, WitnessReport};
use crate::belief::{Belief, BeliefState};
use crate::error::StyxResult;
use crate::finality::{DeathRecord, Engine};
use crate::node::NodeId;
use crate::partition::{Detector, PartitionState};
use crate::witness::Registry;

/// Minimum confidence a caller demands from a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequiredConfidence {
    pub min_alive: f64,
    pub min_dead: f64,
    pub max_unknown: f64,
}

impl RequiredConfidence {
    /// Accepts any distribution.
    pub fn default_requirement() -> Self {
        Self {
            min_alive: 0.0,
            min_dead: 0.0,
            max_unknown: 1.0,
        }
    }

    /// High-confidence preset.
    pub fn strict() -> Self {
        Self {
            min_alive: 0.7,
            min_dead: 0.7,
            max_unknown: 0.3,
        }
    }
}

impl Default for RequiredConfidence {
    fn default() -> Self {
        Self::default_requirement()
    }
}

/// The full response to an oracle query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub target: NodeId,
    pub belief: Belief,
    pub refused: bool,
    pub refusal_reason: Option<String>,
    pub dead: bool,
    pub witness_count: usize,
    pub disagreement: f64,
    pub partition_state: PartitionState,
    pub evidence: Vec<String>,
}

impl QueryResult {
    fn new(target: NodeId) -> Self {
        Self {
            target,
            belief: Belief::unknown_belief(),
            refused: false,
            refusal_reason: None,
            dead: false,
            witness_count: 0,
            disagreement: 0.0,
            partition_state: PartitionState::NoPartition,
            evidence: Vec::new(),
        }
    }
}

/// The STYX membership oracle. Instantiated once per process and shared by
/// reference with every handler.
pub struct Oracle {
    self_id: NodeId,
    registry: Arc<Registry>,
    aggregator: Aggregator,
    finality: Engine,
    partition: Detector,
    reports: RwLock<HashMap<NodeId, Vec<WitnessReport>>>,
}

impl Oracle {
    pub fn new(self_id: NodeId) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            self_id,
            aggregator: Aggregator::new(Arc::clone(&registry)),
            registry,
            finality: Engine::new(),
            partition: Detector::new(),
            reports: RwLock::new(HashMap::new()),
        }
    }

    pub fn self_id(&self) -> NodeId {
        self.self_id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn finality(&self) -> &Engine {
        &self.finality
    }

    /// Register a witness. Idempotent.
    pub fn register_witness(&self, id: NodeId) {
        self.registry.register(id);
    }

    /// Record a witness report about a target. The witness is registered if
    /// unknown; the report is appended, never compacted or reordered.
    pub fn receive_report(&self, witness_id: NodeId, target: NodeId, belief: Belief) {
        let mut reports = self.reports.write();

        self.registry.register(witness_id);
        self.registry.record_report(witness_id, belief);
        let trust = self.registry.trust_of(witness_id);

        reports.entry(target).or_default().push(WitnessReport {
            witness: witness_id,
            target,
            belief,
            trust: Some(trust),
        });
    }

    /// Number of reports recorded for a target.
    pub fn report_count(&self, target: NodeId) -> usize {
        self.reports.read().get(&target).map_or(0, Vec::len)
    }

    /// A copy of the reports recorded for a target.
    pub fn reports_for(&self, target: NodeId) -> Vec<WitnessReport> {
        self.reports.read().get(&target).cloned().unwrap_or_default()
    }

    /// Ask the oracle about a node. Never returns a boolean.
    pub fn query(&self, target: NodeId) -> QueryResult {
        self.query_with_requirement(target, RequiredConfidence::default_requirement())
    }

    /// Query with explicit confidence requirements; the oracle refuses when
    /// it cannot honestly meet them.
    pub fn query_with_requirement(&self, target: NodeId, req: RequiredConfidence) -> QueryResult {
        let reports = self.reports.read();

        let mut result = QueryResult::new(target);

        // Finality short-circuits everything else.
        if self.finality.is_dead(target) {
            result.dead = true;
            result.belief = Belief::certainly_dead();
            result
                .evidence
                .push("finality: node declared dead".to_string());
            return result;
        }

        let target_reports: &[WitnessReport] =
            reports.get(&target).map(Vec::as_slice).unwrap_or(&[]);
        result.witness_count = target_reports.len();

        if target_reports.is_empty() {
            result
                .evidence
                .push("no witness reports available".to_string());
            return result;
        }

        let (partition_state, split) = self.partition.analyze(target_reports, target);
        result.partition_state = partition_state;

        if partition_state == PartitionState::ConfirmedPartition {
            result.refused = true;
            result.refusal_reason =
                Some("network partition detected - witnesses disagree".to_string());
            if let Some(split) = split {
                result.disagreement = split.disagreement;
            }
            result
                .evidence
                .push("partition: witnesses split into groups".to_string());
            return result;
        }

        let aggregate = self.aggregator.aggregate(target_reports);
        result.belief = aggregate.belief;
        result.disagreement = aggregate.disagreement;

        // Refuse when the dominant side's positive confidence falls short
        // of its own minimum.
        let below_minimum = match aggregate.belief.dominant() {
            BeliefState::Alive => {
                let alive = aggregate.belief.alive().value();
                alive > 0.0 && alive < req.min_alive
            }
            BeliefState::Dead => {
                let dead = aggregate.belief.dead().value();
                dead > 0.0 && dead < req.min_dead
            }
            BeliefState::Unknown => false,
        };
        if below_minimum {
            result.refused = true;
            result.refusal_reason =
                Some("insufficient confidence to meet requirements".to_string());
            result
                .evidence
                .push("confidence below threshold".to_string());
            return result;
        }

        if aggregate.belief.unknown().value() > req.max_unknown {
            result.refused = true;
            result.refusal_reason = Some("uncertainty too high".to_string());
            result.evidence.push("unknown exceeds threshold".to_string());
            return result;
        }

        result
            .evidence
            .push(format!("aggregated {} witness reports", target_reports.len()));
        if result.disagreement > 0.1 {
            result
                .evidence
                .push("some witness disagreement detected".to_string());
        }

        result
    }

    /// Attempt to declare a node dead, under the finality preconditions.
    /// Returns a copy of the created record.
    pub fn declare_death(
        &self,
        target: NodeId,
        aggregated_belief: Belief,
        reports: &[WitnessReport],
        has_non_timeout_evidence: bool,
    ) -> StyxResult<DeathRecord> {
        // Hold the oracle lock across the declaration so queries observe
        // either the pre-declaration or post-declaration world, not a
        // partially applied one.
        let _guard = self.reports.write();
        self.finality
            .declare_death(target, aggregated_belief, reports, has_non_timeout_evidence)
    }

    /// Panics if the oracle refuses or the node is dead. Defeats the point
    /// of STYX; provided for tests and misuse demonstrations only.
    #[allow(clippy::panic)]
    pub fn must_query(&self, target: NodeId) -> Belief {
        let result = self.query(target);
        if result.refused {
            panic!("oracle refuses to answer due to uncertainty");
        }
        if result.dead {
            panic!("node is dead");
        }
        result.belief
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_with_no_reports_is_unknown() {
        let oracle = Oracle::new(NodeId::new(1));
        let result = oracle.query(NodeId::new(99));
        assert!(result.belief.approx_eq(&Belief::unknown_belief()));
        assert!(!result.refused);
        assert!(!result.dead);
        assert_eq!(result.witness_count, 0);
        assert!(result
            .evidence
            .iter()
            .any(|e| e == "no witness reports available"));
    }

    #[test]
    fn reports_append_monotonically() {
        let oracle = Oracle::new(NodeId::new(1));
        let target = NodeId::new(99);
        let belief = Belief::new(0.8, 0.1, 0.1).unwrap();
        for i in 0..5 {
            oracle.receive_report(NodeId::new(10 + i), target, belief);
            assert_eq!(oracle.report_count(target), (i + 1) as usize);
        }
        let reports = oracle.reports_for(target);
        for (i, r) in reports.iter().enumerate() {
            assert_eq!(r.witness, NodeId::new(10 + i as u64));
        }
    }

    #[test]
    fn receive_report_registers_witness() {
        let oracle = Oracle::new(NodeId::new(1));
        let witness = NodeId::new(42);
        oracle.receive_report(witness, NodeId::new(99), Belief::unknown_belief());
        assert!(oracle.registry().record_of(witness).is_some());
    }

    #[test]
    fn strict_requirement_refuses_middling_confidence() {
        let oracle = Oracle::new(NodeId::new(1));
        let target = NodeId::new(99);
        oracle.receive_report(
            NodeId::new(10),
            target,
            Belief::new(0.55, 0.15, 0.3).unwrap(),
        );
        oracle.receive_report(
            NodeId::new(11),
            target,
            Belief::new(0.62, 0.08, 0.3).unwrap(),
        );

        let result = oracle.query_with_requirement(target, RequiredConfidence::strict());
        assert!(result.refused);
        assert_eq!(
            result.refusal_reason.as_deref(),
            Some("insufficient confidence to meet requirements")
        );

        // The default requirement accepts the same distribution.
        let relaxed = oracle.query(target);
        assert!(!relaxed.refused);
    }

    #[test]
    fn excess_unknown_refuses_under_cap() {
        let oracle = Oracle::new(NodeId::new(1));
        let target = NodeId::new(99);
        oracle.receive_report(
            NodeId::new(10),
            target,
            Belief::new(0.3, 0.2, 0.5).unwrap(),
        );
        oracle.receive_report(
            NodeId::new(11),
            target,
            Belief::new(0.25, 0.15, 0.6).unwrap(),
        );

        let result = oracle.query_with_requirement(
            target,
            RequiredConfidence {
                min_alive: 0.0,
                min_dead: 0.0,
                max_unknown: 0.3,
            },
        );
        assert!(result.refused);
        assert_eq!(result.refusal_reason.as_deref(), Some("uncertainty too high"));
    }

    #[test]
    fn dead_node_short_circuits() {
        let oracle = Oracle::new(NodeId::new(1));
        let target = NodeId::new(99);
        let belief = Belief::new(0.02, 0.95, 0.03).unwrap();
        for i in 1..=5 {
            oracle.receive_report(NodeId::new(i), target, belief);
        }
        let reports = oracle.reports_for(target);
        oracle.declare_death(target, belief, &reports, true).unwrap();

        let result = oracle.query(target);
        assert!(result.dead);
        assert!(result.belief.approx_eq(&Belief::certainly_dead()));
        assert!(result
            .evidence
            .iter()
            .any(|e| e == "finality: node declared dead"));
    }

    #[test]
    #[should_panic(expected = "oracle refuses")]
    fn must_query_panics_on_refusal() {
        let oracle = Oracle::new(NodeId::new(1));
        let target = NodeId::new(99);
        oracle.receive_report(NodeId::new(10), target, Belief::new(0.9, 0.05, 0.05).unwrap());
        oracle.receive_report(NodeId::new(11), target, Belief::new(0.9, 0.05, 0.05).unwrap());
        oracle.receive_report(NodeId::new(12), target, Belief::new(0.05, 0.9, 0.05).unwrap());
        oracle.receive_report(NodeId::new(13), target, Belief::new(0.05, 0.9, 0.05).unwrap());
        let _ = oracle.must_query(target);
    }
}
