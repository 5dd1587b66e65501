// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Probe orchestration.
//!
//! The prober turns probe outcomes into evidence. It never contacts the
//! network itself and never reads a wall clock: the probe function is
//! injected by the transport layer, which also measures every duration the
//! prober consumes.

use std::collections::HashMap;

use crate::belief::Belief;
use crate::clock::LogicalTimestamp;
use crate::entropy::ResponseEntropy;
use crate::error::{StyxError, StyxResult};
use crate::evidence::Evidence;
use crate::jitter::JitterTracker;
use crate::node::NodeId;
use crate::state::{BeliefQuery, ObserverState};

/// Timeout evidence never weighs more than this, however long the silence.
const MAX_TIMEOUT_WEIGHT: f64 = 0.3;

/// The outcome of physically probing a target, as measured by the
/// transport layer.
#[derive(Debug, Clone, Copy)]
pub struct ProbeOutcome {
    pub success: bool,
    /// Round-trip latency of a successful response.
    pub latency_ms: u64,
    /// Total elapsed time of the probe attempt, success or not.
    pub elapsed_ms: u64,
}

/// A function that probes a target node. Injected so that tests can
/// simulate any network condition.
pub type ProbeFn = dyn Fn(NodeId) -> ProbeOutcome + Send + Sync;

/// Sends probes through the injected function and records the resulting
/// evidence into observer state.
pub struct Prober {
    self_id: NodeId,
    state: ObserverState,
    jitter: JitterTracker,
    entropy: HashMap<NodeId, ResponseEntropy>,
    probe_fn: Option<Box<ProbeFn>>,
    probe_timeout_ms: u64,
}

impl Prober {
    pub fn new(self_id: NodeId, probe_timeout_ms: u64) -> Self {
        Self {
            self_id,
            state: ObserverState::new(self_id),
            jitter: JitterTracker::new(100),
            entropy: HashMap::new(),
            probe_fn: None,
            probe_timeout_ms,
        }
    }

    /// Required before calling [`probe`](Self::probe).
    pub fn set_probe_fn(&mut self, f: Box<ProbeFn>) {
        self.probe_fn = Some(f);
    }

    pub fn state(&self) -> &ObserverState {
        &self.state
    }

    pub fn jitter(&self) -> &JitterTracker {
        &self.jitter
    }

    /// Probe the target and record evidence; returns the updated belief.
    pub fn probe(&mut self, target: NodeId) -> StyxResult<Belief> {
        let outcome = match &self.probe_fn {
            Some(f) => f(target),
            None => return Err(StyxError::NoProbeFunction),
        };

        // A response is expected within half the timeout; anything beyond
        // that is local or network delay, which feeds the jitter window.
        let expected_ms = self.probe_timeout_ms / 2;
        self.jitter.record_sample(expected_ms, outcome.elapsed_ms);
        let jitter_factor = self.jitter.jitter_factor();

        let ts = self.state.tick();

        let evidence = if outcome.success {
            let entry = self.entropy.entry(target).or_insert_with(|| ResponseEntropy::new(50));
            entry.add_sample(outcome.latency_ms);
            let entropy_factor = entry.confidence_factor();

            let mut e = Evidence::direct_response(ts, outcome.latency_ms, self.self_id, target);
            e.weight *= entropy_factor;
            e
        } else {
            jitter_aware_timeout(
                ts,
                self.probe_timeout_ms,
                outcome.elapsed_ms,
                jitter_factor,
                self.self_id,
                target,
            )
        };

        Ok(self.state.record_evidence(target, evidence))
    }

    pub fn query(&self, target: NodeId) -> BeliefQuery {
        self.state.query_or_unknown(target)
    }
}

/// Timeout evidence discounted by the local jitter factor and capped at
/// [`MAX_TIMEOUT_WEIGHT`]: a loaded observer must not manufacture death
/// signals, and even a clean timeout stays weak.
pub fn jitter_aware_timeout(
    ts: LogicalTimestamp,
    expected_ms: u64,
    waited_ms: u64,
    jitter_factor: f64,
    source: NodeId,
    target: NodeId,
) -> Evidence {
    let mut e = Evidence::timeout(ts, expected_ms, waited_ms, source, target);
    e.weight *= jitter_factor;
    if e.weight > MAX_TIMEOUT_WEIGHT {
        e.weight = MAX_TIMEOUT_WEIGHT;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::BeliefState;

    #[test]
    fn probe_without_function_fails() {
        let mut prober = Prober::new(NodeId::new(1), 1000);
        assert!(matches!(
            prober.probe(NodeId::new(99)),
            Err(StyxError::NoProbeFunction)
        ));
    }

    #[test]
    fn successful_probes_build_alive_belief() {
        let mut prober = Prober::new(NodeId::new(1), 1000);
        prober.set_probe_fn(Box::new(|_| ProbeOutcome {
            success: true,
            latency_ms: 20,
            elapsed_ms: 20,
        }));

        let mut belief = Belief::unknown_belief();
        for _ in 0..10 {
            belief = prober.probe(NodeId::new(99)).unwrap();
        }
        assert_eq!(belief.dominant(), BeliefState::Alive);
    }

    #[test]
    fn timeouts_lean_dead_but_never_certain() {
        let mut prober = Prober::new(NodeId::new(1), 1000);
        prober.set_probe_fn(Box::new(|_| ProbeOutcome {
            success: false,
            latency_ms: 0,
            elapsed_ms: 1000,
        }));

        let mut belief = Belief::unknown_belief();
        for _ in 0..100 {
            belief = prober.probe(NodeId::new(99)).unwrap();
        }
        assert!(belief.dead().value() > belief.alive().value());
        assert!(!belief.is_certain_dead());
        assert!(belief.dead().value() < 0.95);
    }

    #[test]
    fn jitter_discounts_timeout_weight() {
        let source = NodeId::new(1);
        let target = NodeId::new(99);
        let ts = LogicalTimestamp::new(1);

        let clean = jitter_aware_timeout(ts, 1000, 12_000, 1.0, source, target);
        let jittered = jitter_aware_timeout(ts, 1000, 12_000, 0.1, source, target);
        assert_eq!(clean.weight, MAX_TIMEOUT_WEIGHT);
        assert!((jittered.weight - 0.03).abs() < 1e-12);
    }

    #[test]
    fn erratic_responses_carry_less_weight() {
        let mut steady = Prober::new(NodeId::new(1), 1000);
        steady.set_probe_fn(Box::new(|_| ProbeOutcome {
            success: true,
            latency_ms: 20,
            elapsed_ms: 20,
        }));
        let mut steady_belief = Belief::unknown_belief();
        for _ in 0..20 {
            steady_belief = steady.probe(NodeId::new(99)).unwrap();
        }

        let mut erratic = Prober::new(NodeId::new(1), 1000);
        let flip = std::sync::atomic::AtomicU64::new(0);
        erratic.set_probe_fn(Box::new(move |_| {
            let n = flip.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            ProbeOutcome {
                success: true,
                latency_ms: if n % 2 == 0 { 1 } else { 900 },
                elapsed_ms: 20,
            }
        }));
        let mut erratic_belief = Belief::unknown_belief();
        for _ in 0..20 {
            erratic_belief = erratic.probe(NodeId::new(99)).unwrap();
        }

        assert!(erratic_belief.alive().value() < steady_belief.alive().value());
    }
}
